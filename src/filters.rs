/// Resampler prefix. The trailing space separates it from user filters.
pub const SOXR_RESAMPLER: &str = "aresample=resampler=soxr ";

pub const MIN_SAMPLE_RATE: u32 = 1_000;
pub const MAX_SAMPLE_RATE: u32 = 768_000;

pub fn validate_sample_rate(raw: &str) -> Result<u32, String> {
    let parsed: u32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` must be a sample rate in Hz (e.g., 44100, 48000)"))?;
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&parsed) {
        return Err(format!(
            "sample rate must be between {MIN_SAMPLE_RATE} and {MAX_SAMPLE_RATE} Hz"
        ));
    }
    Ok(parsed)
}

/// Builds the `-af` value: the optional soxr resampler followed by the user's
/// fragments. Whitespace runs (newlines included) collapse to one separator
/// and every separator becomes a comma. `None` when nothing is left.
pub fn build_audio_filters(use_soxr: bool, user_filters: &str) -> Option<String> {
    let mut chain = String::new();
    if use_soxr {
        chain.push_str(SOXR_RESAMPLER);
    }
    chain.push_str(user_filters);

    let af = chain.split_whitespace().collect::<Vec<_>>().join(",");
    if af.is_empty() { None } else { Some(af) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_is_none() {
        assert_eq!(build_audio_filters(false, ""), None);
        assert_eq!(build_audio_filters(false, "  \n\t "), None);
    }

    #[test]
    fn test_soxr_only() {
        assert_eq!(
            build_audio_filters(true, "").as_deref(),
            Some("aresample=resampler=soxr")
        );
    }

    #[test]
    fn test_soxr_then_user_filters() {
        assert_eq!(
            build_audio_filters(true, "loudnorm volume=2").as_deref(),
            Some("aresample=resampler=soxr,loudnorm,volume=2")
        );
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(
            build_audio_filters(false, "  highpass=f=200 \n\n  lowpass=f=3000\t").as_deref(),
            Some("highpass=f=200,lowpass=f=3000")
        );
    }

    #[test]
    fn test_validate_sample_rate() {
        assert_eq!(validate_sample_rate("44100"), Ok(44100));
        assert_eq!(validate_sample_rate("48000"), Ok(48000));
        assert!(validate_sample_rate("0").is_err());
        assert!(validate_sample_rate("abc").is_err());
        assert!(validate_sample_rate("1000000").is_err());
    }
}
