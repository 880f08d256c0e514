use crate::config::{GlobalConfig, OutputFormat, Quality};
use crate::filters::validate_sample_rate;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

/// Walks through the conversion settings, offering `current` as the defaults.
pub fn interactive_config(current: GlobalConfig) -> Result<GlobalConfig> {
    println!("Interactive Audio Converter");
    println!("Press Enter to accept defaults.\n");

    let theme = ColorfulTheme::default();

    let known = OutputFormat::KNOWN;
    let formats: Vec<&str> = known.iter().map(OutputFormat::extension).collect();
    let format_idx = Select::with_theme(&theme)
        .with_prompt("Output format")
        .items(&formats)
        .default(
            formats
                .iter()
                .position(|f| *f == current.output_format.extension())
                .unwrap_or(0),
        )
        .interact()?;
    let output_format = OutputFormat::from(formats[format_idx]);

    let qualities: Vec<&str> = Quality::ALL.iter().map(Quality::as_str).collect();
    let quality_idx = Select::with_theme(&theme)
        .with_prompt("Quality")
        .items(&qualities)
        .default(
            Quality::ALL
                .iter()
                .position(|q| *q == current.quality)
                .unwrap_or(1),
        )
        .interact()?;
    let quality = Quality::ALL[quality_idx];

    let custom_quality_args = if quality == Quality::Custom {
        let prompt = if output_format == OutputFormat::Wav {
            "Bit depth (16, 24 or 32)"
        } else {
            "Encoder arguments (e.g. -b:a 96k)"
        };
        Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .with_initial_text(current.custom_quality_args.clone())
            .allow_empty(true)
            .interact_text()?
    } else {
        current.custom_quality_args.clone()
    };

    let output_dir: String = Input::with_theme(&theme)
        .with_prompt("Output directory ({sourcedir} = folder of each input)")
        .default(current.output_dir.clone())
        .interact_text()?;

    let output_sample_rate = if output_format.supports_sample_rate() {
        prompt_optional_sample_rate(&theme, current.output_sample_rate)?
    } else {
        current.output_sample_rate
    };

    let use_soxr_resampler = Confirm::with_theme(&theme)
        .with_prompt("Use the SoX resampler?")
        .default(current.use_soxr_resampler)
        .interact()?;

    let audio_filters: String = Input::with_theme(&theme)
        .with_prompt("Extra audio filters (blank = none)")
        .with_initial_text(current.audio_filters.clone())
        .allow_empty(true)
        .interact_text()?;

    let quick_convert_mode = Confirm::with_theme(&theme)
        .with_prompt("Quick mode (keep existing outputs, copy same-format files)?")
        .default(current.quick_convert_mode)
        .interact()?;

    Ok(GlobalConfig {
        output_dir,
        output_format,
        quality,
        custom_quality_args,
        output_sample_rate,
        use_soxr_resampler,
        audio_filters,
        quick_convert_mode,
        ..current
    })
}

fn prompt_optional_sample_rate(theme: &ColorfulTheme, current: Option<u32>) -> Result<Option<u32>> {
    loop {
        let raw: String = Input::with_theme(theme)
            .with_prompt("Sample rate in Hz (blank = keep source)")
            .with_initial_text(current.map(|r| r.to_string()).unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match validate_sample_rate(trimmed) {
            Ok(rate) => return Ok(Some(rate)),
            Err(err) => println!("Invalid value: {err}. Leave blank to keep the source rate."),
        }
    }
}
