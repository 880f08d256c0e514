//! Turns an input path plus the batch settings into the exact ffmpeg command
//! line for one job. Pure: nothing here touches the filesystem or spawns
//! anything.

use crate::config::{GlobalConfig, OutputFormat, Quality, SOURCE_DIR_PLACEHOLDER};
use crate::filters::build_audio_filters;
use std::ffi::{OsStr, OsString};
use std::path::{self, Path, PathBuf};

const METADATA_MAPS: &[&str] = &["-map_metadata", "0", "-map_metadata", "0:s:0"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertPlan {
    pub output_dir: PathBuf,
    /// Output file path without the extension.
    pub output_stem: PathBuf,
    pub output_extension: String,
    pub args: Vec<OsString>,
}

impl ConvertPlan {
    pub fn output_file(&self) -> PathBuf {
        let mut file = self.output_stem.clone().into_os_string();
        file.push(".");
        file.push(&self.output_extension);
        PathBuf::from(file)
    }

    /// Shell-like rendering for logs and dry runs.
    pub fn command_line(&self, program: &Path) -> String {
        std::iter::once(program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_arg(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        s.into_owned()
    } else {
        format!("\"{}\"", s.replace('"', "\\\""))
    }
}

#[derive(Default)]
struct Args(Vec<OsString>);

impl Args {
    fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.0.push(arg.into());
        self
    }

    fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.0.extend(args.into_iter().map(Into::into));
        self
    }
}

pub fn plan(input: &Path, config: &GlobalConfig) -> ConvertPlan {
    let absolute = path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
    let source_dir = absolute.parent().unwrap_or(Path::new(""));
    let base_name = input.file_stem().unwrap_or_default();

    let output_dir = resolve_output_dir(&config.output_dir, source_dir.as_os_str(), cfg!(windows));

    let mut output_stem = output_dir.clone().into_os_string();
    output_stem.push(path::MAIN_SEPARATOR_STR);
    output_stem.push(base_name);
    let output_stem = PathBuf::from(output_stem);

    let mut args = Args::default();
    args.arg("-hide_banner")
        .arg(if config.quick_convert_mode { "-n" } else { "-y" })
        .arg("-i")
        .arg(input.as_os_str());

    let format = &config.output_format;
    match format {
        OutputFormat::Mp3 => {
            args.args(["-c:a", "libmp3lame"]);
            args.args(tier_args(config, &["-b:a", "320k"], &["-q:a", "1"], &["-q:a", "4"]));
            args.args(sample_rate_args(config));
            args.args(METADATA_MAPS.iter().copied());
            args.args(["-id3v2_version", "3"]);
        }
        OutputFormat::M4a => {
            // AAC in mp4 cannot carry the cover art stream
            args.args(["-c:a", "aac", "-vn"]);
            args.args(tier_args(config, &["-b:a", "256k"], &["-b:a", "192k"], &["-b:a", "128k"]));
            args.args(sample_rate_args(config));
            args.args(METADATA_MAPS.iter().copied());
        }
        OutputFormat::Ogg => {
            args.args(["-vn", "-c:a", "libvorbis"]);
            args.args(tier_args(config, &["-q:a", "8"], &["-q:a", "6"], &["-q:a", "4"]));
            args.args(sample_rate_args(config));
            args.args(METADATA_MAPS.iter().copied());
        }
        OutputFormat::Opus => {
            args.args(["-c:a", "libopus"]);
            args.args(tier_args(config, &["-b:a", "192k"], &["-b:a", "160k"], &["-b:a", "128k"]));
            args.args(METADATA_MAPS.iter().copied());
        }
        OutputFormat::Flac => {
            args.args(["-c:a", "flac"]);
            args.args(tier_args(config, &[], &[], &["-sample_fmt", "s16"]));
            args.args(sample_rate_args(config));
            args.args(METADATA_MAPS.iter().copied());
        }
        OutputFormat::Wav => {
            args.args(["-c:a", wav_codec(config)]);
            args.args(sample_rate_args(config));
        }
        OutputFormat::Other(_) => {}
    }

    if let Some(af) = build_audio_filters(config.use_soxr_resampler, &config.audio_filters) {
        args.arg("-af").arg(af);
    }

    let plan = ConvertPlan {
        output_dir,
        output_stem,
        output_extension: format.extension().to_string(),
        args: Vec::new(),
    };
    args.arg(plan.output_file());

    ConvertPlan {
        args: args.0,
        ..plan
    }
}

/// Replaces `{sourcedir}` in `template`. With `strip_drive_colon` (Windows),
/// a template that does not start with the placeholder gets the colons of
/// the source directory removed, so `D:\out\{sourcedir}` cannot end up as
/// `D:\out\C:\music`.
pub fn resolve_output_dir(template: &str, source_dir: &OsStr, strip_drive_colon: bool) -> PathBuf {
    let source_dir: OsString = if strip_drive_colon && !template.starts_with(SOURCE_DIR_PLACEHOLDER)
    {
        source_dir.to_string_lossy().replace(':', "").into()
    } else {
        source_dir.to_os_string()
    };

    let mut resolved = OsString::new();
    for (i, part) in template.split(SOURCE_DIR_PLACEHOLDER).enumerate() {
        if i > 0 {
            resolved.push(&source_dir);
        }
        resolved.push(part);
    }
    PathBuf::from(resolved)
}

/// Quality arguments for the configured tier. An active custom string wins
/// over the tier table and is split on single spaces, verbatim.
fn tier_args<'a>(
    config: &'a GlobalConfig,
    extreme: &'a [&'a str],
    high: &'a [&'a str],
    medium: &'a [&'a str],
) -> Vec<&'a str> {
    if config.wants_custom_quality() {
        return config.custom_quality_args.split(' ').collect();
    }
    match config.quality {
        Quality::Extreme => extreme.to_vec(),
        Quality::High => high.to_vec(),
        Quality::Medium => medium.to_vec(),
        Quality::Custom => Vec::new(),
    }
}

/// For wav the custom string is a bit depth, not tool arguments.
fn wav_codec(config: &GlobalConfig) -> &'static str {
    if !config.wants_custom_quality() {
        return "pcm_s16le";
    }
    match config.custom_quality_args.as_str() {
        "32" => "pcm_s32le",
        "24" => "pcm_s24le",
        _ => "pcm_s16le",
    }
}

fn sample_rate_args(config: &GlobalConfig) -> Vec<String> {
    match config.output_sample_rate {
        Some(rate) if config.output_format.supports_sample_rate() => {
            vec!["-ar".to_string(), rate.to_string()]
        }
        _ => Vec::new(),
    }
}
