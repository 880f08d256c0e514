use crate::config::{GlobalConfig, OutputFormat, Quality};
use crate::error::{Error, Result};
use crate::ffmpeg::resolve_ffmpeg;
use crate::filters::validate_sample_rate;
use crate::runner::Job;
use clap::{ArgAction, Parser, ValueHint};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "audio_converter",
    version,
    about = "Batch convert audio (and the audio of video files) with ffmpeg"
)]
pub struct Cli {
    /// Files or directories to convert
    #[arg(required = true, value_hint = ValueHint::AnyPath)]
    pub inputs: Vec<PathBuf>,

    /// TOML config file; flags given on the command line override it
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output format: mp3, m4a, ogg, opus, flac or wav (other values are used as the extension)
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// Quality preset: extreme, high, medium or custom
    #[arg(short = 'q', long)]
    pub quality: Option<Quality>,

    /// Encoder arguments for `--quality custom` (bit depth 16/24/32 for wav)
    #[arg(long, allow_hyphen_values = true)]
    pub custom_quality: Option<String>,

    /// Output directory; `{sourcedir}` is replaced by the input's directory
    #[arg(short = 'o', long, value_hint = ValueHint::DirPath)]
    pub output_dir: Option<String>,

    /// Resample the output to this rate in Hz (ignored for opus)
    #[arg(long, value_parser = validate_sample_rate)]
    pub sample_rate: Option<u32>,

    /// Use the SoX resampler
    #[arg(long, action = ArgAction::SetTrue)]
    pub soxr: bool,

    /// Extra ffmpeg audio filters, separated by spaces
    #[arg(long, allow_hyphen_values = true)]
    pub filters: Option<String>,

    /// Keep existing outputs and copy files already in the target format
    #[arg(long, action = ArgAction::SetTrue)]
    pub quick: bool,

    /// Path to ffmpeg binary (overrides config and PATH lookup)
    #[arg(long, value_hint = ValueHint::ExecutablePath)]
    pub ffmpeg: Option<PathBuf>,

    /// Recurse into directories
    #[arg(short = 'r', long, action = ArgAction::SetTrue)]
    pub recursive: bool,

    /// Parallel conversions (0 = one per CPU)
    #[arg(short = 'j', long = "jobs", default_value = "0")]
    pub workers: usize,

    /// Print the ffmpeg command of every job instead of running it
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Ask for format, quality and output settings before starting
    #[arg(short = 'i', long, action = ArgAction::SetTrue)]
    pub interactive: bool,

    /// Debug logging, including raw ffmpeg output
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    pub fn global_config(&self) -> Result<GlobalConfig> {
        let mut cfg = match &self.config {
            Some(path) => GlobalConfig::load(path)?,
            None => GlobalConfig::default(),
        };

        if let Some(format) = &self.format {
            cfg.output_format = OutputFormat::from(format.as_str());
        }
        if let Some(quality) = self.quality {
            cfg.quality = quality;
        }
        if let Some(args) = &self.custom_quality {
            cfg.custom_quality_args = args.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(rate) = self.sample_rate {
            cfg.output_sample_rate = Some(rate);
        }
        if let Some(filters) = &self.filters {
            cfg.audio_filters = filters.clone();
        }
        cfg.use_soxr_resampler |= self.soxr;
        cfg.quick_convert_mode |= self.quick;

        let configured = self.ffmpeg.clone().or_else(|| {
            (cfg.ffmpeg_binary.as_path() != Path::new("ffmpeg")).then(|| cfg.ffmpeg_binary.clone())
        });
        cfg.ffmpeg_binary = resolve_ffmpeg(configured);

        Ok(cfg)
    }

    /// Expands the inputs into numbered jobs. Directories contribute their
    /// regular files in name order.
    pub fn jobs(&self) -> Result<Vec<Job>> {
        let mut files = Vec::new();
        for input in &self.inputs {
            files.extend(expand_input(input, self.recursive)?);
        }
        Ok(files
            .into_iter()
            .enumerate()
            .map(|(id, path)| Job::new(id, path))
            .collect())
    }
}

fn expand_input(input: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(Error::InputNotFound(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut walker = WalkDir::new(input).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| Error::ReadInputDir {
            path: input.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
