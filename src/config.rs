use crate::error::{Error, Result};
use crate::filters::validate_sample_rate;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Placeholder in the output directory template replaced by the directory of
/// the input file.
pub const SOURCE_DIR_PLACEHOLDER: &str = "{sourcedir}";

pub const DEFAULT_OUTPUT_DIR: &str = "{sourcedir}/out";

/// Target container/codec family.
///
/// Parsing never fails: anything that is not an exact, case-sensitive match
/// for a known format is carried through as [`OutputFormat::Other`] and used
/// verbatim as the output extension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum OutputFormat {
    #[default]
    Mp3,
    M4a,
    Ogg,
    Opus,
    Flac,
    Wav,
    Other(String),
}

impl OutputFormat {
    pub const KNOWN: [OutputFormat; 6] = [
        OutputFormat::Mp3,
        OutputFormat::M4a,
        OutputFormat::Ogg,
        OutputFormat::Opus,
        OutputFormat::Flac,
        OutputFormat::Wav,
    ];

    /// File extension written for this format (no leading dot).
    pub fn extension(&self) -> &str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::M4a => "m4a",
            OutputFormat::Ogg => "ogg",
            OutputFormat::Opus => "opus",
            OutputFormat::Flac => "flac",
            OutputFormat::Wav => "wav",
            OutputFormat::Other(raw) => raw,
        }
    }

    /// Opus always encodes at 48 kHz, so no sample rate can be forced.
    pub fn supports_sample_rate(&self) -> bool {
        !matches!(self, OutputFormat::Opus | OutputFormat::Other(_))
    }
}

impl From<&str> for OutputFormat {
    fn from(raw: &str) -> Self {
        match raw {
            "mp3" => OutputFormat::Mp3,
            "m4a" => OutputFormat::M4a,
            "ogg" => OutputFormat::Ogg,
            "opus" => OutputFormat::Opus,
            "flac" => OutputFormat::Flac,
            "wav" => OutputFormat::Wav,
            other => OutputFormat::Other(other.to_string()),
        }
    }
}

impl From<String> for OutputFormat {
    fn from(raw: String) -> Self {
        OutputFormat::from(raw.as_str())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Named quality preset. `Custom` defers to
/// [`GlobalConfig::custom_quality_args`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Quality {
    Extreme,
    #[default]
    High,
    Medium,
    Custom,
}

impl Quality {
    pub const ALL: [Quality; 4] = [
        Quality::Extreme,
        Quality::High,
        Quality::Medium,
        Quality::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Extreme => "extreme",
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Custom => "custom",
        }
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "extreme" => Ok(Quality::Extreme),
            "high" => Ok(Quality::High),
            "medium" => Ok(Quality::Medium),
            "custom" => Ok(Quality::Custom),
            other => Err(Error::UnknownQuality(other.to_string())),
        }
    }
}

impl TryFrom<String> for Quality {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every job of a batch. Read-only once the batch starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Output directory template, may contain `{sourcedir}`.
    pub output_dir: String,
    pub output_format: OutputFormat,
    pub quality: Quality,
    /// Raw tool arguments (or a wav bit depth) for [`Quality::Custom`].
    pub custom_quality_args: String,
    #[serde(deserialize_with = "sample_rate_in_range")]
    pub output_sample_rate: Option<u32>,
    pub use_soxr_resampler: bool,
    /// Space separated audio filter fragments, joined into one `-af` chain.
    pub audio_filters: String,
    pub quick_convert_mode: bool,
    pub ffmpeg_binary: PathBuf,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            output_format: OutputFormat::default(),
            quality: Quality::default(),
            custom_quality_args: String::new(),
            output_sample_rate: None,
            use_soxr_resampler: false,
            audio_filters: String::new(),
            quick_convert_mode: false,
            ffmpeg_binary: PathBuf::from("ffmpeg"),
        }
    }
}

/// Holds the file to the same range as `--sample-rate`.
fn sample_rate_in_range<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let rate = u32::deserialize(deserializer)?;
    validate_sample_rate(&rate.to_string())
        .map(Some)
        .map_err(serde::de::Error::custom)
}

impl GlobalConfig {
    /// Load a TOML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Custom arguments only apply when explicitly selected and non-empty.
    pub fn wants_custom_quality(&self) -> bool {
        self.quality == Quality::Custom && !self.custom_quality_args.is_empty()
    }
}
