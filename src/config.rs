//! Process-wide settings: SSRC filter, output file names and the YUV size warning.
//!
//! Values start from defaults, are overridden by `SVCIO_*` environment
//! variables, then by `key = value` lines in `./svcio.toml` or `./config.toml`.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, SvcError};
use crate::format::rtp::SsrcFilter;

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::new());
}

const CONFIG_PATHS: [&str; 2] = ["./svcio.toml", "./config.toml"];
const ENV_PREFIX: &str = "SVCIO_";
const KEYS: [&str; 5] = [
    "ssrc_filter",
    "yuv_output",
    "pacsi_output",
    "unit_log_output",
    "yuv_size_warning",
];

/// 1 GiB
pub const DEFAULT_YUV_SIZE_WARNING: u64 = 1024 * 1024 * 1024;

/// Settings for a decoding run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SSRCs to decode; empty means all
    pub ssrc_filter: Vec<u32>,
    /// Raw YUV file, see [`YuvWriter::create`](crate::av::YuvWriter::create)
    pub yuv_output: PathBuf,
    /// PACSI dump file, see [`Pipeline::from_config`](crate::pipeline::Pipeline::from_config)
    pub pacsi_output: PathBuf,
    /// Per-unit log file, see [`Pipeline::from_config`](crate::pipeline::Pipeline::from_config)
    pub unit_log_output: PathBuf,
    /// Output size in bytes after which a single warning is logged
    pub yuv_size_warning: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssrc_filter: Vec::new(),
            yuv_output: PathBuf::from("out.yuv"),
            pacsi_output: PathBuf::from("pacsi.txt"),
            unit_log_output: PathBuf::from("nal.txt"),
            yuv_size_warning: DEFAULT_YUV_SIZE_WARNING,
        }
    }
}

impl Config {
    fn new() -> Self {
        let mut config = Config::default();

        // Environment first, config file wins
        config.apply_vars(|key| env::var(key).ok());

        for path in &CONFIG_PATHS {
            if let Ok(content) = fs::read_to_string(path) {
                if let Err(e) = config.apply_file(&content) {
                    log::warn!("Ignoring rest of {}: {}", path, e);
                }
            }
        }

        config
    }

    /// Re-reads environment and config files into the shared snapshot.
    pub fn reload() {
        let new_config = Config::new();
        *CONFIG.write() = new_config;
    }

    /// Builds the filter for [`ssrc_filter`](Self::ssrc_filter)
    pub fn ssrc_filter(&self) -> SsrcFilter {
        SsrcFilter::new(self.ssrc_filter.iter().copied())
    }

    /// Sets one setting from its textual value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "ssrc_filter" => {
                self.ssrc_filter = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(u32::from_str)
                    .collect::<std::result::Result<_, _>>()?;
            }
            "yuv_output" => self.yuv_output = PathBuf::from(value),
            "pacsi_output" => self.pacsi_output = PathBuf::from(value),
            "unit_log_output" => self.unit_log_output = PathBuf::from(value),
            "yuv_size_warning" => self.yuv_size_warning = value.parse()?,
            _ => {
                return Err(SvcError::InvalidData(format!(
                    "unknown config key: {}",
                    key
                )))
            }
        }
        Ok(())
    }

    fn apply_vars<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        for key in KEYS {
            let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Some(value) = lookup(&var) {
                if let Err(e) = self.set(key, &value) {
                    log::warn!("Ignoring {}: {}", var, e);
                }
            }
        }
    }

    fn apply_file(&mut self, content: &str) -> Result<()> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            match self.set(key.trim(), value) {
                Err(SvcError::InvalidData(msg)) => log::debug!("{}", msg),
                other => other?,
            }
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = SvcError;

    /// Parses config file content on top of the defaults.
    fn from_str(s: &str) -> Result<Self> {
        let mut config = Config::default();
        config.apply_file(s)?;
        Ok(config)
    }
}

/// Returns a copy of the current shared configuration
pub fn current() -> Config {
    CONFIG.read().clone()
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# SVCIO Configuration
# This is a template. Replace the values with your actual configuration.

# Comma separated RTP SSRCs to decode, in decimal. Empty decodes all streams.
ssrc_filter = ""

# Output files
yuv_output = "out.yuv"
pacsi_output = "pacsi.txt"
unit_log_output = "nal.txt"

# Warn once when the YUV output grows past this many bytes
yuv_size_warning = 1073741824
"#;
        fs::write(path, template)?;
    }
    Ok(())
}
