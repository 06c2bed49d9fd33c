use crate::error::{Result, SplitError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub output_dir: PathBuf,
    pub ytdlp_bin: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub audio_format: String,
    pub retention_secs: u64,
    pub tool_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            output_dir: PathBuf::from("downloads"),
            ytdlp_bin: PathBuf::from("yt-dlp"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            audio_format: "mp3".to_string(),
            retention_secs: 60,
            tool_timeout_secs: 600,
        }
    }
}

impl Config {
    /// Load configuration from `path` (or the per-user config file when `None`),
    /// then apply `AUDIOSPLIT_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(SplitError::Config(format!(
                        "Config file not found: {}",
                        p.display()
                    )));
                }
                Some(p.to_path_buf())
            }
            None => Self::config_file_path().filter(|p| p.exists()),
        };

        if let Some(config_path) = config_path {
            let contents = std::fs::read_to_string(&config_path)?;
            config = toml::from_str::<Config>(&contents).map_err(|e| {
                SplitError::Config(format!("Failed to parse {}: {e}", config_path.display()))
            })?;
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("AUDIOSPLIT_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Ok(dir) = std::env::var("AUDIOSPLIT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Ok(bin) = std::env::var("AUDIOSPLIT_YTDLP_BIN") {
            self.ytdlp_bin = PathBuf::from(bin);
        }
        if let Ok(bin) = std::env::var("AUDIOSPLIT_FFMPEG_BIN") {
            self.ffmpeg_bin = PathBuf::from(bin);
        }
        if let Ok(format) = std::env::var("AUDIOSPLIT_AUDIO_FORMAT") {
            self.audio_format = format;
        }
        if let Ok(secs) = std::env::var("AUDIOSPLIT_RETENTION_SECS") {
            if let Ok(s) = secs.parse() {
                self.retention_secs = s;
            }
        }
        if let Ok(secs) = std::env::var("AUDIOSPLIT_TOOL_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                self.tool_timeout_secs = s;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(SplitError::Config(
                "output_dir must not be empty".to_string(),
            ));
        }

        if self.retention_secs == 0 {
            return Err(SplitError::Config(
                "retention_secs must be greater than 0".to_string(),
            ));
        }

        if self.tool_timeout_secs == 0 {
            return Err(SplitError::Config(
                "tool_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.audio_format.is_empty()
            || !self.audio_format.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(SplitError::Config(format!(
                "Unsupported audio_format: '{}'. Use a plain extension such as 'mp3'",
                self.audio_format
            )));
        }

        Ok(())
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("audiosplit").join("config.toml"))
    }
}
