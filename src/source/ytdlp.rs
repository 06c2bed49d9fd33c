use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, SplitError};
use crate::process::run_tool;
use crate::segment::TimeOffset;

use super::VideoSource;

/// [`VideoSource`] backed by the `yt-dlp` command-line tool.
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    bin: PathBuf,
    audio_format: String,
    timeout: Duration,
}

impl YtDlpSource {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            audio_format: "mp3".to_string(),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn with_audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = format.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that yt-dlp is installed and runs.
    pub async fn check(&self) -> Result<String> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--version");
        let output = run_tool(cmd, Duration::from_secs(30)).await.map_err(|e| {
            SplitError::SourceFetch(format!(
                "yt-dlp not found at {}. Install it or set ytdlp_bin. Error: {e}",
                self.bin.display()
            ))
        })?;
        let version = output.stdout.trim().to_string();
        debug!("yt-dlp {} is available", version);
        Ok(version)
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["--no-playlist", "--no-warnings"]);
        cmd
    }

    async fn print_field(&self, flag: &str, url: &str) -> Result<String> {
        let mut cmd = self.base_command();
        cmd.arg(flag).arg(url);
        let output = run_tool(cmd, self.timeout)
            .await
            .map_err(|e| SplitError::SourceFetch(format!("yt-dlp {flag} failed: {e}")))?;

        let value = output.stdout.trim().to_string();
        if value.is_empty() {
            return Err(SplitError::SourceFetch(format!(
                "yt-dlp {flag} printed nothing for {url}"
            )));
        }
        Ok(value)
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn fetch_audio(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        info!("Downloading audio from {}", url);

        // yt-dlp picks the extension itself; the post-processor then converts to
        // the requested format, which lands on `dest`.
        let template = dest.with_extension("%(ext)s");
        let expected = dest.with_extension(&self.audio_format);

        let mut cmd = self.base_command();
        cmd.args(["-x", "--audio-format"])
            .arg(&self.audio_format)
            .arg("-o")
            .arg(&template)
            .arg(url);

        run_tool(cmd, self.timeout)
            .await
            .map_err(|e| SplitError::SourceFetch(format!("yt-dlp download failed: {e}")))?;

        if !expected.exists() {
            return Err(SplitError::SourceFetch(format!(
                "yt-dlp finished but produced no audio at {}",
                expected.display()
            )));
        }

        info!("Audio downloaded to {}", expected.display());
        Ok(expected)
    }

    async fn get_duration(&self, url: &str) -> Result<TimeOffset> {
        self.print_field("--get-duration", url).await.map(TimeOffset::new)
    }

    async fn get_title(&self, url: &str) -> Result<String> {
        self.print_field("--get-title", url).await
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
