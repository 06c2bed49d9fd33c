use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, SplitError};
use crate::process::run_tool;
use crate::segment::TimeOffset;

use super::AudioCutter;

/// [`AudioCutter`] that stream-copies ranges with FFmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegCutter {
    bin: PathBuf,
    timeout: Duration,
}

impl FfmpegCutter {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if FFmpeg is installed and accessible.
    pub async fn check(&self) -> Result<()> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-version");
        run_tool(cmd, Duration::from_secs(30)).await.map_err(|e| {
            SplitError::Cut(format!(
                "FFmpeg not found at {}. Install it with: apt install ffmpeg (Linux) or brew install ffmpeg (macOS). Error: {e}",
                self.bin.display()
            ))
        })?;

        debug!("FFmpeg is available");
        Ok(())
    }
}

#[async_trait]
impl AudioCutter for FfmpegCutter {
    async fn cut(
        &self,
        source: &Path,
        start: &TimeOffset,
        end: &TimeOffset,
        destination: &Path,
    ) -> Result<()> {
        if !source.exists() {
            return Err(SplitError::Cut(format!(
                "Source audio not found: {}",
                source.display()
            )));
        }

        let from = start.cut_position();
        let to = end.cut_position();

        info!(
            "Extracting segment {} - {} into {}",
            from,
            to,
            destination.display()
        );

        let mut cmd = Command::new(&self.bin);
        cmd.args(["-y", "-i"])
            .arg(source)
            .args(["-ss", &from, "-to", &to, "-c", "copy"])
            .arg(destination);

        run_tool(cmd, self.timeout)
            .await
            .map_err(|e| SplitError::Cut(format!("FFmpeg segment extraction failed: {e}")))?;

        if !destination.exists() {
            return Err(SplitError::Cut(format!(
                "Output file was not created: {}",
                destination.display()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
