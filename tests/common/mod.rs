//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use audiosplit::audio::AudioCutter;
use audiosplit::cleanup::{CleanupScheduler, ScheduledCleanup, TokioCleanupScheduler};
use audiosplit::error::{Result, SplitError};
use audiosplit::pipeline::{ExtractionPipeline, PipelineConfig};
use audiosplit::segment::TimeOffset;
use audiosplit::source::VideoSource;
use tokio::sync::Notify;

/// Video source that writes a fake download and answers canned metadata.
pub struct MockSource {
    pub title: String,
    pub duration: String,
    pub fail_fetch: bool,
    /// When set, `fetch_audio` waits for a notification before writing.
    pub hold: Option<Arc<Notify>>,
    pub fetch_calls: AtomicUsize,
}

impl MockSource {
    pub fn new(title: &str, duration: &str) -> Self {
        Self {
            title: title.to_string(),
            duration: duration.to_string(),
            fail_fetch: false,
            hold: None,
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_fetch: true,
            ..Self::new("Unused", "1:00")
        }
    }

    pub fn held(title: &str, duration: &str, hold: Arc<Notify>) -> Self {
        Self {
            hold: Some(hold),
            ..Self::new(title, duration)
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for MockSource {
    async fn fetch_audio(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref hold) = self.hold {
            hold.notified().await;
        }
        if self.fail_fetch {
            return Err(SplitError::SourceFetch(format!(
                "yt-dlp download failed: exited with exit status: 1: ERROR: Video unavailable ({url})"
            )));
        }
        tokio::fs::write(dest, b"ID3 fake audio").await?;
        Ok(dest.to_path_buf())
    }

    async fn get_duration(&self, _url: &str) -> Result<TimeOffset> {
        Ok(TimeOffset::new(self.duration.as_str()))
    }

    async fn get_title(&self, _url: &str) -> Result<String> {
        Ok(self.title.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Cutter that writes `start-end` into the destination and records every call.
#[derive(Default)]
pub struct MockCutter {
    pub calls: Mutex<Vec<(String, String, PathBuf)>>,
    /// 1-based call number that fails.
    pub fail_on_call: Option<usize>,
}

impl MockCutter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<(String, String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioCutter for MockCutter {
    async fn cut(
        &self,
        source: &Path,
        start: &TimeOffset,
        end: &TimeOffset,
        destination: &Path,
    ) -> Result<()> {
        assert!(source.exists(), "cut called without the source download");
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((
                start.as_str().to_string(),
                end.as_str().to_string(),
                destination.to_path_buf(),
            ));
            calls.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(SplitError::Cut(
                "FFmpeg segment extraction failed: exited with exit status: 1".to_string(),
            ));
        }
        tokio::fs::write(destination, format!("{}-{}", start, end)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Real tokio scheduler that also remembers what it was asked to delete.
#[derive(Default)]
pub struct RecordingScheduler {
    inner: TokioCleanupScheduler,
    pub scheduled: Mutex<Vec<(Vec<PathBuf>, Duration)>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<(Vec<PathBuf>, Duration)> {
        self.scheduled.lock().unwrap().clone()
    }
}

impl CleanupScheduler for RecordingScheduler {
    fn schedule_deletion(&self, paths: Vec<PathBuf>, after: Duration) -> ScheduledCleanup {
        self.scheduled
            .lock()
            .unwrap()
            .push((paths.clone(), after));
        self.inner.schedule_deletion(paths, after)
    }
}

pub fn pipeline_config(dir: &Path, retention: Duration) -> PipelineConfig {
    PipelineConfig {
        output_dir: dir.to_path_buf(),
        audio_format: "mp3".to_string(),
        retention,
    }
}

pub fn build_pipeline(
    source: Arc<MockSource>,
    cutter: Arc<MockCutter>,
    scheduler: Arc<RecordingScheduler>,
    config: PipelineConfig,
) -> ExtractionPipeline {
    ExtractionPipeline::new(source, cutter, scheduler, config)
}

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
