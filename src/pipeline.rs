use crate::archive::build_archive;
use crate::audio::{AudioCutter, ExtractedFile};
use crate::cleanup::{CleanupScheduler, ScheduledCleanup};
use crate::config::Config;
use crate::error::{Result, SplitError};
use crate::gate::JobGate;
use crate::sanitize::sanitize;
use crate::segment::{compute_segments, Segment};
use crate::source::{media_id, VideoSource};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Shared directory every job writes into.
    pub output_dir: PathBuf,
    /// Audio extension of the download and of every clip.
    pub audio_format: String,
    /// Delay between a successful job and deletion of its artifacts.
    pub retention: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            audio_format: "mp3".to_string(),
            retention: Duration::from_secs(60),
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            audio_format: config.audio_format.clone(),
            retention: config.retention(),
        }
    }
}

/// One incoming extraction call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub source_url: Option<String>,
    pub timestamp_text: Option<String>,
}

impl ExtractionRequest {
    pub fn new(source_url: impl Into<String>, timestamp_text: impl Into<String>) -> Self {
        Self {
            source_url: Some(source_url.into()),
            timestamp_text: Some(timestamp_text.into()),
        }
    }
}

/// Where a job currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Admitted,
    Fetching,
    Segmenting,
    Cutting { current: usize, total: usize },
    Archiving,
    CleanupScheduled,
    Done,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Admitted => write!(f, "admitted"),
            JobStage::Fetching => write!(f, "fetching"),
            JobStage::Segmenting => write!(f, "segmenting"),
            JobStage::Cutting { current, total } => write!(f, "cutting {current}/{total}"),
            JobStage::Archiving => write!(f, "archiving"),
            JobStage::CleanupScheduled => write!(f, "cleanup scheduled"),
            JobStage::Done => write!(f, "done"),
            JobStage::Failed => write!(f, "failed"),
        }
    }
}

/// Timings of one successful job.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub fetch_time: Duration,
    pub cut_time: Duration,
    pub archive_time: Duration,
    pub total_time: Duration,
    pub segments: usize,
}

/// Everything a successful job produced.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub archive_name: String,
    pub archive_path: PathBuf,
    /// Clips in output order; exactly one when no timestamps were given.
    pub files: Vec<ExtractedFile>,
    pub segments: Vec<Segment>,
    /// Raw download, clips and archive: the set handed to the cleanup scheduler.
    pub artifacts: Vec<PathBuf>,
    pub stats: PipelineStats,
    pub cleanup: ScheduledCleanup,
}

/// Turns one request into clips plus a zip, one job at a time.
pub struct ExtractionPipeline {
    source: Arc<dyn VideoSource>,
    cutter: Arc<dyn AudioCutter>,
    cleanup: Arc<dyn CleanupScheduler>,
    gate: JobGate,
    config: PipelineConfig,
}

impl ExtractionPipeline {
    pub fn new(
        source: Arc<dyn VideoSource>,
        cutter: Arc<dyn AudioCutter>,
        cleanup: Arc<dyn CleanupScheduler>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            cutter,
            cleanup,
            gate: JobGate::new(),
            config,
        }
    }

    pub fn gate(&self) -> &JobGate {
        &self.gate
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one extraction job.
    ///
    /// The request is validated before the gate is touched, so a bad URL never
    /// blocks other callers. Once admitted, the gate is held until this returns,
    /// whatever the outcome. A failed job leaves already-written files in place
    /// and schedules no cleanup for them.
    pub async fn run(&self, request: &ExtractionRequest) -> Result<ExtractionOutcome> {
        let url = request
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SplitError::Validation("sourceUrl is required".to_string()))?;

        let job = media_id(url).ok_or_else(|| {
            SplitError::Validation(format!("no media identifier in {url}"))
        })?;

        let permit = self.gate.try_acquire().ok_or(SplitError::Busy)?;
        self.enter(&job, JobStage::Admitted);

        let timestamps = request.timestamp_text.as_deref().unwrap_or("");
        let result = self.execute(url, &job, timestamps).await;

        match &result {
            Ok(outcome) => {
                self.enter(&job, JobStage::Done);
                info!(
                    "Job {} finished in {:.2}s: {} file(s) in {}",
                    job,
                    outcome.stats.total_time.as_secs_f64(),
                    outcome.files.len(),
                    outcome.archive_name
                );
            }
            Err(e) => {
                self.enter(&job, JobStage::Failed);
                warn!("Job {} failed: {}", job, e);
            }
        }

        permit.release();
        result
    }

    fn enter(&self, job: &str, stage: JobStage) {
        info!(job = %job, "Stage: {}", stage);
    }

    async fn execute(&self, url: &str, job: &str, timestamps: &str) -> Result<ExtractionOutcome> {
        let start_time = Instant::now();
        let dir = &self.config.output_dir;
        let ext = &self.config.audio_format;

        tokio::fs::create_dir_all(dir).await?;

        // ═══════════════════════════════════════════════════════════════════════
        // Stage 1: Fetch audio and metadata
        // ═══════════════════════════════════════════════════════════════════════
        self.enter(job, JobStage::Fetching);
        let fetch_start = Instant::now();

        let raw_dest = dir.join(format!("{job}.{ext}"));
        let raw_path = self.source.fetch_audio(url, &raw_dest).await?;
        let duration = self.source.get_duration(url).await?;
        let title = self.source.get_title(url).await?;

        let mut base_name = sanitize(&title);
        if base_name.is_empty() {
            warn!(
                "Title {:?} has no filename-safe characters, naming outputs after {}",
                title, job
            );
            base_name = job.to_string();
        }

        let fetch_time = fetch_start.elapsed();
        info!(
            "Fetched {:?} ({}) via {} in {:.2}s",
            title,
            duration,
            self.source.name(),
            fetch_time.as_secs_f64()
        );

        // ═══════════════════════════════════════════════════════════════════════
        // Stage 2: Segments
        // ═══════════════════════════════════════════════════════════════════════
        self.enter(job, JobStage::Segmenting);
        let segments = compute_segments(timestamps, &duration);

        // ═══════════════════════════════════════════════════════════════════════
        // Stage 3: Cut clips, strictly one after another
        // ═══════════════════════════════════════════════════════════════════════
        let cut_start = Instant::now();
        let mut files = Vec::with_capacity(segments.len().max(1));

        if segments.is_empty() {
            let file = ExtractedFile::in_dir(dir, format!("{base_name}.{ext}"));
            tokio::fs::rename(&raw_path, &file.path).await?;
            info!("No timestamps, whole track saved as {}", file.name);
            files.push(file);
        } else {
            let total = segments.len();
            for (i, segment) in segments.iter().enumerate() {
                self.enter(job, JobStage::Cutting { current: i + 1, total });
                let file = ExtractedFile::in_dir(dir, segment.file_name(ext));
                self.cutter
                    .cut(&raw_path, &segment.start, &segment.end, &file.path)
                    .await?;
                files.push(file);
            }
        }
        let cut_time = cut_start.elapsed();

        // ═══════════════════════════════════════════════════════════════════════
        // Stage 4: Archive
        // ═══════════════════════════════════════════════════════════════════════
        self.enter(job, JobStage::Archiving);
        let archive_start = Instant::now();

        let archive_name = format!("{base_name}.zip");
        let archive_path = dir.join(&archive_name);
        {
            let files = files.clone();
            let dest = archive_path.clone();
            tokio::task::spawn_blocking(move || build_archive(&files, &dest))
                .await
                .map_err(|e| SplitError::Archive(format!("Archive task failed: {e}")))??;
        }
        let archive_time = archive_start.elapsed();

        // ═══════════════════════════════════════════════════════════════════════
        // Stage 5: Schedule deletion of the whole artifact set
        // ═══════════════════════════════════════════════════════════════════════
        let mut artifacts = Vec::with_capacity(files.len() + 2);
        artifacts.push(raw_path);
        artifacts.extend(files.iter().map(|f| f.path.clone()));
        artifacts.push(archive_path.clone());

        let cleanup = self
            .cleanup
            .schedule_deletion(artifacts.clone(), self.config.retention);
        self.enter(job, JobStage::CleanupScheduled);

        let stats = PipelineStats {
            fetch_time,
            cut_time,
            archive_time,
            total_time: start_time.elapsed(),
            segments: segments.len(),
        };

        Ok(ExtractionOutcome {
            archive_name,
            archive_path,
            files,
            segments,
            artifacts,
            stats,
            cleanup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.audio_format, "mp3");
        assert_eq!(config.retention, Duration::from_secs(60));
    }

    #[test]
    fn test_pipeline_config_from_config() {
        let mut config = Config::default();
        config.retention_secs = 120;
        config.audio_format = "m4a".to_string();

        let pipeline_config = PipelineConfig::from(&config);
        assert_eq!(pipeline_config.retention, Duration::from_secs(120));
        assert_eq!(pipeline_config.audio_format, "m4a");
    }

    #[test]
    fn test_request_json_is_camel_case() {
        let request: ExtractionRequest = serde_json::from_str(
            r#"{"sourceUrl":"https://youtu.be/abc","timestampText":"00:00 Intro"}"#,
        )
        .unwrap();
        assert_eq!(request.source_url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(request.timestamp_text.as_deref(), Some("00:00 Intro"));

        let request: ExtractionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.source_url.is_none());
        assert!(request.timestamp_text.is_none());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(JobStage::Fetching.to_string(), "fetching");
        assert_eq!(
            JobStage::Cutting { current: 2, total: 5 }.to_string(),
            "cutting 2/5"
        );
        assert_eq!(JobStage::CleanupScheduled.to_string(), "cleanup scheduled");
    }
}
