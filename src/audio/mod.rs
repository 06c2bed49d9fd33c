pub mod cut;

pub use cut::FfmpegCutter;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::segment::TimeOffset;

/// Extracts a time range of a local audio file into a new file.
#[async_trait]
pub trait AudioCutter: Send + Sync {
    /// Copy `[start, end)` of `source` into `destination` without re-encoding.
    async fn cut(
        &self,
        source: &Path,
        start: &TimeOffset,
        end: &TimeOffset,
        destination: &Path,
    ) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// An output file produced by one job, named as it appears to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub name: String,
    pub path: PathBuf,
}

impl ExtractedFile {
    /// A file called `name` inside `dir`.
    pub fn in_dir(dir: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: dir.join(&name),
            name,
        }
    }
}
