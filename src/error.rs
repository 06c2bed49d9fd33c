use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("busy")]
    Busy,

    #[error("missing source: {0}")]
    Validation(String),

    #[error("Source fetch failed: {0}")]
    SourceFetch(String),

    #[error("Audio cut failed: {0}")]
    Cut(String),

    #[error("Archive failed: {0}")]
    Archive(String),

    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl SplitError {
    /// Busy rejections are the only failures a caller may retry unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SplitError::Busy)
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
