pub mod archive;
pub mod audio;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod process;
pub mod sanitize;
pub mod segment;
pub mod server;
pub mod source;

pub use config::Config;
pub use error::{Result, SplitError};
pub use pipeline::{
    ExtractionOutcome, ExtractionPipeline, ExtractionRequest, JobStage, PipelineConfig,
    PipelineStats,
};
