use crate::ai::response::ExtractionError;
use crate::ai::AIError;
use crate::project::FsError;
use thiserror::Error;

/// Everything that can abort a generation. Each variant names the stage it came from.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Upstream error: {0}")]
    Upstream(#[from] AIError),
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FsError),
}
