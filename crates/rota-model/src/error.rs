use thiserror::Error;

/// Error taxonomy for the pipeline.
///
/// `Config` is fatal at construction time and never raised mid-run.
/// `Source`/`Sink`/`Store` wrap external collaborator failures and are
/// fatal for the run that hits them; the orchestrator decides per call
/// whether to continue or abort. Per-row cleaning problems are not
/// errors at this level; they become [`crate::RowAnnotation`] values.
#[derive(Debug, Error)]
pub enum RotaError {
    #[error("config error: {0}")]
    Config(String),
    #[error("source error: {0}")]
    Source(String),
    #[error("sink error: {0}")]
    Sink(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RotaError>;
