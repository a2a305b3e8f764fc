use thiserror::Error;

/// Engine-level errors. Only `Config` is fatal; everything else in the
/// system resolves to a fallback action or a structured rejection decision,
/// so the coordinator itself never returns an error.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}
