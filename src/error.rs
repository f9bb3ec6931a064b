use std::io;

/// All error types for the auto-lod crate.
///
/// The selection and simplification engines themselves never fail; errors
/// exist at the configuration and I/O rim of the crate.
#[derive(thiserror::Error, Debug)]
pub enum AutoLodError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Stats serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AutoLodError>;
