use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by `FramebufferRenderer::init`
///
/// These are fatal to the caller; nothing retries automatically.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("graphics context unavailable: {0}")]
    Context(String),

    #[error("display surface unavailable: {0}")]
    Display(String),

    #[error("renderer is already initialized")]
    AlreadyInitialized,
}

/// Failures while loading a `PresentConfig`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnv { name: String, value: String },
}
