use thiserror::Error;

/// Errors surfaced to Kotlin/Swift as exceptions.
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum FfiError {
    #[error("Invalid prompt config: {0}")]
    InvalidConfig(String),
    #[error("Failed to start the bioauth runtime: {0}")]
    Runtime(String),
}

impl FfiError {
    pub(crate) fn invalid_config(err: anyhow::Error) -> Self {
        Self::InvalidConfig(format!("{err:#}"))
    }
}
