//! Error types for mirrorkit_cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that end the process with a non-zero status
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Startup validation or pass error from the engine
    #[error(transparent)]
    Sync(#[from] mirrorkit_sync::SyncTreeError),

    /// Logging could not be installed at all
    #[error(transparent)]
    Logging(#[from] mirrorkit_log::LoggingError),
}
