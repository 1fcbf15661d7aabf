//! Error types for the cadence-engine binary.

use cadence_core::{ConfigError, TickError, ValidationError};

/// Errors that can occur during engine startup or the tick loop.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The world document failed publish-time validation.
    #[error("world validation error: {source}")]
    Validation {
        /// The underlying validation error.
        #[from]
        source: ValidationError,
    },

    /// A tick failed to set up.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// A world content file could not be read.
    #[error("failed to read world file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A world content file could not be parsed.
    #[error("failed to parse world YAML: {source}")]
    WorldYaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },
}
