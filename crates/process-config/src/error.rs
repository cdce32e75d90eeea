//! Error types for configuration resolution.

use thiserror::Error;
use tile_common::GridError;

/// Errors raised while building or querying a configuration.
///
/// Every error aborts construction; nothing is retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A mandatory field is missing or has the wrong type.
    #[error("schema error: {0}")]
    Schema(String),

    /// The process file is missing or unreadable.
    #[error("process file error: {0}")]
    ProcessFile(String),

    /// Invalid grid, metatiling or pixelbuffer relationship.
    #[error("pyramid error: {0}")]
    Pyramid(String),

    /// Invalid zoom levels or a zoom outside the initialized range.
    #[error("zoom range error: {0}")]
    ZoomRange(String),

    /// Malformed bounds tuple.
    #[error("bounds error: {0}")]
    Bounds(String),

    /// A zoom-conditional key whose operand cannot be parsed.
    #[error("zoom expression error: {0}")]
    ZoomExpression(String),

    /// An input or output driver failed.
    #[error("driver error for {declaration}: {source}")]
    Driver {
        declaration: String,
        #[source]
        source: DriverError,
    },

    /// Unknown processing mode.
    #[error("unknown mode '{0}': must be one of memory, readonly, continue, overwrite")]
    Mode(String),

    /// Operation that a configuration does not support.
    #[error("{0} is not supported")]
    Unsupported(String),
}

impl ConfigError {
    /// Create a Schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a ProcessFile error.
    pub fn process_file(msg: impl Into<String>) -> Self {
        Self::ProcessFile(msg.into())
    }

    /// Create a Pyramid error.
    pub fn pyramid(msg: impl Into<String>) -> Self {
        Self::Pyramid(msg.into())
    }

    /// Create a ZoomRange error.
    pub fn zoom_range(msg: impl Into<String>) -> Self {
        Self::ZoomRange(msg.into())
    }

    /// Create a Bounds error.
    pub fn bounds(msg: impl Into<String>) -> Self {
        Self::Bounds(msg.into())
    }

    /// Create a ZoomExpression error.
    pub fn zoom_expression(msg: impl Into<String>) -> Self {
        Self::ZoomExpression(msg.into())
    }

    /// Wrap a driver failure together with what was being loaded.
    pub fn driver(declaration: impl Into<String>, source: DriverError) -> Self {
        Self::Driver {
            declaration: declaration.into(),
            source,
        }
    }
}

impl From<GridError> for ConfigError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::InvalidBounds(msg) => Self::Bounds(msg),
            other => Self::Pyramid(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Schema(format!("IO error: {}", err))
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Schema(format!("YAML error: {}", err))
    }
}

/// Errors reported by input readers and output writers.
#[derive(Error, Debug)]
pub enum DriverError {
    /// No registered driver handles the declaration.
    #[error("no driver available for {0}")]
    NoDriver(String),

    /// The source could not be opened.
    #[error("failed to open {path}: {message}")]
    Open { path: String, message: String },

    /// The source was opened but its content is unusable.
    #[error("invalid data in {path}: {message}")]
    InvalidData { path: String, message: String },

    /// The driver rejects the output configuration.
    #[error("incompatible configuration: {0}")]
    Incompatible(String),

    /// Any other driver specific failure.
    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// Create an Open error.
    pub fn open(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidData error.
    pub fn invalid_data(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidData {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an Incompatible error.
    pub fn incompatible(msg: impl Into<String>) -> Self {
        Self::Incompatible(msg.into())
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
