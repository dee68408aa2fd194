//! Error handling for PaintKit
//!
//! Provides error types for every layer of the toolpath engine:
//! - Geometry errors (degenerate input, path data parsing, offsetting)
//! - Configuration errors (unknown fill types, invalid ranges, palettes)
//! - Job errors (scheduler and runner state machine violations)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised when a geometry operation cannot produce a usable result.
/// Most degenerate geometry is silently dropped instead; this type is
/// reserved for input that cannot be interpreted at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Path has no usable points
    #[error("Degenerate geometry: {reason}")]
    Degenerate {
        /// Why the geometry was rejected.
        reason: String,
    },

    /// SVG path data could not be parsed
    #[error("Invalid path data at segment {position}: {reason}")]
    PathData {
        /// Index of the segment that failed to parse.
        position: usize,
        /// The reason parsing failed.
        reason: String,
    },

    /// Offset engine failed on otherwise valid input
    #[error("Offset failed: {reason}")]
    Offset {
        /// The reason the offset failed.
        reason: String,
    },
}

/// Configuration error type
///
/// Represents settings that cannot be applied. Most are logged and the
/// affected operation skipped rather than failing a whole job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Fill type string is not one of the known algorithms
    #[error("Unknown fill type: {0}")]
    UnknownFillType(String),

    /// Travel algorithm string is not recognised
    #[error("Unknown travel algorithm: {0}")]
    UnknownTravelAlgorithm(String),

    /// A numeric setting is outside its valid range
    #[error("Setting '{name}' out of range: {value} (must be {requirement})")]
    OutOfRange {
        /// The setting name.
        name: String,
        /// The rejected value.
        value: f64,
        /// Human readable requirement.
        requirement: String,
    },

    /// Palette is empty or has an unusable entry
    #[error("Malformed palette: {0}")]
    MalformedPalette(String),

    /// A color string could not be parsed
    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    /// Config file extension is neither json nor toml
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Job error type
///
/// Represents misuse of the job runner and scheduler lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// A job is already in progress
    #[error("A job is already running (state: {state})")]
    AlreadyRunning {
        /// The state the runner is in.
        state: String,
    },

    /// Invalid state transition
    #[error("Invalid state transition from {current} to {requested}")]
    InvalidStateTransition {
        /// The current state name.
        current: String,
        /// The requested state name.
        requested: String,
    },

    /// The job has nothing to plot
    #[error("Job has no plottable paths")]
    Empty,
}

/// Main error type for PaintKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Job lifecycle error
    #[error(transparent)]
    Job(#[from] JobError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this is a job lifecycle error
    pub fn is_job_error(&self) -> bool {
        matches!(self, Error::Job(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
