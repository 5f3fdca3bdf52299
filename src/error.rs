// src/error.rs
//
// Error types for the fallible edges of the crate.
//
// The per-frame gesture path never returns these to its caller; they
// surface only from configuration loading, backend voice creation and
// the staged initializer.

use thiserror::Error;

use crate::init::InitStage;

/// Errors while loading or validating an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Smoothing factor outside (0, 1]
    #[error("smoothing factor must be in (0, 1], got {0}")]
    InvalidSmoothing(f32),

    /// Scale has no notes
    #[error("scale must contain at least one note")]
    EmptyScale,

    /// Scale notes must strictly ascend
    #[error("scale must be strictly ascending, {prev} is followed by {next}")]
    UnsortedScale { prev: u8, next: u8 },

    /// Tempo is zero, negative or not finite
    #[error("tempo must be a positive number of BPM, got {0}")]
    InvalidTempo(f64),

    /// Sample rate is zero, negative or not finite
    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(f64),

    /// Preset bank is empty
    #[error("at least one synth preset is required")]
    NoPresets,
}

/// Errors reported by a [`SynthBackend`](crate::backend::SynthBackend).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The audio context has not been unlocked yet
    #[error("audio engine not ready")]
    NotReady,

    /// The engine refused to allocate the voice
    #[error("voice rejected: {0}")]
    Rejected(String),
}

/// Errors raised by the staged initializer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitError {
    /// A stage reported failure
    #[error("initialization failed at {stage:?}: {reason}")]
    StageFailed { stage: InitStage, reason: String },

    /// A stage was completed out of order
    #[error("expected stage {expected:?}, got {got:?}")]
    OutOfOrder { expected: InitStage, got: InitStage },

    /// The initializer already failed and cannot continue
    #[error("initializer halted after failure at {0:?}")]
    Halted(InitStage),

    /// All stages are already complete
    #[error("initialization already complete")]
    AlreadyReady,
}

/// Errors from a [`HandDetector`](crate::detector::HandDetector).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    /// The detector model is not loaded
    #[error("hand detector unavailable")]
    Unavailable,

    /// A landmark buffer had the wrong shape
    #[error("malformed landmark buffer: {0}")]
    Malformed(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for backend voice operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Result type for initializer operations
pub type InitResult<T> = Result<T, InitError>;
