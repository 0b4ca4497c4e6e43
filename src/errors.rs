//! Typed error hierarchy for the lingo run pipeline.
//!
//! - `ValidationError`: CLI flags rejected before any phase runs
//! - `RunError`: everything the orchestrator's single failure boundary can see
//! - `PlaybackError`: audio notification failures (always swallowed)

use thiserror::Error;

/// A run flag failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid locale code '{value}' for --{flag}")]
    InvalidLocale { flag: &'static str, value: String },

    #[error("--{flag} requires a non-empty value")]
    EmptyValue { flag: &'static str },

    #[error("Invalid glob pattern '{value}' for --{flag}: {message}")]
    InvalidPattern {
        flag: &'static str,
        value: String,
        message: String,
    },

    #[error("--{flag} must be a positive integer, got '{value}'")]
    NotPositiveInteger { flag: &'static str, value: String },
}

/// The pipeline stage a failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Setup,
    Plan,
    Execute,
    Watch,
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseKind::Setup => write!(f, "setup"),
            PhaseKind::Plan => write!(f, "plan"),
            PhaseKind::Execute => write!(f, "execute"),
            PhaseKind::Watch => write!(f, "watch"),
        }
    }
}

/// Errors caught by the orchestrator's failure boundary.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Debug confirmation failed: {0}")]
    Gate(#[source] anyhow::Error),

    #[error("{phase} phase failed: {source:#}")]
    Phase {
        phase: PhaseKind,
        #[source]
        source: anyhow::Error,
    },
}

impl RunError {
    pub fn phase(phase: PhaseKind, source: anyhow::Error) -> Self {
        RunError::Phase { phase, source }
    }
}

/// A single playback strategy did not produce sound.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code:?}")]
    NonZeroExit { program: String, code: Option<i32> },

    #[error("No playback strategy available")]
    NoStrategy,
}
