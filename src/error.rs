//! Error types for the recording orchestrator.

use thiserror::Error;

use crate::engine::signal::RecordingSignal;
use crate::engine::EngineError;

/// Errors surfaced by the recorder and its components.
///
/// Configuration and resource errors (`DisplayNotFound`, `InvalidCaptureMode`,
/// `NoResolutionsAvailable`) are fatal to the `reconfigure` call that raised
/// them. Signal-protocol errors are fatal to the `start`/`stop` call in
/// progress; the recorder stays usable and a fresh attempt may be made.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The native engine's init call returned a non-zero code.
    #[error("engine initialization failed: {reason}")]
    EngineInitFailure { code: i32, reason: String },

    /// An operation required a live engine connection that does not exist.
    #[error("recorder is not initialized")]
    NotInitialized,

    /// The configured display index does not resolve to a physical display.
    #[error("display {0} not found")]
    DisplayNotFound(usize),

    /// A capture mode string did not name a known mode.
    #[error("invalid capture mode {0:?}")]
    InvalidCaptureMode(String),

    /// The engine offered no candidate resolutions to match against.
    #[error("engine offered no candidate resolutions")]
    NoResolutionsAvailable,

    /// No signal arrived within the wait window.
    #[error("timed out waiting for recording signal {0:?}")]
    SignalTimeout(RecordingSignal),

    /// A signal arrived whose type was not the recording channel.
    #[error("unexpected signal type {0:?}")]
    UnexpectedSignalType(String),

    /// A recording signal arrived out of order.
    #[error("unexpected signal value {got:?} while waiting for {expected:?}")]
    UnexpectedSignalValue {
        expected: RecordingSignal,
        got: String,
    },

    /// The native disconnect call failed during shutdown.
    #[error("engine disconnect failed: {0}")]
    ShutdownFailure(#[source] EngineError),

    /// A native engine call failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
