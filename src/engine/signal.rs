//! Output-signal channel from the native engine.
//!
//! The engine reports recording lifecycle transitions asynchronously through
//! a callback. The orchestrator drains them from an unbounded FIFO with a
//! bounded wait: each expected signal is raced against a fixed timer, and a
//! timeout or a mismatched signal fails the waiting call outright. There is
//! no retry; out-of-order arrival indicates an engine-level fault rather
//! than a transient condition.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::RecorderError;

/// Signal type emitted for recording lifecycle events.
pub const RECORDING_SIGNAL_SOURCE: &str = "recording";

/// How long to wait for each expected signal.
pub const SIGNAL_TIMEOUT: Duration = Duration::from_secs(5);

/// A raw signal record pushed by the engine callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSignal {
    /// Which engine subsystem emitted the signal, e.g. `"recording"`.
    pub source: String,
    /// The lifecycle event, e.g. `"start"` or `"wrote"`.
    pub value: String,
}

impl EngineSignal {
    /// A signal on the recording channel.
    pub fn recording(value: impl Into<String>) -> Self {
        Self {
            source: RECORDING_SIGNAL_SOURCE.to_string(),
            value: value.into(),
        }
    }
}

/// Recording lifecycle signals, in the order the engine emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingSignal {
    Start,
    Stopping,
    Stop,
    Wrote,
}

impl RecordingSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordingSignal::Start => "start",
            RecordingSignal::Stopping => "stopping",
            RecordingSignal::Stop => "stop",
            RecordingSignal::Wrote => "wrote",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(RecordingSignal::Start),
            "stopping" => Some(RecordingSignal::Stopping),
            "stop" => Some(RecordingSignal::Stop),
            "wrote" => Some(RecordingSignal::Wrote),
            _ => None,
        }
    }
}

/// Consumer half of the engine's output-signal FIFO.
pub struct SignalChannel {
    rx: UnboundedReceiver<EngineSignal>,
}

impl SignalChannel {
    pub fn new(rx: UnboundedReceiver<EngineSignal>) -> Self {
        Self { rx }
    }

    /// Wait for one specific recording signal.
    ///
    /// Races the next queue item against [`SIGNAL_TIMEOUT`]. Exactly one of
    /// the two wins; the loser is abandoned. Any failure is terminal for the
    /// caller's current operation.
    pub async fn wait_for(&mut self, expected: RecordingSignal) -> Result<(), RecorderError> {
        let received = match timeout(SIGNAL_TIMEOUT, self.rx.recv()).await {
            Ok(Some(signal)) => signal,
            Ok(None) => {
                // Sender detached while waiting; the wait can never complete.
                warn!(
                    expected = expected.as_str(),
                    "signal channel closed while waiting"
                );
                return Err(RecorderError::SignalTimeout(expected));
            }
            Err(_) => return Err(RecorderError::SignalTimeout(expected)),
        };

        if received.source != RECORDING_SIGNAL_SOURCE {
            return Err(RecorderError::UnexpectedSignalType(received.source));
        }

        match RecordingSignal::parse(&received.value) {
            Some(signal) if signal == expected => {
                debug!(signal = expected.as_str(), "recording signal received");
                Ok(())
            }
            _ => Err(RecorderError::UnexpectedSignalValue {
                expected,
                got: received.value,
            }),
        }
    }
}
