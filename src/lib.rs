//! gamerec - recording orchestrator for a native audio/video capture engine.
//!
//! The engine (an external process reached through an IPC binding) owns
//! pixel capture, audio mixing, and file encoding; this crate drives it:
//! it negotiates resolutions against the engine's supported set, builds the
//! scene/source graph (one video capture source plus one audio source per
//! enumerated device), allocates the 64-slot output track table, and
//! synchronizes start/stop against the engine's asynchronous signal
//! protocol under timeout.
//!
//! The engine binding is injected as an [`engine::EngineBackend`]
//! implementation, so the orchestration logic is testable without a native
//! engine present.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod recorder;

pub use config::Config;
pub use engine::{
    AudioDeviceInfo, AudioDirection, DisplayInfo, EngineBackend, EngineConnection, EngineError,
    ItemId, PreviewBounds, SceneId, SourceId, SourceKind, WindowHandle,
};
pub use error::RecorderError;
pub use recorder::{
    AudioDeviceSelect, CaptureMode, EncoderSelection, Recorder, RecorderOptions, RecorderState,
    RecordingSession, Resolution, ResolutionOptions, WindowSpec,
};
