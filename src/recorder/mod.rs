//! Recording orchestration.
//!
//! The [`Recorder`] drives the native engine through its lifecycle:
//! initialize, reconfigure (settings, scene, sources, audio tracks),
//! signal-synchronized start/stop, and shutdown. The submodules hold the
//! pieces it coordinates.

mod audio;
mod options;
mod orchestrator;
mod preview;
mod resolution;
mod video;

pub use options::{
    AudioDeviceSelect, CaptureMode, EncoderSelection, RecorderOptions, WindowSpec,
};
pub use orchestrator::{Recorder, RecorderState, RecordingSession, ResolutionOptions};
pub use resolution::{closest_resolution, InvalidResolution, Resolution};
