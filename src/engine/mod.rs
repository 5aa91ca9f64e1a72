//! Abstract interface to the native capture/encode engine.
//!
//! The engine owns actual pixel capture, audio mixing, and file encoding;
//! this crate only drives it. Everything the orchestrator needs from the
//! engine is expressed through the [`EngineBackend`] trait: a host/init
//! handshake, the settings tree, scene/source/track factories, the
//! start/stop command pair, and the asynchronous output-signal callback.
//!
//! Handles returned by the engine (`SourceId`, `SceneId`, `ItemId`) are
//! opaque; releasing a handle the engine no longer knows about is a no-op
//! on the engine side.

pub mod settings;
pub mod signal;

#[cfg(test)]
pub(crate) mod mock;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::RecorderError;
use settings::SettingsCategory;
use signal::EngineSignal;

/// Locale handed to the engine's init call.
pub const ENGINE_LOCALE: &str = "en-US";

/// Prefix for the per-process engine channel identifier.
const CHANNEL_PREFIX: &str = "gamerec";

/// A failure reported by the native engine binding.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Opaque handle to an engine source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

/// Opaque handle to an engine scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub u64);

/// Opaque handle to a scene item (one source placed in one scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u64);

/// Native window handle a preview surface can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHandle(pub u64);

/// Pixel bounds of a preview surface within its host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Direction of an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioDirection {
    Input,
    Output,
}

/// The source kinds this orchestrator creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    DisplayCapture,
    WindowCapture,
    AudioInputCapture,
    AudioOutputCapture,
}

/// A physical display as enumerated by the engine.
#[derive(Debug, Clone)]
pub struct DisplayInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// An audio device as enumerated by the engine.
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub id: String,
    pub name: String,
}

/// The narrow surface the orchestrator consumes from the native engine.
///
/// Implementations use interior mutability; all methods take `&self` so the
/// orchestrator and its background tasks can share one handle behind an
/// `Arc`. Enumeration calls are synchronous and side-effect-free.
pub trait EngineBackend: Send + Sync {
    /// Open the IPC channel to the engine host process.
    fn host(&self, channel: &str) -> Result<(), EngineError>;

    /// Initialize the engine. Returns the engine's raw init code; zero is
    /// success.
    fn init(&self, locale: &str, data_path: &Path, version: &str) -> Result<i32, EngineError>;

    /// Tear down the engine connection.
    fn disconnect(&self) -> Result<(), EngineError>;

    /// Attach (or with `None`, detach) the sink for asynchronous output
    /// signals.
    fn set_signal_sender(&self, sender: Option<UnboundedSender<EngineSignal>>);

    /// Read the full settings tree for one category, if the engine knows it.
    fn get_category(&self, category: &str) -> Option<SettingsCategory>;

    /// Write back a whole settings category.
    fn set_category(&self, category: &str, data: SettingsCategory) -> Result<(), EngineError>;

    fn list_displays(&self) -> Vec<DisplayInfo>;
    fn list_audio_devices(&self, direction: AudioDirection) -> Vec<AudioDeviceInfo>;

    fn create_source(
        &self,
        kind: SourceKind,
        name: &str,
        settings: serde_json::Value,
    ) -> Result<SourceId, EngineError>;
    fn release_source(&self, source: SourceId);

    /// Reported pixel dimensions of a source; `(0, 0)` until the capture
    /// has produced a frame.
    fn source_dimensions(&self, source: SourceId) -> (u32, u32);
    fn set_source_muted(&self, source: SourceId, muted: bool);
    fn set_source_track_mask(&self, source: SourceId, mask: u64);

    fn create_scene(&self, name: &str) -> Result<SceneId, EngineError>;
    fn release_scene(&self, scene: SceneId);
    fn add_scene_item(&self, scene: SceneId, source: SourceId) -> Result<ItemId, EngineError>;
    fn set_item_scale(&self, item: ItemId, x: f32, y: f32);

    /// Route a scene to the mixed output (track slot 1).
    fn set_scene_to_output(&self, scene: SceneId) -> Result<(), EngineError>;

    /// Assign (or with `None`, clear) the audio source feeding a track slot.
    fn set_output_source(&self, slot: usize, source: Option<SourceId>);
    fn set_track_name(&self, slot: usize, name: &str);

    /// Issue the start command. Completion is reported via signals.
    fn start_recording(&self) -> Result<(), EngineError>;

    /// Issue the stop command. Completion is reported via signals.
    fn stop_recording(&self) -> Result<(), EngineError>;

    fn last_recording_path(&self) -> Option<PathBuf>;

    fn attach_preview(
        &self,
        parent: WindowHandle,
        bounds: PreviewBounds,
    ) -> Result<(), EngineError>;
    fn move_preview(&self, bounds: PreviewBounds) -> Result<(), EngineError>;
}

/// A live connection to the native engine.
///
/// At most one connection should be live per process; the orchestrator
/// enforces this by treating a repeated `initialize` as a logged no-op.
pub struct EngineConnection {
    engine: Arc<dyn EngineBackend>,
    channel_id: String,
}

impl EngineConnection {
    /// Host the engine channel and run its init handshake.
    pub fn open(engine: Arc<dyn EngineBackend>, data_dir: &Path) -> Result<Self, RecorderError> {
        let channel_id = format!("{CHANNEL_PREFIX}-{}", Uuid::new_v4());

        info!(channel = %channel_id, "connecting to capture engine");
        engine.host(&channel_id)?;

        let code = engine.init(ENGINE_LOCALE, data_dir, env!("CARGO_PKG_VERSION"))?;
        if code != 0 {
            let reason = describe_init_code(code);
            error!(code, "engine initialization failed: {reason}");
            return Err(RecorderError::EngineInitFailure { code, reason });
        }

        info!("capture engine connected");
        Ok(Self { engine, channel_id })
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Disconnect from the engine, consuming the connection.
    pub fn close(self) -> Result<(), RecorderError> {
        self.engine
            .disconnect()
            .map_err(RecorderError::ShutdownFailure)
    }
}

fn describe_init_code(code: i32) -> String {
    match code {
        -2 => "the DirectX runtime could not be found on this system".to_string(),
        -5 => "the engine is in an error state, or the video drivers are out of date".to_string(),
        other => format!("unknown error #{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_init_code_known_codes() {
        assert!(describe_init_code(-2).contains("DirectX"));
        assert!(describe_init_code(-5).contains("drivers"));
    }

    #[test]
    fn test_describe_init_code_unknown_code() {
        assert_eq!(describe_init_code(-77), "unknown error #-77");
    }
}
