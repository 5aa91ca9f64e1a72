//! The recording lifecycle orchestrator.
//!
//! Owns the engine connection and coordinates everything around it:
//! settings configuration, scene and source construction, audio track
//! allocation, and the signal-synchronized start/stop protocol. All
//! methods take `&mut self`; operations against the engine are serialized
//! by ownership.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::settings::{
    SettingKey, SettingsBridge, DEFAULT_SUBCATEGORY, OUTPUT_CATEGORY, RECORDING_SUBCATEGORY,
    VIDEO_CATEGORY,
};
use crate::engine::signal::{RecordingSignal, SignalChannel};
use crate::engine::{
    EngineBackend, EngineConnection, ItemId, PreviewBounds, SceneId, SourceId, WindowHandle,
};
use crate::error::RecorderError;

use super::audio::TrackTable;
use super::options::{EncoderSelection, RecorderOptions};
use super::preview::PreviewProjector;
use super::resolution::{apply_resolution, ResolutionKind};
use super::video;

/// Hardware encoders first, software fallback last.
const ENCODER_PRIORITY: [&str; 4] = ["jim_nvenc", "amd_amf_h264", "obs_qsv11", "obs_x264"];

const SOFTWARE_ENCODER: &str = "obs_x264";

/// Lifecycle states of the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Uninitialized,
    /// Engine connection is live but no configuration has been applied yet.
    Initialized,
    /// Scene, sources, and tracks reflect the current options.
    Configured,
    Recording,
    /// Terminal: the engine connection has been torn down.
    ShutDown,
}

/// Metadata for a recording in progress.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSession {
    pub started_at: DateTime<Utc>,
}

impl RecordingSession {
    fn begin() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

/// Engine-supported resolution strings, per parameter.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOptions {
    pub base: Vec<String>,
    pub output: Vec<String>,
}

/// The scene graph for the current configuration: one scene holding the
/// single video capture source at unit scale.
struct SceneGraph {
    scene: SceneId,
    item: ItemId,
    video_source: SourceId,
}

/// Drives a native capture/encode engine through its recording lifecycle.
pub struct Recorder {
    engine: Arc<dyn EngineBackend>,
    settings: SettingsBridge,
    data_dir: PathBuf,
    options: RecorderOptions,

    connection: Option<EngineConnection>,
    signals: Option<SignalChannel>,
    scene: Option<SceneGraph>,
    tracks: TrackTable,
    scale_watchdog: Option<JoinHandle<()>>,
    preview: PreviewProjector,
    session: Option<RecordingSession>,
    state: RecorderState,
    scene_rebuilds: u64,
}

impl Recorder {
    /// Create a recorder over an engine binding. Nothing touches the engine
    /// until [`initialize`](Self::initialize).
    pub fn new(engine: Arc<dyn EngineBackend>, data_dir: PathBuf) -> Self {
        let settings = SettingsBridge::new(engine.clone());
        Self {
            engine,
            settings,
            data_dir,
            options: RecorderOptions::default(),
            connection: None,
            signals: None,
            scene: None,
            tracks: TrackTable::new(),
            scale_watchdog: None,
            preview: PreviewProjector::new(),
            session: None,
            state: RecorderState::Uninitialized,
            scene_rebuilds: 0,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn current_session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Open the engine connection, wire the signal channel, and apply the
    /// given options. Calling this on an already-initialized recorder is a
    /// tolerated no-op so redundant caller paths stay harmless.
    pub async fn initialize(&mut self, options: RecorderOptions) -> Result<(), RecorderError> {
        if self.connection.is_some() {
            warn!("recorder already initialized; ignoring repeated initialize call");
            return Ok(());
        }

        let connection = EngineConnection::open(self.engine.clone(), &self.data_dir)?;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        self.engine.set_signal_sender(Some(tx));
        self.signals = Some(SignalChannel::new(rx));
        self.connection = Some(connection);
        self.state = RecorderState::Initialized;

        self.reconfigure(Some(options)).await
    }

    /// Re-run engine settings configuration, scene/source rebuild, and
    /// track allocation. Safe to call any number of times; everything the
    /// previous configuration allocated is released before reassignment.
    pub async fn reconfigure(
        &mut self,
        options: Option<RecorderOptions>,
    ) -> Result<(), RecorderError> {
        if self.connection.is_none() {
            return Err(RecorderError::NotInitialized);
        }
        if let Some(options) = options {
            self.options = options;
        }

        info!(
            mode = %self.options.capture_mode,
            resolution = %self.options.output_resolution,
            "configuring recorder"
        );

        self.configure_engine()?;
        self.rebuild_scene()?;
        self.tracks.clear(self.engine.as_ref(), &self.settings)?;
        self.tracks
            .allocate(self.engine.as_ref(), &self.settings, &self.options)?;

        self.state = RecorderState::Configured;
        Ok(())
    }

    /// Issue the start command and wait for the engine to confirm.
    ///
    /// On timeout or a mismatched signal the recorder is not recording;
    /// the failure is terminal for this call but a fresh `start` may be
    /// attempted.
    pub async fn start(&mut self) -> Result<(), RecorderError> {
        if self.connection.is_none() {
            return Err(RecorderError::NotInitialized);
        }
        let signals = self.signals.as_mut().ok_or(RecorderError::NotInitialized)?;

        info!("starting recording");
        self.engine.start_recording()?;
        signals.wait_for(RecordingSignal::Start).await?;

        self.session = Some(RecordingSession::begin());
        self.state = RecorderState::Recording;
        info!("recording started");
        Ok(())
    }

    /// Issue the stop command and wait out the engine's stop sequence:
    /// `stopping`, `stop`, `wrote`, strictly in that order, each within its
    /// own wait window.
    pub async fn stop(&mut self) -> Result<(), RecorderError> {
        if self.connection.is_none() {
            return Err(RecorderError::NotInitialized);
        }
        let signals = self.signals.as_mut().ok_or(RecorderError::NotInitialized)?;

        info!("stopping recording");
        self.engine.stop_recording()?;
        signals.wait_for(RecordingSignal::Stopping).await?;
        signals.wait_for(RecordingSignal::Stop).await?;
        signals.wait_for(RecordingSignal::Wrote).await?;

        if let Some(session) = self.session.take() {
            let elapsed = Utc::now() - session.started_at;
            info!(
                seconds = elapsed.num_seconds(),
                path = ?self.engine.last_recording_path(),
                "recording stopped"
            );
        }
        self.state = RecorderState::Configured;
        Ok(())
    }

    /// Tear down the engine connection.
    ///
    /// Returns `false` (without error) when there is nothing to shut down.
    /// A failure from the native disconnect is re-raised as
    /// [`RecorderError::ShutdownFailure`].
    pub fn shutdown(&mut self) -> Result<bool, RecorderError> {
        let Some(connection) = self.connection.take() else {
            debug!("shutdown requested but recorder is not initialized");
            return Ok(false);
        };

        info!("shutting down recorder");
        if let Some(watchdog) = self.scale_watchdog.take() {
            watchdog.abort();
        }
        self.engine.set_signal_sender(None);
        self.signals = None;
        self.scene = None;
        self.session = None;
        self.state = RecorderState::ShutDown;

        connection.close()?;
        Ok(true)
    }

    /// Engine-supported resolution strings for the base and output
    /// parameters.
    pub fn available_resolutions(&self) -> Result<ResolutionOptions, RecorderError> {
        if self.connection.is_none() {
            return Err(RecorderError::NotInitialized);
        }
        Ok(ResolutionOptions {
            base: self.settings.available_strings(
                VIDEO_CATEGORY,
                DEFAULT_SUBCATEGORY,
                ResolutionKind::Base.parameter(),
            ),
            output: self.settings.available_strings(
                VIDEO_CATEGORY,
                DEFAULT_SUBCATEGORY,
                ResolutionKind::Output.parameter(),
            ),
        })
    }

    /// Encoder ids the engine advertises.
    pub fn available_encoders(&self) -> Result<Vec<String>, RecorderError> {
        if self.connection.is_none() {
            return Err(RecorderError::NotInitialized);
        }
        Ok(self
            .settings
            .available_strings(OUTPUT_CATEGORY, RECORDING_SUBCATEGORY, "RecEncoder"))
    }

    /// Path of the most recently written recording, if the engine has one.
    pub fn last_recording_path(&self) -> Result<Option<PathBuf>, RecorderError> {
        if self.connection.is_none() {
            return Err(RecorderError::NotInitialized);
        }
        Ok(self.engine.last_recording_path())
    }

    /// Attach the engine's preview surface to a region of a host window.
    pub fn setup_preview(
        &mut self,
        parent: WindowHandle,
        bounds: PreviewBounds,
    ) -> Result<(), RecorderError> {
        if self.connection.is_none() {
            return Err(RecorderError::NotInitialized);
        }
        self.preview.attach(self.engine.as_ref(), parent, bounds)?;
        Ok(())
    }

    /// Keep the preview surface sized to its host region.
    pub fn resize_preview(&mut self, bounds: PreviewBounds) -> Result<(), RecorderError> {
        if self.connection.is_none() {
            return Err(RecorderError::NotInitialized);
        }
        self.preview.resize(self.engine.as_ref(), bounds)?;
        Ok(())
    }

    /// Push the option-derived engine settings through the bridge. Writes
    /// are idempotent at the bridge level, so repeating this on every
    /// reconfigure costs nothing when values are unchanged.
    fn configure_engine(&self) -> Result<(), RecorderError> {
        let encoder = self.resolve_encoder();
        debug!(%encoder, "applying engine settings");

        self.settings.set(SettingKey::OutputMode, json!("Advanced"))?;
        self.settings.set(SettingKey::RecordingEncoder, json!(encoder))?;
        self.settings.set(
            SettingKey::RecordingPath,
            json!(self.options.buffer_directory.to_string_lossy()),
        )?;
        self.settings.set(SettingKey::RecordingFormat, json!("mp4"))?;
        self.settings
            .set(SettingKey::VideoBitrate, json!(self.options.video_bitrate))?;
        self.settings.set(SettingKey::FpsCommon, json!(self.options.fps))?;
        Ok(())
    }

    /// Release the previous scene graph and build a fresh one for the
    /// current options, then restart the scale watchdog over the new item.
    fn rebuild_scene(&mut self) -> Result<(), RecorderError> {
        if let Some(watchdog) = self.scale_watchdog.take() {
            watchdog.abort();
        }
        if let Some(graph) = self.scene.take() {
            debug!("releasing previous scene graph");
            self.engine.release_scene(graph.scene);
            self.engine.release_source(graph.video_source);
        }

        let (source, base) = video::build_capture_source(self.engine.as_ref(), &self.options)?;

        apply_resolution(&self.settings, self.options.output_resolution, ResolutionKind::Output)?;
        apply_resolution(&self.settings, base, ResolutionKind::Base)?;

        self.scene_rebuilds += 1;
        let scene_name = format!("capture-scene-{}", self.scene_rebuilds);
        let scene = self.engine.create_scene(&scene_name)?;
        let item = self.engine.add_scene_item(scene, source)?;
        self.engine.set_item_scale(item, 1.0, 1.0);
        self.engine.set_scene_to_output(scene)?;

        self.scale_watchdog = Some(video::spawn_scale_watchdog(
            self.engine.clone(),
            source,
            item,
            base,
        ));
        self.scene = Some(SceneGraph {
            scene,
            item,
            video_source: source,
        });
        Ok(())
    }

    fn resolve_encoder(&self) -> String {
        let available = self
            .settings
            .available_strings(OUTPUT_CATEGORY, RECORDING_SUBCATEGORY, "RecEncoder");

        match &self.options.encoder {
            EncoderSelection::Named(name) => {
                if !available.iter().any(|e| e == name) {
                    warn!(
                        encoder = %name,
                        "configured encoder not advertised by engine; using it anyway"
                    );
                }
                name.clone()
            }
            EncoderSelection::Auto => ENCODER_PRIORITY
                .iter()
                .find(|candidate| available.iter().any(|e| e == *candidate))
                .map(|candidate| candidate.to_string())
                .or_else(|| available.first().cloned())
                .unwrap_or_else(|| {
                    warn!("engine advertised no encoders; falling back to software encoder");
                    SOFTWARE_ENCODER.to_string()
                }),
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(watchdog) = self.scale_watchdog.take() {
            watchdog.abort();
        }
    }
}
