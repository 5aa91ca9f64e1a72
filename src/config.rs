//! On-disk configuration for the recorder.
//!
//! The config file stores raw strings; [`Config::recorder_options`] is the
//! validation boundary where they become typed [`RecorderOptions`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::recorder::{
    AudioDeviceSelect, CaptureMode, EncoderSelection, RecorderOptions, Resolution, WindowSpec,
};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Recording configuration.
    #[serde(default)]
    pub recording: RecordingSettings,

    /// Path to config file (not serialized).
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// `"display_capture"` or `"window_capture"`.
    #[serde(default = "default_capture_mode")]
    pub capture_mode: String,

    /// 1-based display index for display capture.
    #[serde(default = "default_display_index")]
    pub display_index: usize,

    /// Output resolution as `"WxH"`.
    #[serde(default = "default_output_resolution")]
    pub output_resolution: String,

    /// Video bitrate in Kbps.
    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Engine encoder id, or `"auto"`.
    #[serde(default = "default_encoder")]
    pub encoder: String,

    /// Directory the engine writes recording buffers into.
    #[serde(default = "default_buffer_directory")]
    pub buffer_directory: PathBuf,

    /// Audio input device id, `"all"`, or `"none"`.
    #[serde(default = "default_audio_device")]
    pub audio_input_device: String,

    /// Audio output device id, `"all"`, or `"none"`.
    #[serde(default = "default_audio_device")]
    pub audio_output_device: String,

    /// Target window for window capture.
    #[serde(default)]
    pub window_title: String,
    #[serde(default)]
    pub window_class: String,
    #[serde(default)]
    pub window_process: String,
}

fn default_capture_mode() -> String {
    "display_capture".to_string()
}

fn default_display_index() -> usize {
    1
}

fn default_output_resolution() -> String {
    "1920x1080".to_string()
}

fn default_video_bitrate() -> u32 {
    5000
}

fn default_fps() -> u32 {
    60
}

fn default_encoder() -> String {
    "auto".to_string()
}

fn default_buffer_directory() -> PathBuf {
    std::env::temp_dir().join("gamerec-recordings")
}

fn default_audio_device() -> String {
    "all".to_string()
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            capture_mode: default_capture_mode(),
            display_index: default_display_index(),
            output_resolution: default_output_resolution(),
            video_bitrate: default_video_bitrate(),
            fps: default_fps(),
            encoder: default_encoder(),
            buffer_directory: default_buffer_directory(),
            audio_input_device: default_audio_device(),
            audio_output_device: default_audio_device(),
            window_title: String::new(),
            window_class: String::new(),
            window_process: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recording: RecordingSettings::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating a default
    /// file on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_config_path()?)
    }

    /// Load configuration from a specific path, creating a default file if
    /// it does not exist.
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path);
            Ok(config)
        } else {
            let mut config = Config::default();
            config.config_path = Some(config_path);
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let config_path = match &self.config_path {
            Some(path) => path.clone(),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_config_path(),
        }
    }

    fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("dev", "gamerec", "gamerec")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Validate the raw settings into typed recorder options.
    pub fn recorder_options(&self) -> Result<RecorderOptions> {
        let recording = &self.recording;

        let capture_mode = recording.capture_mode.parse::<CaptureMode>().with_context(|| {
            format!("invalid capture mode in config: {:?}", recording.capture_mode)
        })?;

        let output_resolution = recording
            .output_resolution
            .parse::<Resolution>()
            .with_context(|| {
                format!(
                    "invalid output resolution in config: {:?}",
                    recording.output_resolution
                )
            })?;

        Ok(RecorderOptions {
            capture_mode,
            display_index: recording.display_index,
            output_resolution,
            video_bitrate: recording.video_bitrate,
            fps: recording.fps,
            encoder: EncoderSelection::from(recording.encoder.as_str()),
            buffer_directory: recording.buffer_directory.clone(),
            audio_input_device: AudioDeviceSelect::from(recording.audio_input_device.as_str()),
            audio_output_device: AudioDeviceSelect::from(recording.audio_output_device.as_str()),
            capture_window: WindowSpec::new(
                recording.window_title.clone(),
                recording.window_class.clone(),
                recording.window_process.clone(),
            ),
        })
    }
}
