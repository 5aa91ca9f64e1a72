//! Typed recording options.
//!
//! These are the validated form of the raw on-disk configuration; one
//! immutable value is handed to the recorder per reconfigure call.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::RecorderError;

use super::resolution::Resolution;

/// What the single video source captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Capture an entire physical display.
    DisplayCapture,
    /// Track one target window by title/class/process.
    WindowCapture,
}

impl CaptureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureMode::DisplayCapture => "display_capture",
            CaptureMode::WindowCapture => "window_capture",
        }
    }
}

impl FromStr for CaptureMode {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "display_capture" => Ok(CaptureMode::DisplayCapture),
            "window_capture" => Ok(CaptureMode::WindowCapture),
            other => Err(RecorderError::InvalidCaptureMode(other.to_string())),
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Video encoder choice: a concrete engine encoder id, or automatic
/// selection from what the engine advertises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderSelection {
    Auto,
    Named(String),
}

impl From<&str> for EncoderSelection {
    fn from(s: &str) -> Self {
        match s {
            "auto" => EncoderSelection::Auto,
            other => EncoderSelection::Named(other.to_string()),
        }
    }
}

/// Which enumerated audio devices stay audible in the recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioDeviceSelect {
    /// Every device of this direction records.
    All,
    /// Every device of this direction is muted.
    None,
    /// Only the device with this id records.
    Device(String),
}

impl AudioDeviceSelect {
    /// Whether the device with `device_id` should be audible.
    pub fn selects(&self, device_id: &str) -> bool {
        match self {
            AudioDeviceSelect::All => true,
            AudioDeviceSelect::None => false,
            AudioDeviceSelect::Device(id) => id == device_id,
        }
    }
}

impl From<&str> for AudioDeviceSelect {
    fn from(s: &str) -> Self {
        match s {
            "all" => AudioDeviceSelect::All,
            "none" => AudioDeviceSelect::None,
            other => AudioDeviceSelect::Device(other.to_string()),
        }
    }
}

/// Target-window triple for window capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSpec {
    pub title: String,
    pub class: String,
    pub process: String,
}

impl WindowSpec {
    pub fn new(
        title: impl Into<String>,
        class: impl Into<String>,
        process: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            class: class.into(),
            process: process.into(),
        }
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.title, self.class, self.process)
    }
}

/// Everything one reconfigure call needs to know.
#[derive(Debug, Clone)]
pub struct RecorderOptions {
    pub capture_mode: CaptureMode,
    /// 1-based index into the enumerated physical displays; only consulted
    /// in display-capture mode.
    pub display_index: usize,
    pub output_resolution: Resolution,
    /// Video bitrate in Kbps.
    pub video_bitrate: u32,
    pub fps: u32,
    pub encoder: EncoderSelection,
    /// Directory the engine writes recording buffers into.
    pub buffer_directory: PathBuf,
    pub audio_input_device: AudioDeviceSelect,
    pub audio_output_device: AudioDeviceSelect,
    /// Target window for window-capture mode.
    pub capture_window: WindowSpec,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            capture_mode: CaptureMode::DisplayCapture,
            display_index: 1,
            output_resolution: Resolution::new(1920, 1080),
            video_bitrate: 5000,
            fps: 60,
            encoder: EncoderSelection::Auto,
            buffer_directory: std::env::temp_dir().join("gamerec"),
            audio_input_device: AudioDeviceSelect::All,
            audio_output_device: AudioDeviceSelect::All,
            capture_window: WindowSpec::default(),
        }
    }
}
