//! Read/write access to the engine's settings tree.
//!
//! The engine exposes configuration as a dynamic tree keyed by
//! category -> subcategory -> parameter, with JSON-typed values. The bridge
//! keeps writes idempotent (a category is only written back when a value
//! actually changed) and treats missing parameters as a soft miss: engine
//! versions expose different parameter names, and a hard failure here would
//! break forward compatibility.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{EngineBackend, EngineError};

pub const VIDEO_CATEGORY: &str = "Video";
pub const OUTPUT_CATEGORY: &str = "Output";

/// Subcategory the engine files uncategorized parameters under.
pub const DEFAULT_SUBCATEGORY: &str = "Untitled";
pub const RECORDING_SUBCATEGORY: &str = "Recording";

/// One parameter in the settings tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsParameter {
    pub name: String,
    pub current_value: Value,
    #[serde(default)]
    pub available_values: Vec<Value>,
}

/// A named group of parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSubcategory {
    pub name: String,
    pub parameters: Vec<SettingsParameter>,
}

/// The full settings tree for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsCategory {
    pub subcategories: Vec<SettingsSubcategory>,
}

/// The engine parameters this orchestrator writes, as a closed enumeration.
///
/// Typos in category/parameter pairs become compile errors; parameters an
/// engine build genuinely does not expose still fall through to the bridge's
/// soft-miss path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    OutputMode,
    RecordingEncoder,
    RecordingPath,
    RecordingFormat,
    VideoBitrate,
    RecordedTracks,
    FpsCommon,
    BaseResolution,
    OutputResolution,
}

impl SettingKey {
    /// The (category, parameter) pair this key addresses.
    pub fn location(self) -> (&'static str, &'static str) {
        match self {
            SettingKey::OutputMode => (OUTPUT_CATEGORY, "Mode"),
            SettingKey::RecordingEncoder => (OUTPUT_CATEGORY, "RecEncoder"),
            SettingKey::RecordingPath => (OUTPUT_CATEGORY, "RecFilePath"),
            SettingKey::RecordingFormat => (OUTPUT_CATEGORY, "RecFormat"),
            SettingKey::VideoBitrate => (OUTPUT_CATEGORY, "Recbitrate"),
            SettingKey::RecordedTracks => (OUTPUT_CATEGORY, "RecTracks"),
            SettingKey::FpsCommon => (VIDEO_CATEGORY, "FPSCommon"),
            SettingKey::BaseResolution => (VIDEO_CATEGORY, "Base"),
            SettingKey::OutputResolution => (VIDEO_CATEGORY, "Output"),
        }
    }
}

/// Idempotent read/write access to the engine settings tree.
#[derive(Clone)]
pub struct SettingsBridge {
    engine: Arc<dyn EngineBackend>,
}

impl SettingsBridge {
    pub fn new(engine: Arc<dyn EngineBackend>) -> Self {
        Self { engine }
    }

    /// Write a known parameter.
    pub fn set(&self, key: SettingKey, value: Value) -> Result<(), EngineError> {
        let (category, parameter) = key.location();
        self.set_value(category, parameter, value)
    }

    /// Write a parameter by name, scanning all subcategories of `category`.
    ///
    /// The category is written back only if the value actually changed. A
    /// parameter the engine does not expose is logged at debug level and
    /// otherwise ignored.
    pub fn set_value(
        &self,
        category: &str,
        parameter: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        let Some(mut tree) = self.engine.get_category(category) else {
            debug!(category, "settings category not exposed by engine");
            return Ok(());
        };

        let Some((sub, param)) = locate(&tree, parameter) else {
            debug!(
                category,
                parameter, "parameter not exposed by engine; skipping write"
            );
            return Ok(());
        };

        let slot = &mut tree.subcategories[sub].parameters[param];
        if slot.current_value == value {
            return Ok(());
        }

        debug!(category, parameter, %value, "writing engine setting");
        slot.current_value = value;
        self.engine.set_category(category, tree)
    }

    /// The permitted values for a parameter, or empty (with a warning) if
    /// the category, subcategory, or parameter is unknown. Never fails.
    pub fn available_values(&self, category: &str, subcategory: &str, parameter: &str) -> Vec<Value> {
        let Some(tree) = self.engine.get_category(category) else {
            warn!(category, "settings category not exposed by engine");
            return Vec::new();
        };

        let Some(sub) = tree.subcategories.into_iter().find(|s| s.name == subcategory) else {
            warn!(category, subcategory, "settings subcategory not found");
            return Vec::new();
        };

        let Some(param) = sub.parameters.into_iter().find(|p| p.name == parameter) else {
            warn!(category, subcategory, parameter, "settings parameter not found");
            return Vec::new();
        };

        param.available_values
    }

    /// String-typed variant of [`available_values`](Self::available_values);
    /// non-string entries are dropped.
    pub fn available_strings(
        &self,
        category: &str,
        subcategory: &str,
        parameter: &str,
    ) -> Vec<String> {
        self.available_values(category, subcategory, parameter)
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

fn locate(tree: &SettingsCategory, parameter: &str) -> Option<(usize, usize)> {
    for (sub_index, sub) in tree.subcategories.iter().enumerate() {
        for (param_index, param) in sub.parameters.iter().enumerate() {
            if param.name == parameter {
                return Some((sub_index, param_index));
            }
        }
    }
    None
}
