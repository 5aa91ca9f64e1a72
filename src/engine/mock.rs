//! In-memory engine backend for tests.
//!
//! Models just enough of the native engine to exercise the orchestrator:
//! the settings tree, source/scene/item bookkeeping, the 64-slot output
//! table, and the signal callback. Start/stop commands emit whatever
//! signal sequence the test queued, so protocol ordering and timeout
//! behavior can be driven deterministically.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;

use super::settings::{
    SettingsCategory, SettingsParameter, SettingsSubcategory, DEFAULT_SUBCATEGORY,
    OUTPUT_CATEGORY, RECORDING_SUBCATEGORY, VIDEO_CATEGORY,
};
use super::signal::EngineSignal;
use super::{
    AudioDeviceInfo, AudioDirection, DisplayInfo, EngineBackend, EngineError, ItemId,
    PreviewBounds, SceneId, SourceId, SourceKind, WindowHandle,
};

pub(crate) const MOCK_SLOT_COUNT: usize = 64;

#[derive(Debug, Clone)]
pub(crate) struct MockSource {
    pub kind: SourceKind,
    pub name: String,
    pub settings: Value,
    pub muted: bool,
    pub track_mask: u64,
    pub dimensions: (u32, u32),
    pub released: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct MockScene {
    pub name: String,
    pub released: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct MockItem {
    pub scene: SceneId,
    pub source: SourceId,
    pub scale: (f32, f32),
}

pub(crate) struct MockState {
    pub hosted_channel: Option<String>,
    pub init_calls: usize,
    pub init_code: i32,
    pub disconnect_calls: usize,
    pub disconnect_error: Option<String>,

    pub sender: Option<UnboundedSender<EngineSignal>>,
    pub start_signals: Vec<EngineSignal>,
    pub stop_signals: Vec<EngineSignal>,
    pub start_calls: usize,
    pub stop_calls: usize,

    pub categories: HashMap<String, SettingsCategory>,
    pub category_writes: usize,

    pub displays: Vec<DisplayInfo>,
    pub input_devices: Vec<AudioDeviceInfo>,
    pub output_devices: Vec<AudioDeviceInfo>,

    next_id: u64,
    pub sources: HashMap<SourceId, MockSource>,
    pub scenes: HashMap<SceneId, MockScene>,
    pub items: HashMap<ItemId, MockItem>,

    pub output_sources: Vec<Option<SourceId>>,
    pub track_names: Vec<String>,
    pub scene_output: Option<SceneId>,

    pub last_path: Option<PathBuf>,
    pub preview_parent: Option<WindowHandle>,
    pub preview_bounds: Option<PreviewBounds>,
    pub preview_moves: usize,
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub(crate) struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                hosted_channel: None,
                init_calls: 0,
                init_code: 0,
                disconnect_calls: 0,
                disconnect_error: None,
                sender: None,
                start_signals: vec![EngineSignal::recording("start")],
                stop_signals: vec![
                    EngineSignal::recording("stopping"),
                    EngineSignal::recording("stop"),
                    EngineSignal::recording("wrote"),
                ],
                start_calls: 0,
                stop_calls: 0,
                categories: seeded_categories(),
                category_writes: 0,
                displays: vec![
                    DisplayInfo {
                        name: "display-0".to_string(),
                        width: 2560,
                        height: 1440,
                    },
                    DisplayInfo {
                        name: "display-1".to_string(),
                        width: 1920,
                        height: 1080,
                    },
                ],
                input_devices: Vec::new(),
                output_devices: Vec::new(),
                next_id: 0,
                sources: HashMap::new(),
                scenes: HashMap::new(),
                items: HashMap::new(),
                output_sources: vec![None; MOCK_SLOT_COUNT],
                track_names: vec![String::new(); MOCK_SLOT_COUNT],
                scene_output: None,
                last_path: None,
                preview_parent: None,
                preview_bounds: None,
                preview_moves: 0,
            }),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_init_code(&self, code: i32) {
        self.state().init_code = code;
    }

    pub fn set_disconnect_error(&self, message: &str) {
        self.state().disconnect_error = Some(message.to_string());
    }

    pub fn set_audio_devices(&self, inputs: &[(&str, &str)], outputs: &[(&str, &str)]) {
        let mut state = self.state();
        state.input_devices = inputs
            .iter()
            .map(|(id, name)| AudioDeviceInfo {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        state.output_devices = outputs
            .iter()
            .map(|(id, name)| AudioDeviceInfo {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
    }

    pub fn queue_start_signals(&self, signals: Vec<EngineSignal>) {
        self.state().start_signals = signals;
    }

    pub fn queue_stop_signals(&self, signals: Vec<EngineSignal>) {
        self.state().stop_signals = signals;
    }

    /// Push one signal through the registered callback sender.
    pub fn emit(&self, signal: EngineSignal) {
        let state = self.state();
        if let Some(sender) = &state.sender {
            let _ = sender.send(signal);
        }
    }

    pub fn set_last_recording_path(&self, path: PathBuf) {
        self.state().last_path = Some(path);
    }

    pub fn set_source_dimensions(&self, source: SourceId, width: u32, height: u32) {
        if let Some(entry) = self.state().sources.get_mut(&source) {
            entry.dimensions = (width, height);
        }
    }

    pub fn category_writes(&self) -> usize {
        self.state().category_writes
    }

    pub fn setting_value(&self, category: &str, parameter: &str) -> Option<Value> {
        let state = self.state();
        let tree = state.categories.get(category)?;
        tree.subcategories
            .iter()
            .flat_map(|sub| sub.parameters.iter())
            .find(|param| param.name == parameter)
            .map(|param| param.current_value.clone())
    }

    /// Live (created and not yet released) sources of the given kinds.
    pub fn live_sources(&self, kinds: &[SourceKind]) -> Vec<SourceId> {
        self.state()
            .sources
            .iter()
            .filter(|(_, source)| !source.released && kinds.contains(&source.kind))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Slot numbers (1-based) currently holding an output source.
    pub fn assigned_slots(&self) -> Vec<usize> {
        self.state()
            .output_sources
            .iter()
            .enumerate()
            .filter_map(|(index, source)| source.map(|_| index + 1))
            .collect()
    }

    pub fn source(&self, id: SourceId) -> MockSource {
        self.state().sources.get(&id).cloned().expect("unknown source")
    }
}

impl EngineBackend for MockEngine {
    fn host(&self, channel: &str) -> Result<(), EngineError> {
        self.state().hosted_channel = Some(channel.to_string());
        Ok(())
    }

    fn init(&self, _locale: &str, _data_path: &std::path::Path, _version: &str) -> Result<i32, EngineError> {
        let mut state = self.state();
        state.init_calls += 1;
        Ok(state.init_code)
    }

    fn disconnect(&self) -> Result<(), EngineError> {
        let mut state = self.state();
        state.disconnect_calls += 1;
        match &state.disconnect_error {
            Some(message) => Err(EngineError(message.clone())),
            None => Ok(()),
        }
    }

    fn set_signal_sender(&self, sender: Option<UnboundedSender<EngineSignal>>) {
        self.state().sender = sender;
    }

    fn get_category(&self, category: &str) -> Option<SettingsCategory> {
        self.state().categories.get(category).cloned()
    }

    fn set_category(&self, category: &str, data: SettingsCategory) -> Result<(), EngineError> {
        let mut state = self.state();
        state.category_writes += 1;
        state.categories.insert(category.to_string(), data);
        Ok(())
    }

    fn list_displays(&self) -> Vec<DisplayInfo> {
        self.state().displays.clone()
    }

    fn list_audio_devices(&self, direction: AudioDirection) -> Vec<AudioDeviceInfo> {
        let state = self.state();
        match direction {
            AudioDirection::Input => state.input_devices.clone(),
            AudioDirection::Output => state.output_devices.clone(),
        }
    }

    fn create_source(
        &self,
        kind: SourceKind,
        name: &str,
        settings: Value,
    ) -> Result<SourceId, EngineError> {
        let mut state = self.state();
        let id = SourceId(state.next_id());
        state.sources.insert(
            id,
            MockSource {
                kind,
                name: name.to_string(),
                settings,
                muted: false,
                track_mask: 0,
                dimensions: (0, 0),
                released: false,
            },
        );
        Ok(id)
    }

    fn release_source(&self, source: SourceId) {
        if let Some(entry) = self.state().sources.get_mut(&source) {
            entry.released = true;
        }
    }

    fn source_dimensions(&self, source: SourceId) -> (u32, u32) {
        self.state()
            .sources
            .get(&source)
            .map(|entry| entry.dimensions)
            .unwrap_or((0, 0))
    }

    fn set_source_muted(&self, source: SourceId, muted: bool) {
        if let Some(entry) = self.state().sources.get_mut(&source) {
            entry.muted = muted;
        }
    }

    fn set_source_track_mask(&self, source: SourceId, mask: u64) {
        if let Some(entry) = self.state().sources.get_mut(&source) {
            entry.track_mask = mask;
        }
    }

    fn create_scene(&self, name: &str) -> Result<SceneId, EngineError> {
        let mut state = self.state();
        let id = SceneId(state.next_id());
        state.scenes.insert(
            id,
            MockScene {
                name: name.to_string(),
                released: false,
            },
        );
        Ok(id)
    }

    fn release_scene(&self, scene: SceneId) {
        let mut state = self.state();
        if let Some(entry) = state.scenes.get_mut(&scene) {
            entry.released = true;
        }
        if state.scene_output == Some(scene) {
            state.scene_output = None;
        }
        state.items.retain(|_, item| item.scene != scene);
    }

    fn add_scene_item(&self, scene: SceneId, source: SourceId) -> Result<ItemId, EngineError> {
        let mut state = self.state();
        let id = ItemId(state.next_id());
        state.items.insert(
            id,
            MockItem {
                scene,
                source,
                scale: (1.0, 1.0),
            },
        );
        Ok(id)
    }

    fn set_item_scale(&self, item: ItemId, x: f32, y: f32) {
        if let Some(entry) = self.state().items.get_mut(&item) {
            entry.scale = (x, y);
        }
    }

    fn set_scene_to_output(&self, scene: SceneId) -> Result<(), EngineError> {
        self.state().scene_output = Some(scene);
        Ok(())
    }

    fn set_output_source(&self, slot: usize, source: Option<SourceId>) {
        if slot >= 1 && slot <= MOCK_SLOT_COUNT {
            self.state().output_sources[slot - 1] = source;
        }
    }

    fn set_track_name(&self, slot: usize, name: &str) {
        if slot >= 1 && slot <= MOCK_SLOT_COUNT {
            self.state().track_names[slot - 1] = name.to_string();
        }
    }

    fn start_recording(&self) -> Result<(), EngineError> {
        let mut state = self.state();
        state.start_calls += 1;
        if let Some(sender) = &state.sender {
            for signal in &state.start_signals {
                let _ = sender.send(signal.clone());
            }
        }
        Ok(())
    }

    fn stop_recording(&self) -> Result<(), EngineError> {
        let mut state = self.state();
        state.stop_calls += 1;
        if let Some(sender) = &state.sender {
            for signal in &state.stop_signals {
                let _ = sender.send(signal.clone());
            }
        }
        Ok(())
    }

    fn last_recording_path(&self) -> Option<PathBuf> {
        self.state().last_path.clone()
    }

    fn attach_preview(
        &self,
        parent: WindowHandle,
        bounds: PreviewBounds,
    ) -> Result<(), EngineError> {
        let mut state = self.state();
        state.preview_parent = Some(parent);
        state.preview_bounds = Some(bounds);
        Ok(())
    }

    fn move_preview(&self, bounds: PreviewBounds) -> Result<(), EngineError> {
        let mut state = self.state();
        state.preview_bounds = Some(bounds);
        state.preview_moves += 1;
        Ok(())
    }
}

fn parameter(name: &str, current: Value, available: Vec<Value>) -> SettingsParameter {
    SettingsParameter {
        name: name.to_string(),
        current_value: current,
        available_values: available,
    }
}

fn seeded_categories() -> HashMap<String, SettingsCategory> {
    let mut categories = HashMap::new();

    categories.insert(
        VIDEO_CATEGORY.to_string(),
        SettingsCategory {
            subcategories: vec![SettingsSubcategory {
                name: DEFAULT_SUBCATEGORY.to_string(),
                parameters: vec![
                    parameter(
                        "Base",
                        json!(""),
                        vec![
                            json!("1280x720"),
                            json!("1920x1080"),
                            json!("2560x1440"),
                            json!("3840x2160"),
                        ],
                    ),
                    parameter(
                        "Output",
                        json!(""),
                        vec![json!("1280x720"), json!("1920x1080"), json!("2560x1440")],
                    ),
                    parameter("FPSCommon", json!(30), vec![json!(30), json!(60)]),
                ],
            }],
        },
    );

    categories.insert(
        OUTPUT_CATEGORY.to_string(),
        SettingsCategory {
            subcategories: vec![
                SettingsSubcategory {
                    name: DEFAULT_SUBCATEGORY.to_string(),
                    parameters: vec![parameter(
                        "Mode",
                        json!("Simple"),
                        vec![json!("Simple"), json!("Advanced")],
                    )],
                },
                SettingsSubcategory {
                    name: RECORDING_SUBCATEGORY.to_string(),
                    parameters: vec![
                        parameter(
                            "RecEncoder",
                            json!("obs_x264"),
                            vec![json!("obs_x264"), json!("jim_nvenc")],
                        ),
                        parameter("RecFilePath", json!(""), Vec::new()),
                        parameter("RecFormat", json!("mp4"), vec![json!("mp4"), json!("mkv")]),
                        parameter("Recbitrate", json!(2500), Vec::new()),
                        parameter("RecTracks", json!(1), Vec::new()),
                    ],
                },
            ],
        },
    );

    categories
}
