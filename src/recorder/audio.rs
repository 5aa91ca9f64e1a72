//! Audio device enumeration and output-track allocation.
//!
//! The engine mixes every audible source into track slot 1; each audio
//! device additionally gets an exclusive slot of its own so tracks can be
//! remixed after the fact. Slots are assigned in enumeration order, inputs
//! before outputs, which keeps slot numbers stable across rebuilds for an
//! unchanged device set.

use serde_json::json;
use tracing::{debug, info, warn};

use crate::engine::settings::{SettingKey, SettingsBridge};
use crate::engine::{AudioDeviceInfo, AudioDirection, EngineBackend, EngineError, SourceId, SourceKind};

use super::options::{AudioDeviceSelect, RecorderOptions};

/// Engine limit on independently encodable tracks.
pub(crate) const MAX_TRACKS: usize = 64;

/// Slot 1 carries the mixed scene output and is never assigned a device.
pub(crate) const MIX_TRACK_SLOT: usize = 1;

/// Fixed-size table of output-track slots, indexed by slot number.
///
/// Owns the engine-side audio sources: once a source is registered for a
/// slot, the table is the only holder of its handle, and `clear` is the
/// only path that releases it.
pub(crate) struct TrackTable {
    slots: [Option<SourceId>; MAX_TRACKS],
}

impl TrackTable {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_TRACKS],
        }
    }

    /// Number of slots currently holding a device source.
    pub fn assigned(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Release every registered device source and zero the recorded-tracks
    /// setting. Must precede every allocation pass so no stale device
    /// source survives a reconfigure.
    pub fn clear(
        &mut self,
        engine: &dyn EngineBackend,
        bridge: &SettingsBridge,
    ) -> Result<(), EngineError> {
        let mut released = 0usize;
        for slot in 1..=MAX_TRACKS {
            let Some(source) = self.slots[slot - 1].take() else {
                continue;
            };
            engine.set_track_name(slot, "");
            engine.set_output_source(slot, None);
            engine.release_source(source);
            released += 1;
        }

        if released > 0 {
            debug!(released, "cleared audio track sources");
        }
        bridge.set(SettingKey::RecordedTracks, json!(0))?;
        Ok(())
    }

    /// Enumerate audio devices and assign one slot per device, starting at
    /// slot 2. Inputs are processed before outputs; this ordering decides
    /// slot numbers and must not change.
    pub fn allocate(
        &mut self,
        engine: &dyn EngineBackend,
        bridge: &SettingsBridge,
        options: &RecorderOptions,
    ) -> Result<(), EngineError> {
        let mut slot = MIX_TRACK_SLOT + 1;

        let passes = [
            (
                AudioDirection::Input,
                engine.list_audio_devices(AudioDirection::Input),
                &options.audio_input_device,
            ),
            (
                AudioDirection::Output,
                engine.list_audio_devices(AudioDirection::Output),
                &options.audio_output_device,
            ),
        ];

        for (direction, devices, selector) in passes {
            for device in devices {
                if slot > MAX_TRACKS {
                    warn!(
                        device = %device.name,
                        "engine track limit reached; skipping remaining audio devices"
                    );
                    break;
                }
                slot = self.assign_device(engine, direction, &device, selector, slot)?;
            }
        }

        // Bits 0..(last assigned slot - 1), i.e. the mix track plus every
        // device slot, as one base-2 literal. `1 << 64` would overflow when
        // all 64 slots are packed.
        let bits = (slot - 1) as u32;
        let recorded = if bits >= u64::BITS {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        };
        info!(
            devices = self.assigned(),
            recorded_tracks = recorded,
            "audio tracks allocated"
        );
        bridge.set(SettingKey::RecordedTracks, json!(recorded))?;
        Ok(())
    }

    fn assign_device(
        &mut self,
        engine: &dyn EngineBackend,
        direction: AudioDirection,
        device: &AudioDeviceInfo,
        selector: &AudioDeviceSelect,
        slot: usize,
    ) -> Result<usize, EngineError> {
        let kind = match direction {
            AudioDirection::Input => SourceKind::AudioInputCapture,
            AudioDirection::Output => SourceKind::AudioOutputCapture,
        };

        let source = engine.create_source(kind, &device.name, json!({ "device_id": device.id }))?;
        engine.set_track_name(slot, &device.name);

        // The shared mix track plus this slot's own bit.
        let mask = 1u64 | (1u64 << (slot - 1));
        engine.set_source_track_mask(source, mask);

        let muted = !selector.selects(&device.id);
        engine.set_source_muted(source, muted);

        engine.set_output_source(slot, Some(source));
        self.slots[slot - 1] = Some(source);

        debug!(
            device = %device.name,
            slot,
            mask,
            muted,
            "assigned audio device to output track"
        );
        Ok(slot + 1)
    }
}
