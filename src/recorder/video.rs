//! Video capture source construction and scene-item scale upkeep.
//!
//! Builds the single video source (display or window capture) and, once the
//! source is in a scene, keeps the rendered output matched to the declared
//! base resolution: window captures change native size whenever the target
//! window resizes, so a periodic check rescales the scene item from the
//! source's reported dimensions.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::engine::{EngineBackend, ItemId, SourceId, SourceKind};
use crate::error::RecorderError;

use super::options::{CaptureMode, RecorderOptions};
use super::resolution::Resolution;

pub(crate) const VIDEO_SOURCE_NAME: &str = "video-capture";

/// Window-capture match priority: exact title first.
const WINDOW_PRIORITY_TITLE_EXACT: i64 = 1;

/// How often the source's reported dimensions are checked.
const SCALE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Create the video capture source for the configured mode.
///
/// Returns the source and the base resolution it implies: the display's
/// physical size in display-capture mode, or the configured output
/// resolution in window-capture mode (no physical surface constrains a
/// window capture).
pub(crate) fn build_capture_source(
    engine: &dyn EngineBackend,
    options: &RecorderOptions,
) -> Result<(SourceId, Resolution), RecorderError> {
    match options.capture_mode {
        CaptureMode::DisplayCapture => {
            let index = options
                .display_index
                .checked_sub(1)
                .ok_or(RecorderError::DisplayNotFound(options.display_index))?;

            let displays = engine.list_displays();
            let display = displays
                .get(index)
                .ok_or(RecorderError::DisplayNotFound(options.display_index))?;
            let base = Resolution::new(display.width, display.height);

            let display_name = &display.name;
            info!(
                display = %display_name,
                %base,
                "creating display capture source"
            );

            let settings = json!({
                "monitor": index,
                "capture_cursor": true,
            });
            let source = engine.create_source(SourceKind::DisplayCapture, VIDEO_SOURCE_NAME, settings)?;
            Ok((source, base))
        }
        CaptureMode::WindowCapture => {
            let window = &options.capture_window;
            info!(window = %window, "creating window capture source");

            let settings = json!({
                "window": window.to_string(),
                "capture_cursor": true,
                "allow_transparency": true,
                "priority": WINDOW_PRIORITY_TITLE_EXACT,
            });
            let source = engine.create_source(SourceKind::WindowCapture, VIDEO_SOURCE_NAME, settings)?;
            Ok((source, options.output_resolution))
        }
    }
}

/// Spawn the periodic scale check for one scene item.
///
/// The returned handle must be aborted before a replacement is spawned;
/// the recorder keeps a single watchdog slot so scene rebuilds supersede
/// the previous poll instead of stacking timers.
pub(crate) fn spawn_scale_watchdog(
    engine: Arc<dyn EngineBackend>,
    source: SourceId,
    item: ItemId,
    base: Resolution,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SCALE_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = (0u32, 0u32);

        loop {
            ticker.tick().await;

            let current = engine.source_dimensions(source);
            if current == last || current.0 == 0 || current.1 == 0 {
                continue;
            }

            let scale = base.width as f32 / current.0 as f32;
            debug!(
                width = current.0,
                height = current.1,
                scale,
                "capture source dimensions changed; rescaling scene item"
            );
            engine.set_item_scale(item, scale, scale);
            last = current;
        }
    })
}
