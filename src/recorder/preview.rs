//! Preview surface projection into a host window.
//!
//! Optional extension of the recorder: attaches the engine's rendering
//! surface to a region of a host window and keeps it sized to that region
//! as the host reports layout changes.

use tracing::{debug, warn};

use crate::engine::{EngineBackend, EngineError, PreviewBounds, WindowHandle};

pub(crate) struct PreviewProjector {
    attached: bool,
    bounds: Option<PreviewBounds>,
}

impl PreviewProjector {
    pub fn new() -> Self {
        Self {
            attached: false,
            bounds: None,
        }
    }

    pub fn attach(
        &mut self,
        engine: &dyn EngineBackend,
        parent: WindowHandle,
        bounds: PreviewBounds,
    ) -> Result<(), EngineError> {
        engine.attach_preview(parent, bounds)?;
        debug!(?bounds, "preview surface attached");
        self.attached = true;
        self.bounds = Some(bounds);
        Ok(())
    }

    pub fn resize(
        &mut self,
        engine: &dyn EngineBackend,
        bounds: PreviewBounds,
    ) -> Result<(), EngineError> {
        if !self.attached {
            warn!("preview resize requested before setup; ignoring");
            return Ok(());
        }
        if self.bounds == Some(bounds) {
            return Ok(());
        }

        engine.move_preview(bounds)?;
        self.bounds = Some(bounds);
        Ok(())
    }
}
