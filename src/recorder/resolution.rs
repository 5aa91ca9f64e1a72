//! Resolution parsing and closest-match selection.
//!
//! The engine only accepts resolutions from a fixed candidate list, so both
//! the base and output resolutions are snapped to the nearest supported
//! value before being applied.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::settings::{SettingsBridge, DEFAULT_SUBCATEGORY, VIDEO_CATEGORY};
use crate::error::RecorderError;

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A string that did not parse as `"WxH"`.
#[derive(Debug, Clone, Error)]
#[error("invalid resolution string {0:?}")]
pub struct InvalidResolution(pub String);

impl FromStr for Resolution {
    type Err = InvalidResolution;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once('x')
            .ok_or_else(|| InvalidResolution(s.to_string()))?;
        let width = width
            .parse::<u32>()
            .map_err(|_| InvalidResolution(s.to_string()))?;
        let height = height
            .parse::<u32>()
            .map_err(|_| InvalidResolution(s.to_string()))?;
        Ok(Self { width, height })
    }
}

/// Which engine resolution parameter a value is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Base,
    Output,
}

impl ResolutionKind {
    pub fn parameter(self) -> &'static str {
        match self {
            ResolutionKind::Base => "Base",
            ResolutionKind::Output => "Output",
        }
    }
}

/// Pick the candidate closest to `target`.
///
/// Width and height deltas are weighted asymmetrically (2 and 4) so that a
/// transposed candidate (e.g. 1080x1920 against a 1920x1080 target) never
/// scores the same as the straight match. Ties resolve to the first
/// occurrence; candidates that do not parse are skipped.
pub fn closest_resolution(candidates: &[String], target: Resolution) -> Result<String, RecorderError> {
    let mut best: Option<(&str, i64)> = None;

    for candidate in candidates {
        let Ok(parsed) = candidate.parse::<Resolution>() else {
            debug!(%candidate, "skipping unparseable resolution candidate");
            continue;
        };

        let d = distance(target, parsed);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((candidate, d));
        }
    }

    best.map(|(candidate, _)| candidate.to_string())
        .ok_or(RecorderError::NoResolutionsAvailable)
}

fn distance(target: Resolution, candidate: Resolution) -> i64 {
    let dw = i64::from(target.width) - i64::from(candidate.width);
    let dh = i64::from(target.height) - i64::from(candidate.height);
    (2 * dw + 4 * dh).abs()
}

/// Snap `target` to the engine's candidate list for `kind` and write it back.
pub(crate) fn apply_resolution(
    bridge: &SettingsBridge,
    target: Resolution,
    kind: ResolutionKind,
) -> Result<(), RecorderError> {
    let candidates = bridge.available_strings(VIDEO_CATEGORY, DEFAULT_SUBCATEGORY, kind.parameter());
    let matched = closest_resolution(&candidates, target)?;

    if matched != target.to_string() {
        info!(
            requested = %target,
            applied = %matched,
            parameter = kind.parameter(),
            "requested resolution not supported by engine; using closest match"
        );
    }

    bridge.set_value(VIDEO_CATEGORY, kind.parameter(), Value::String(matched))?;
    Ok(())
}
