//! Compatibility rules consulted by scripts before authoring optional derived tasks.
//!
//! The rules are plain data: teaching the compiler about another format FFmpeg cannot read is a
//! table entry (or a config entry), not code.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::graph::model::Settings;

/// `image_format` values producing files FFmpeg is known not to read.
///
/// Covers both the old CLI-style indicators and the Blender enum names.
pub const FFMPEG_INCOMPATIBLE_IMAGE_FORMATS: &[&str] =
    &["EXR", "MULTILAYER", "OPEN_EXR", "OPEN_EXR_MULTILAYER"];

/// Settings that must be present (and non-zero/non-empty) for a video to be encoded.
pub const VIDEO_REQUIRED_SETTINGS: &[&str] = &["frames_per_second", "output_file_extension"];

/// Outcome of [`CompatibilityPolicy::video_gate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoGate {
    /// A video task may be authored.
    Allowed,
    /// FFmpeg cannot ingest the configured image format.
    IncompatibleFormat(String),
    /// A required setting is absent.
    MissingSetting(String),
}

impl VideoGate {
    /// Return `true` for [`VideoGate::Allowed`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Read-only rule tables, shared by every compilation.
#[derive(Clone, Debug)]
pub struct CompatibilityPolicy {
    ffmpeg_incompatible: BTreeSet<String>,
    video_required: Vec<String>,
}

impl Default for CompatibilityPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CompatibilityPolicy {
    /// Built-in tables.
    pub fn builtin() -> Self {
        Self {
            ffmpeg_incompatible: FFMPEG_INCOMPATIBLE_IMAGE_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            video_required: VIDEO_REQUIRED_SETTINGS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }

    /// Add formats to the FFmpeg-incompatible set (matched case-insensitively).
    pub fn with_incompatible_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ffmpeg_incompatible
            .extend(formats.into_iter().map(|f| f.as_ref().to_ascii_uppercase()));
        self
    }

    /// Return `true` when FFmpeg can read frames written in `image_format`.
    pub fn ffmpeg_can_ingest(&self, image_format: &str) -> bool {
        !self
            .ffmpeg_incompatible
            .contains(&image_format.to_ascii_uppercase())
    }

    /// Decide whether a video-encode task may be derived from frames in `image_format`.
    pub fn video_gate(&self, image_format: &str, settings: &Settings) -> VideoGate {
        if !self.ffmpeg_can_ingest(image_format) {
            return VideoGate::IncompatibleFormat(image_format.to_string());
        }
        for key in &self.video_required {
            if !settings.get(key).is_some_and(is_set) {
                return VideoGate::MissingSetting(key.clone());
            }
        }
        VideoGate::Allowed
    }
}

/// `null`, `false`, `0` and `""` count as unset.
fn is_set(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/policy/compat.rs"]
mod tests;
