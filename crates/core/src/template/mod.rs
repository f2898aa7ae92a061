use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{derive_segments, BeatSequence, Result, Segment};

/// Upper bound on the clips demanded before a template can be exported.
const MAX_REQUIRED_CLIPS: usize = 4;
/// Beats covered by one required clip.
const BEATS_PER_REQUIRED_CLIP: usize = 8;

/// A saved beat pattern for a track that users fill with their own clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub track_name: String,
    #[serde(default)]
    pub artist: String,
    pub beats: BeatSequence,
}

impl Template {
    pub fn new(name: impl Into<String>, beats: BeatSequence) -> Self {
        Self {
            name: name.into(),
            track_name: String::new(),
            artist: String::new(),
            beats,
        }
    }

    pub fn with_track(mut self, track_name: impl Into<String>, artist: impl Into<String>) -> Self {
        self.track_name = track_name.into();
        self.artist = artist.into();
        self
    }

    pub fn beat_count(&self) -> usize {
        self.beats.len()
    }

    pub fn duration(&self) -> f64 {
        self.beats.duration()
    }

    pub fn segments(&self) -> Vec<Segment> {
        derive_segments(&self.beats)
    }

    /// Number of uploaded clips needed before export: one per eight beats,
    /// capped at four.
    pub fn required_clips(&self) -> usize {
        self.beat_count()
            .div_ceil(BEATS_PER_REQUIRED_CLIP)
            .min(MAX_REQUIRED_CLIPS)
    }

    pub fn is_ready_for_export(&self, clip_count: usize) -> bool {
        clip_count > 0 && clip_count >= self.required_clips()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a template, re-validating its beat sequence.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
