use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BeatSequence;

/// One beat-bounded interval of the track, `[start, end)`, meant to hold a
/// single clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    /// Length in seconds. May be zero when the last beat sits on the end of
    /// the track.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open containment test.
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Human-facing name, numbered from one.
    pub fn label(&self) -> String {
        format!("Clip {}", self.index + 1)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}s)", self.label(), self.duration())
    }
}

/// Splits the track at every beat.
///
/// An empty sequence produces one segment over the whole track. Otherwise
/// there is one segment per beat, running to the next beat or to the end of
/// the track for the last one. Any lead-in before the first beat is not part
/// of a segment.
pub fn derive_segments(seq: &BeatSequence) -> Vec<Segment> {
    let duration = seq.duration();
    let beats = seq.beats();

    if beats.is_empty() {
        return vec![Segment {
            index: 0,
            start: 0.0,
            end: duration,
        }];
    }

    beats
        .iter()
        .enumerate()
        .map(|(index, beat)| Segment {
            index,
            start: beat.time,
            end: beats.get(index + 1).map_or(duration, |next| next.time),
        })
        .collect()
}

/// Sum of all segment durations.
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::duration).sum()
}

/// Pairing of a timeline segment with the uploaded clip that fills it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipSlot {
    pub segment: Segment,
    /// Index into the caller's list of uploaded clips.
    pub clip: usize,
}

/// Fills every segment with a clip, cycling through `clip_count` clips in
/// order. No clips means nothing to render.
pub fn plan_clips(segments: &[Segment], clip_count: usize) -> Vec<ClipSlot> {
    if clip_count == 0 {
        return Vec::new();
    }

    segments
        .iter()
        .map(|segment| ClipSlot {
            segment: *segment,
            clip: segment.index % clip_count,
        })
        .collect()
}
