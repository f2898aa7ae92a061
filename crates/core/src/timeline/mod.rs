use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    active_segment, derive_segments, nearest_beat, BeatSequence, Result, Segment, TimelineError,
};

/// Current playback time, driven by a clock or by user seeks.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlaybackPosition {
    pub time_seconds: f64,
}

impl PlaybackPosition {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    /// Moves playback forward by `delta`, staying within `[0, duration]`.
    pub fn advance(&mut self, delta: f64, duration: f64) {
        self.seek(self.time_seconds + delta, duration);
    }

    /// Jumps to `time`, clamped to `[0, duration]`. Non-finite targets are
    /// ignored.
    pub fn seek(&mut self, time: f64, duration: f64) {
        if time.is_finite() {
            self.time_seconds = time.clamp(0.0, duration.max(0.0));
        }
    }
}

/// A beat sequence together with the segments derived from it. Readers always
/// see both halves of the same generation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSnapshot {
    pub sequence: BeatSequence,
    pub segments: Vec<Segment>,
}

impl TimelineSnapshot {
    pub fn new(sequence: BeatSequence) -> Self {
        let segments = derive_segments(&sequence);
        Self { sequence, segments }
    }

    pub fn active_segment(&self, t: f64) -> Option<&Segment> {
        active_segment(&self.sequence, t).and_then(|index| self.segments.get(index))
    }
}

/// Holds the beat timeline of the selected track.
///
/// Replacing the sequence swaps one `Arc` under a short write lock, so render
/// loops and exporters keep working on whichever snapshot they already hold
/// and never observe a half-updated timeline.
#[derive(Debug, Clone)]
pub struct Timeline {
    current: Arc<RwLock<Arc<TimelineSnapshot>>>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(BeatSequence::empty(0.0))
    }
}

impl Timeline {
    pub fn new(sequence: BeatSequence) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(TimelineSnapshot::new(sequence)))),
        }
    }

    /// Returns the snapshot in effect right now.
    pub fn snapshot(&self) -> Result<Arc<TimelineSnapshot>> {
        Ok(self.read()?.clone())
    }

    /// Installs a new sequence and returns the snapshot it replaced.
    pub fn replace(&self, sequence: BeatSequence) -> Result<Arc<TimelineSnapshot>> {
        let next = Arc::new(TimelineSnapshot::new(sequence));
        tracing::debug!(
            beats = next.sequence.len(),
            duration = next.sequence.duration(),
            "replacing beat timeline"
        );
        let mut slot = self.write()?;
        Ok(std::mem::replace(&mut *slot, next))
    }

    /// Segment index active at `t` in the current snapshot.
    pub fn active_segment(&self, t: f64) -> Result<Option<usize>> {
        let snapshot = self.snapshot()?;
        Ok(active_segment(&snapshot.sequence, t))
    }

    /// Beat to preview while hovering at `t`.
    pub fn hover(&self, t: f64, tolerance_seconds: f64) -> Result<Option<usize>> {
        let snapshot = self.snapshot()?;
        Ok(nearest_beat(&snapshot.sequence, t, tolerance_seconds))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arc<TimelineSnapshot>>> {
        self.current
            .read()
            .map_err(|_| TimelineError::msg("beat timeline has been poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arc<TimelineSnapshot>>> {
        self.current
            .write()
            .map_err(|_| TimelineError::msg("beat timeline has been poisoned"))
    }
}

/// Position of `time` along a track as a fraction in `[0, 1]`. Zero for a
/// zero-length track.
pub fn fraction_of(time: f64, duration: f64) -> f64 {
    if !(duration > 0.0) || !time.is_finite() {
        return 0.0;
    }
    (time / duration).clamp(0.0, 1.0)
}

/// Inverse of [`fraction_of`]: the time under a click at `fraction` of the
/// timeline width.
pub fn time_at_fraction(fraction: f64, duration: f64) -> f64 {
    if !fraction.is_finite() || !(duration > 0.0) {
        return 0.0;
    }
    fraction.clamp(0.0, 1.0) * duration
}

/// Formats seconds as `m:ss`, truncating fractions of a second.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() { seconds.max(0.0) as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}
