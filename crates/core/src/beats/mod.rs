//! Canonical, validated beat list.
//!
//! A [`BeatSequence`] is immutable once built. Replacing the beats of a track
//! means constructing a new sequence and swapping it in wholesale, so readers
//! holding the previous one never observe a partial update.

use serde::{Deserialize, Serialize};

use crate::{Result, TimelineError};

/// A detected rhythmic pulse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Position in seconds from the start of the track.
    pub time: f64,
    /// Normalised strength in `[0, 1]`.
    pub intensity: f32,
}

impl Beat {
    pub fn new(time: f64, intensity: f32) -> Self {
        Self { time, intensity }
    }
}

/// Strictly increasing beats plus the total track duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SequenceRecord", into = "SequenceRecord")]
pub struct BeatSequence {
    beats: Vec<Beat>,
    duration: f64,
}

impl BeatSequence {
    /// Builds a sequence after checking every invariant.
    ///
    /// Fails with [`TimelineError::InvalidSequence`] when the duration is
    /// negative or not finite, when a timestamp is negative, past `duration`
    /// or not strictly greater than its predecessor, or when an intensity is
    /// outside `[0, 1]`.
    pub fn from_beats(beats: Vec<Beat>, duration: f64) -> Result<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(TimelineError::invalid_sequence(format!(
                "duration must be a non-negative number, got {duration}"
            )));
        }

        let mut previous: Option<f64> = None;
        for (index, beat) in beats.iter().enumerate() {
            if !beat.time.is_finite() || beat.time < 0.0 {
                return Err(TimelineError::invalid_sequence(format!(
                    "beat {index} has invalid timestamp {}",
                    beat.time
                )));
            }
            if beat.time > duration {
                return Err(TimelineError::invalid_sequence(format!(
                    "beat {index} at {} lies past the track duration {duration}",
                    beat.time
                )));
            }
            if let Some(prev) = previous {
                if beat.time <= prev {
                    return Err(TimelineError::invalid_sequence(format!(
                        "beat {index} at {} does not follow previous beat at {prev}",
                        beat.time
                    )));
                }
            }
            if !(0.0..=1.0).contains(&beat.intensity) {
                return Err(TimelineError::invalid_sequence(format!(
                    "beat {index} has intensity {} outside [0, 1]",
                    beat.intensity
                )));
            }
            previous = Some(beat.time);
        }

        Ok(Self { beats, duration })
    }

    /// Builds a sequence from bare timestamps, each with full intensity.
    pub fn from_times(times: &[f64], duration: f64) -> Result<Self> {
        let beats = times.iter().map(|&time| Beat::new(time, 1.0)).collect();
        Self::from_beats(beats, duration)
    }

    /// A sequence without beats covering `duration` seconds. Negative or
    /// non-finite durations collapse to zero.
    pub fn empty(duration: f64) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            beats: Vec::new(),
            duration,
        }
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Total track duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns the beat at `index`.
    pub fn at(&self, index: usize) -> Result<Beat> {
        self.beats
            .get(index)
            .copied()
            .ok_or(TimelineError::IndexOutOfRange {
                index,
                len: self.beats.len(),
            })
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Beat> {
        self.beats.iter()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.beats.iter().map(|beat| beat.time)
    }

    pub fn first(&self) -> Option<&Beat> {
        self.beats.first()
    }

    pub fn last(&self) -> Option<&Beat> {
        self.beats.last()
    }

    /// Tempo implied by the mean inter-beat interval.
    pub fn tempo_bpm(&self) -> Option<f64> {
        if self.beats.len() < 2 {
            return None;
        }
        let (first, last) = (self.beats[0].time, self.beats[self.beats.len() - 1].time);
        let mean_interval = (last - first) / (self.beats.len() - 1) as f64;
        (mean_interval > 0.0).then(|| 60.0 / mean_interval)
    }
}

impl<'a> IntoIterator for &'a BeatSequence {
    type Item = &'a Beat;
    type IntoIter = std::slice::Iter<'a, Beat>;

    fn into_iter(self) -> Self::IntoIter {
        self.beats.iter()
    }
}

/// On-disk shape: total duration plus `(timestamp, intensity)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SequenceRecord {
    duration: f64,
    beats: Vec<(f64, f32)>,
}

impl TryFrom<SequenceRecord> for BeatSequence {
    type Error = TimelineError;

    fn try_from(record: SequenceRecord) -> Result<Self> {
        let beats = record
            .beats
            .into_iter()
            .map(|(time, intensity)| Beat::new(time, intensity))
            .collect();
        Self::from_beats(beats, record.duration)
    }
}

impl From<BeatSequence> for SequenceRecord {
    fn from(sequence: BeatSequence) -> Self {
        Self {
            duration: sequence.duration,
            beats: sequence
                .beats
                .into_iter()
                .map(|beat| (beat.time, beat.intensity))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn accepts_strictly_increasing_beats() {
        let seq = BeatSequence::from_times(&[0.0, 2.0, 4.0], 5.0).unwrap();
        assert_eq!(seq.len(), 3);
        assert!(!seq.is_empty());
        assert_eq!(seq.duration(), 5.0);
        assert_eq!(seq.at(1).unwrap().time, 2.0);
    }

    #[test]
    fn last_beat_may_coincide_with_duration() {
        let seq = BeatSequence::from_times(&[1.0, 3.0], 3.0).unwrap();
        assert_eq!(seq.last().unwrap().time, 3.0);
    }

    #[test]
    fn rejects_unsorted_and_duplicate_timestamps() {
        let err = BeatSequence::from_times(&[0.0, 2.0, 1.0], 5.0).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidSequence(_)));

        let err = BeatSequence::from_times(&[1.0, 1.0], 5.0).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidSequence(_)));
    }

    #[test]
    fn rejects_out_of_bounds_values() {
        assert!(BeatSequence::from_times(&[-0.5], 5.0).is_err());
        assert!(BeatSequence::from_times(&[6.0], 5.0).is_err());
        assert!(BeatSequence::from_times(&[], -1.0).is_err());
        assert!(BeatSequence::from_times(&[f64::NAN], 5.0).is_err());
        assert!(BeatSequence::from_times(&[], f64::INFINITY).is_err());
        assert!(BeatSequence::from_beats(vec![Beat::new(1.0, 1.5)], 5.0).is_err());
    }

    #[test]
    fn empty_input_is_valid() {
        let seq = BeatSequence::from_beats(Vec::new(), 0.0).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.duration(), 0.0);
        assert_eq!(BeatSequence::empty(-3.0).duration(), 0.0);
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let seq = BeatSequence::from_times(&[0.5], 1.0).unwrap();
        match seq.at(1) {
            Err(TimelineError::IndexOutOfRange { index, len }) => {
                assert_eq!(index, 1);
                assert_eq!(len, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn estimates_tempo_from_spacing() {
        let seq = BeatSequence::from_times(&[0.0, 0.5, 1.0, 1.5], 2.0).unwrap();
        let tempo = seq.tempo_bpm().unwrap();
        assert!((tempo - 120.0).abs() < 1e-9);
        assert!(BeatSequence::from_times(&[0.0], 2.0).unwrap().tempo_bpm().is_none());
    }

    #[test]
    fn validated_sequences_are_monotonic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let duration = rng.random_range(0.0..60.0);
            let mut times: Vec<f64> = (0..rng.random_range(0..40))
                .map(|_| rng.random_range(0.0..=duration))
                .collect();
            times.sort_by(|a, b| a.total_cmp(b));
            times.dedup();

            let seq = BeatSequence::from_times(&times, duration).unwrap();
            for pair in seq.beats().windows(2) {
                assert!(pair[0].time < pair[1].time);
            }
        }
    }

    #[test]
    fn serialises_as_pairs_and_duration() {
        let seq = BeatSequence::from_beats(
            vec![Beat::new(0.5, 0.25), Beat::new(1.5, 1.0)],
            2.0,
        )
        .unwrap();
        let json = serde_json::to_value(&seq).unwrap();
        assert_eq!(json["duration"], 2.0);
        assert_eq!(json["beats"][0][0], 0.5);
        assert_eq!(json["beats"][0][1], 0.25);

        let decoded: BeatSequence = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, seq);
    }

    #[test]
    fn deserialisation_revalidates() {
        let result: std::result::Result<BeatSequence, _> =
            serde_json::from_str(r#"{ "duration": 1.0, "beats": [[0.8, 1.0], [0.2, 1.0]] }"#);
        assert!(result.is_err());
    }
}
