//! Stateless lookups from a playback position to the beat timeline.
//!
//! Every function here is a pure function of the sequence and the query time,
//! so it can be called from a per-frame update loop, after an arbitrary seek,
//! or from several threads at once without any coordination.

use crate::{BeatSequence, MapperConfig};

/// Index of the segment playing at time `t`.
///
/// Segment `i` covers `[beat[i], beat[i + 1])`, and the last one runs up to
/// the track duration. A time sitting exactly on a beat belongs to the segment
/// that starts there. Returns `None` before the first beat, at or past the end
/// of the track, and for non-finite `t`. A sequence without beats has a single
/// segment spanning `[0, duration)`.
///
/// The one exception to the on-beat rule is a last beat placed exactly at
/// `duration`: its segment is empty, so `t == duration` still yields `None`.
///
/// Runs in `O(log n)`.
pub fn active_segment(seq: &BeatSequence, t: f64) -> Option<usize> {
    if !t.is_finite() || t >= seq.duration() {
        return None;
    }

    if seq.is_empty() {
        return (t >= 0.0).then_some(0);
    }

    seq.beats()
        .partition_point(|beat| beat.time <= t)
        .checked_sub(1)
}

/// Index of the beat closest to `t`, if it lies strictly within
/// `tolerance_seconds`. Equidistant beats resolve to the earlier one.
///
/// Meant for hover previews. It may return `None` while
/// [`active_segment`] reports a segment for the same time.
pub fn nearest_beat(seq: &BeatSequence, t: f64, tolerance_seconds: f64) -> Option<usize> {
    if !t.is_finite() || tolerance_seconds.is_nan() || tolerance_seconds <= 0.0 {
        return None;
    }

    let beats = seq.beats();
    let above = beats.partition_point(|beat| beat.time < t);

    let candidate = match (above.checked_sub(1), beats.get(above)) {
        (Some(below), Some(next)) => {
            if t - beats[below].time <= next.time - t {
                below
            } else {
                above
            }
        }
        (Some(below), None) => below,
        (None, Some(_)) => above,
        (None, None) => return None,
    };

    ((beats[candidate].time - t).abs() < tolerance_seconds).then_some(candidate)
}

/// Timestamp of the beat [`nearest_beat`] picks, for snapping a scrub
/// position onto the grid.
pub fn snap_to_beat(seq: &BeatSequence, t: f64, tolerance_seconds: f64) -> Option<f64> {
    nearest_beat(seq, t, tolerance_seconds).map(|index| seq.beats()[index].time)
}

/// Mapper bound to a hover tolerance. Holds no playback state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapper {
    tolerance_seconds: f64,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(&MapperConfig::default())
    }
}

impl Mapper {
    pub fn new(config: &MapperConfig) -> Self {
        Self {
            tolerance_seconds: config.tolerance_seconds,
        }
    }

    pub fn tolerance_seconds(&self) -> f64 {
        self.tolerance_seconds
    }

    pub fn active_segment(&self, seq: &BeatSequence, t: f64) -> Option<usize> {
        active_segment(seq, t)
    }

    pub fn nearest_beat(&self, seq: &BeatSequence, t: f64) -> Option<usize> {
        nearest_beat(seq, t, self.tolerance_seconds)
    }

    pub fn snap(&self, seq: &BeatSequence, t: f64) -> Option<f64> {
        snap_to_beat(seq, t, self.tolerance_seconds)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::derive_segments;

    fn example() -> BeatSequence {
        BeatSequence::from_times(&[0.0, 2.0, 4.0], 5.0).unwrap()
    }

    /// Straight scan over the segment definition, used to cross-check the
    /// binary search.
    fn active_segment_linear(seq: &BeatSequence, t: f64) -> Option<usize> {
        if !t.is_finite() {
            return None;
        }
        if seq.is_empty() {
            return (0.0 <= t && t < seq.duration()).then_some(0);
        }
        let beats = seq.beats();
        let mut active = None;
        for (i, beat) in beats.iter().enumerate() {
            let end = beats.get(i + 1).map_or(seq.duration(), |next| next.time);
            if beat.time <= t && t < end {
                active = Some(i);
            }
        }
        active
    }

    fn random_sequence(rng: &mut StdRng) -> BeatSequence {
        let duration = rng.random_range(0.0f64..30.0);
        let mut times: Vec<f64> = (0..rng.random_range(0..25))
            .map(|_| (rng.random_range(0.0..=duration) * 4.0).round() / 4.0)
            .filter(|&t| t <= duration)
            .collect();
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup();
        BeatSequence::from_times(&times, duration).unwrap()
    }

    #[test]
    fn resolves_example_positions() {
        let seq = example();
        assert_eq!(active_segment(&seq, 0.0), Some(0));
        assert_eq!(active_segment(&seq, 3.5), Some(1));
        assert_eq!(active_segment(&seq, 4.0), Some(2));
        assert_eq!(active_segment(&seq, 4.999), Some(2));
        assert_eq!(active_segment(&seq, -0.1), None);
        assert_eq!(active_segment(&seq, 5.0), None);
        assert_eq!(active_segment(&seq, f64::NAN), None);
    }

    #[test]
    fn exact_boundary_selects_starting_segment() {
        let seq = example();
        for i in 0..seq.len() {
            let t = seq.at(i).unwrap().time;
            assert_eq!(active_segment(&seq, t), Some(i));
        }
    }

    #[test]
    fn time_before_first_beat_has_no_segment() {
        let seq = BeatSequence::from_times(&[1.0, 2.0], 3.0).unwrap();
        assert_eq!(active_segment(&seq, 0.999), None);
        assert_eq!(active_segment(&seq, 1.0), Some(0));
    }

    #[test]
    fn empty_sequence_has_single_segment() {
        let seq = BeatSequence::empty(3.0);
        assert_eq!(active_segment(&seq, 0.0), Some(0));
        assert_eq!(active_segment(&seq, 2.9), Some(0));
        assert_eq!(active_segment(&seq, 3.0), None);
        assert_eq!(active_segment(&seq, -0.5), None);
        assert_eq!(active_segment(&BeatSequence::empty(0.0), 0.0), None);
    }

    #[test]
    fn zero_length_final_segment_is_never_active() {
        let seq = BeatSequence::from_times(&[0.0, 3.0], 3.0).unwrap();
        assert_eq!(active_segment(&seq, 2.999), Some(0));
        assert_eq!(active_segment(&seq, 3.0), None);
    }

    #[test]
    fn binary_search_agrees_with_linear_scan() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..300 {
            let seq = random_sequence(&mut rng);
            let mut queries: Vec<f64> = seq.times().collect();
            queries.extend([-1.0, 0.0, seq.duration(), seq.duration() + 1.0]);
            queries.extend((0..20).map(|_| rng.random_range(-1.0..=seq.duration() + 1.0)));

            for t in queries {
                assert_eq!(
                    active_segment(&seq, t),
                    active_segment_linear(&seq, t),
                    "t = {t}, seq = {seq:?}"
                );
            }
        }
    }

    #[test]
    fn every_covered_time_has_exactly_one_segment() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let seq = random_sequence(&mut rng);
            let segments = derive_segments(&seq);
            for _ in 0..20 {
                let t = rng.random_range(-1.0..=seq.duration() + 1.0);
                let containing: Vec<usize> = segments
                    .iter()
                    .filter(|segment| segment.contains(t))
                    .map(|segment| segment.index)
                    .collect();
                assert!(containing.len() <= 1);
                assert_eq!(active_segment(&seq, t), containing.first().copied());
            }
        }
    }

    #[test]
    fn finds_nearest_beat_within_tolerance() {
        let seq = example();
        assert_eq!(nearest_beat(&seq, 4.9, 2.0), Some(2));
        assert_eq!(nearest_beat(&seq, 10.0, 2.0), None);
        assert_eq!(nearest_beat(&seq, 2.4, 2.0), Some(1));
        assert_eq!(nearest_beat(&seq, -1.5, 2.0), Some(0));
        assert_eq!(nearest_beat(&BeatSequence::empty(5.0), 1.0, 2.0), None);
    }

    #[test]
    fn tolerance_is_exclusive() {
        let seq = example();
        assert_eq!(nearest_beat(&seq, 6.0, 2.0), None);
        assert_eq!(nearest_beat(&seq, 5.5, 2.0), Some(2));
        assert_eq!(nearest_beat(&seq, 1.0, 0.0), None);
    }

    #[test]
    fn equidistant_beats_prefer_earlier() {
        let seq = example();
        assert_eq!(nearest_beat(&seq, 1.0, 2.0), Some(0));
        assert_eq!(nearest_beat(&seq, 3.0, 2.0), Some(1));
    }

    #[test]
    fn nearest_beat_may_miss_while_segment_is_active() {
        let seq = BeatSequence::from_times(&[0.0, 10.0], 20.0).unwrap();
        assert_eq!(active_segment(&seq, 5.0), Some(0));
        assert_eq!(nearest_beat(&seq, 5.0, 2.0), None);
    }

    #[test]
    fn nearest_beat_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..300 {
            let seq = random_sequence(&mut rng);
            let tolerance = rng.random_range(0.1..3.0);
            for _ in 0..20 {
                let t = rng.random_range(-3.0..=seq.duration() + 3.0);
                let expected = seq
                    .times()
                    .enumerate()
                    .map(|(i, time)| (i, (time - t).abs()))
                    .fold(None::<(usize, f64)>, |best, (i, d)| match best {
                        Some((_, best_d)) if best_d <= d => best,
                        _ => Some((i, d)),
                    })
                    .filter(|&(_, d)| d < tolerance)
                    .map(|(i, _)| i);
                assert_eq!(nearest_beat(&seq, t, tolerance), expected, "t = {t}");
            }
        }
    }

    #[test]
    fn mapper_uses_configured_tolerance() {
        let seq = example();
        let mapper = Mapper::new(&MapperConfig {
            tolerance_seconds: 0.5,
        });
        assert_eq!(mapper.nearest_beat(&seq, 2.4), Some(1));
        assert_eq!(mapper.snap(&seq, 2.4), Some(2.0));
        assert_eq!(mapper.nearest_beat(&seq, 2.6), None);
        assert_eq!(mapper.active_segment(&seq, 2.6), Some(1));
        assert_eq!(Mapper::default().tolerance_seconds(), 2.0);
    }
}
