use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{Beat, BeatSequence};

/// Generates a plausible beat grid for a track whose audio cannot be decoded.
///
/// Each step is `60 / bpm` seconds scaled by a random factor in
/// `[0.95, 1.05]`, and each beat gets an intensity in `[0.5, 1.0]`. Uses a
/// fresh random seed; see [`generate_synthetic_seeded`] for repeatable output.
pub fn generate_synthetic(duration: f64, bpm: f64) -> BeatSequence {
    let seed: u64 = rand::rng().random();
    generate_synthetic_seeded(duration, bpm, seed)
}

/// Seeded variant of [`generate_synthetic`]. The same seed always yields the
/// same sequence.
pub fn generate_synthetic_seeded(duration: f64, bpm: f64, seed: u64) -> BeatSequence {
    if !bpm.is_finite() || bpm <= 0.0 {
        tracing::warn!(bpm, "synthetic beats need a positive tempo");
        return BeatSequence::empty(duration);
    }
    if !duration.is_finite() || duration <= 0.0 {
        return BeatSequence::empty(duration);
    }

    let interval = 60.0 / bpm;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut beats = Vec::new();
    let mut time = 0.0f64;

    while time < duration {
        beats.push(Beat::new(time, rng.random_range(0.5..=1.0)));

        let next = time + interval * rng.random_range(0.95..=1.05);
        if next <= time {
            // Step vanished below the precision of `time`.
            break;
        }
        time = next;
    }

    match BeatSequence::from_beats(beats, duration) {
        Ok(sequence) => sequence,
        Err(err) => {
            tracing::warn!(%err, "synthetic beats failed validation, using whole track");
            BeatSequence::empty(duration)
        }
    }
}
