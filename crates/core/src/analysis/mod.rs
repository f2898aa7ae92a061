//! Energy-threshold onset detection.
//!
//! The detector splits the first channel into fixed windows, measures the RMS
//! energy of each one and reports a beat wherever the normalised energy jumps
//! above a threshold relative to the previous window. It is a pure function of
//! its inputs: running it twice on the same signal yields the same sequence.

mod synthetic;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{AudioSignal, Beat, BeatSequence, DetectorConfig};

pub use synthetic::{generate_synthetic, generate_synthetic_seeded};

/// Normalised per-window energies of a signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyProfile {
    pub sample_rate: u32,
    /// Window length in samples.
    pub window_len: usize,
    /// RMS energy of every window divided by the loudest window, in `[0, 1]`.
    /// All zero when the signal is silent.
    pub energies: Vec<f32>,
}

impl EnergyProfile {
    /// Start time of window `index` in seconds.
    pub fn window_start(&self, index: usize) -> f64 {
        (index * self.window_len) as f64 / self.sample_rate as f64
    }
}

/// Onset detector configured once and reusable across tracks.
#[derive(Debug, Clone, Default)]
pub struct OnsetDetector {
    config: DetectorConfig,
}

impl OnsetDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Number of samples per analysis window at `sample_rate`. Never zero.
    pub fn window_len(&self, sample_rate: u32) -> usize {
        let samples = (sample_rate as f64 * self.config.window_ms / 1000.0).floor();
        (samples as usize).max(1)
    }

    /// Computes the normalised energy of every analysis window.
    pub fn energy_profile(&self, signal: &AudioSignal) -> EnergyProfile {
        let never = AtomicBool::new(false);
        self.profile_with_cancel(signal, &never).unwrap_or_default()
    }

    /// Detects beats in `signal`. Silent, empty or featureless signals yield
    /// an empty sequence spanning the signal's duration.
    pub fn detect(&self, signal: &AudioSignal) -> BeatSequence {
        let never = AtomicBool::new(false);
        self.detect_cancellable(signal, &never)
            .unwrap_or_else(|| BeatSequence::empty(signal.duration()))
    }

    /// Like [`OnsetDetector::detect`] but gives up and returns `None` as soon
    /// as `cancel` is set. The flag is polled once per window.
    pub fn detect_cancellable(
        &self,
        signal: &AudioSignal,
        cancel: &AtomicBool,
    ) -> Option<BeatSequence> {
        let duration = signal.duration();
        let profile = self.profile_with_cancel(signal, cancel)?;
        let beats = self.pick_onsets(&profile);

        tracing::debug!(
            windows = profile.energies.len(),
            window_len = profile.window_len,
            beats = beats.len(),
            duration,
            "onset detection finished"
        );

        match BeatSequence::from_beats(beats, duration) {
            Ok(sequence) => Some(sequence),
            Err(err) => {
                tracing::warn!(%err, "detected beats failed validation, using whole track");
                Some(BeatSequence::empty(duration))
            }
        }
    }

    fn profile_with_cancel(
        &self,
        signal: &AudioSignal,
        cancel: &AtomicBool,
    ) -> Option<EnergyProfile> {
        let sample_rate = signal.sample_rate();
        let window_len = self.window_len(sample_rate);
        let samples = signal.channel(0).unwrap_or(&[]);

        let mut energies = energies_until_cancelled(samples, window_len, cancel)?;

        let max_energy = energies.iter().copied().fold(0.0f32, f32::max);
        if max_energy > 0.0 {
            for energy in &mut energies {
                *energy /= max_energy;
            }
        } else {
            energies.iter_mut().for_each(|energy| *energy = 0.0);
        }

        Some(EnergyProfile {
            sample_rate,
            window_len,
            energies,
        })
    }

    fn pick_onsets(&self, profile: &EnergyProfile) -> Vec<Beat> {
        let energies = &profile.energies;
        let mut beats = Vec::new();
        if energies.len() < 3 {
            return beats;
        }

        let DetectorConfig {
            threshold,
            sensitivity_ratio,
            min_beat_interval_segments,
            ..
        } = self.config;

        let mut last_beat: Option<usize> = None;
        // The first and last windows are never onset candidates.
        for i in 1..energies.len() - 1 {
            let energy = energies[i];
            let far_enough = last_beat
                .map(|last| i - last >= min_beat_interval_segments)
                .unwrap_or(true);

            if energy > threshold && energy > sensitivity_ratio * energies[i - 1] && far_enough {
                beats.push(Beat::new(profile.window_start(i), energy.clamp(0.0, 1.0)));
                last_beat = Some(i);
            }
        }

        beats
    }
}

/// Detects beats with the given parameters. Shorthand for
/// `OnsetDetector::new(config.clone()).detect(signal)`.
pub fn detect(signal: &AudioSignal, config: &DetectorConfig) -> BeatSequence {
    OnsetDetector::new(config.clone()).detect(signal)
}

/// Raw RMS energy of consecutive `window_len`-sample windows. The last
/// window may be shorter and is measured over the samples it holds.
pub fn window_energies(samples: &[f32], window_len: usize) -> Vec<f32> {
    let never = AtomicBool::new(false);
    energies_until_cancelled(samples, window_len, &never).unwrap_or_default()
}

fn energies_until_cancelled(
    samples: &[f32],
    window_len: usize,
    cancel: &AtomicBool,
) -> Option<Vec<f32>> {
    let window_len = window_len.max(1);
    let mut energies = Vec::with_capacity(samples.len().div_ceil(window_len));
    for window in samples.chunks(window_len) {
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!("onset detection cancelled");
            return None;
        }
        energies.push(compute_rms(window));
    }
    Some(energies)
}

/// Root-mean-square amplitude of `samples`; zero for an empty slice.
pub fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}
