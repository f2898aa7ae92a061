//! Core library of the Beat Timeline engine.
//!
//! The crate turns decoded audio into an ordered list of beats, splits the
//! track into beat-bounded segments for clip placement, and maps playback
//! positions onto those segments. Data flows leaf to root:
//! [`AudioSignal`] → [`OnsetDetector`] → [`BeatSequence`] →
//! [`derive_segments`], while the [`mapper`] functions answer "which segment
//! is playing" and "which beat is under the cursor" against the same
//! sequence.

pub mod analysis;
pub mod audio;
pub mod beats;
pub mod config;
pub mod error;
pub mod mapper;
pub mod segments;
pub mod template;
pub mod timeline;

pub use analysis::{
    compute_rms, detect, generate_synthetic, generate_synthetic_seeded, window_energies,
    EnergyProfile, OnsetDetector,
};
pub use audio::AudioSignal;
pub use beats::{Beat, BeatSequence};
pub use config::{AppConfig, DetectorConfig, MapperConfig, SyntheticConfig};
pub use error::{Result, TimelineError};
pub use mapper::{active_segment, nearest_beat, snap_to_beat, Mapper};
pub use segments::{derive_segments, plan_clips, total_duration, ClipSlot, Segment};
pub use template::Template;
pub use timeline::{
    format_clock, fraction_of, time_at_fraction, PlaybackPosition, Timeline, TimelineSnapshot,
};
