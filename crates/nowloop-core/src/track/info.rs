use serde::{Deserialize, Serialize};

use super::TrackState;
use crate::clock::Clock;
use crate::histogram::SignalStats;
use crate::time::{AudioSample, Beat, ContinuousDuration, Duration, Time};

/// Snapshot of one track for the control surface.
///
/// Fields are read one at a time while the audio thread keeps running, so two
/// fields may come from consecutive callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub state: TrackState,
    pub is_looping: bool,
    /// Absolute time of the first recorded sample, pre-recording included.
    pub start_time: Time<AudioSample>,
    pub start_beat: f64,
    /// Samples recorded so far, or the loop length once looping.
    pub duration_samples: Duration<AudioSample>,
    /// Current quantized length.
    pub duration_beats: Duration<Beat>,
    /// Fractional loop length; zero until looping.
    pub exact_duration: f64,
    /// Samples since `start_time`.
    pub local_clock_time: Duration<AudioSample>,
    /// Beat position within the loop, with its fractional part.
    pub local_clock_beat: f64,
    /// Playback cursor relative to `start_time`.
    pub last_sample_time: Duration<AudioSample>,
    pub pan: f32,
    pub volume: f32,
    pub muted: bool,
    pub volume_stats: SignalStats,
    /// Samples elapsed between consecutive callbacks.
    pub timing_stats: SignalStats,
}

/// Position within a loop of `beat_duration` beats after `local_time` has elapsed.
///
/// Whole beats wrap modulo the loop length; the fractional beat is kept as is.
pub fn track_beats(
    clock: &Clock,
    local_time: Duration<AudioSample>,
    beat_duration: Duration<Beat>,
) -> ContinuousDuration<Beat> {
    let beats = clock.duration_to_beats(local_time);
    let whole = beats.floor();
    ContinuousDuration::new(whole.rem_euclid(beat_duration).value() as f64 + beats.fract())
}
