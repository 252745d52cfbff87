//! Sample-accurate clock shared by every input and track of one graph.
//!
//! The audio thread is the only writer of `now`; it advances it by exactly the
//! delivered block length once per callback. Tempo may be changed from the
//! control thread. Tempo and the cached beat length are two separate atomics,
//! so a tempo change that races an audio callback can be observed up to one
//! block late. That lag is accepted; nothing in the looper requires a tempo
//! change to be instantaneous.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::lockfree::{AtomicDouble, AtomicFloat};
use crate::time::{AudioSample, Beat, ContinuousDuration, Duration, Second, Time};

/// Snapshot of the graph's musical time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInfo {
    /// Samples elapsed since the graph started.
    pub time_in_samples: Time<AudioSample>,
    /// Current beat including its fractional part.
    pub exact_beat: f64,
    pub beats_per_minute: f32,
    /// Position within the current measure, `0..beats_per_measure`.
    pub beat_in_measure: u32,
}

pub struct Clock {
    sample_rate_hz: u32,
    channel_count: usize,
    beats_per_measure: u32,
    beats_per_minute: AtomicFloat,
    /// Samples per beat, derived from tempo.
    beat_duration: AtomicDouble,
    now: AtomicI64,
}

impl Clock {
    pub fn new(
        sample_rate_hz: u32,
        channel_count: usize,
        beats_per_minute: f32,
        beats_per_measure: u32,
    ) -> Self {
        assert!(sample_rate_hz > 0, "sample rate must be positive");
        assert!(beats_per_minute > 0.0, "tempo must be positive");
        assert!(beats_per_measure > 0, "a measure needs at least one beat");

        Self {
            sample_rate_hz,
            channel_count,
            beats_per_measure,
            beats_per_minute: AtomicFloat::new(beats_per_minute),
            beat_duration: AtomicDouble::new(Self::samples_per_beat(
                sample_rate_hz,
                beats_per_minute,
            )),
            now: AtomicI64::new(0),
        }
    }

    #[inline]
    fn samples_per_beat(sample_rate_hz: u32, beats_per_minute: f32) -> f64 {
        sample_rate_hz as f64 * 60.0 / beats_per_minute as f64
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    pub fn beats_per_minute(&self) -> f32 {
        self.beats_per_minute.get()
    }

    /// Change tempo and recompute the cached beat length.
    pub fn set_beats_per_minute(&self, beats_per_minute: f32) {
        assert!(beats_per_minute > 0.0, "tempo must be positive");
        self.beats_per_minute.set(beats_per_minute);
        self.beat_duration
            .set(Self::samples_per_beat(self.sample_rate_hz, beats_per_minute));
    }

    /// Current absolute time: the number of samples the audio thread has processed.
    #[inline]
    pub fn now(&self) -> Time<AudioSample> {
        Time::new(self.now.load(Ordering::Acquire))
    }

    /// Advance `now` by one delivered block. Audio thread only, once per callback.
    #[inline]
    pub fn advance_from_audio_graph(&self, duration: Duration<AudioSample>) {
        debug_assert!(duration.value() >= 0);
        // Single writer, so load + store is enough.
        let now = self.now.load(Ordering::Relaxed);
        self.now.store(now + duration.value(), Ordering::Release);
    }

    /// Length of one beat in (fractional) samples.
    #[inline]
    pub fn beat_duration(&self) -> ContinuousDuration<AudioSample> {
        ContinuousDuration::new(self.beat_duration.get())
    }

    #[inline]
    pub fn beats_to_samples(&self, beats: ContinuousDuration<Beat>) -> ContinuousDuration<AudioSample> {
        ContinuousDuration::new(beats.value() * self.beat_duration.get())
    }

    /// Whole samples in `seconds`, truncated.
    #[inline]
    pub fn seconds_to_samples(&self, seconds: ContinuousDuration<Second>) -> Duration<AudioSample> {
        ContinuousDuration::<AudioSample>::new(seconds.value() * self.sample_rate_hz as f64).floor()
    }

    /// Beats elapsed between time zero and `time`.
    #[inline]
    pub fn time_to_beats(&self, time: Time<AudioSample>) -> ContinuousDuration<Beat> {
        self.duration_to_beats(time - Time::new(0))
    }

    #[inline]
    pub fn duration_to_beats(&self, duration: Duration<AudioSample>) -> ContinuousDuration<Beat> {
        ContinuousDuration::new(duration.value() as f64 / self.beat_duration.get())
    }

    pub fn time_info(&self) -> TimeInfo {
        let now = self.now();
        let exact_beat = self.time_to_beats(now).value();
        TimeInfo {
            time_in_samples: now,
            exact_beat,
            beats_per_minute: self.beats_per_minute(),
            beat_in_measure: (exact_beat.floor() as u64 % self.beats_per_measure as u64) as u32,
        }
    }
}

impl core::fmt::Debug for Clock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Clock")
            .field("sample_rate_hz", &self.sample_rate_hz)
            .field("beats_per_minute", &self.beats_per_minute())
            .field("now", &self.now())
            .finish()
    }
}
