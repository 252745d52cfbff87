use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;

use super::info::track_beats;
use super::{TrackId, TrackInfo, TrackState};
use crate::analysis::FrequencyReader;
use crate::clock::Clock;
use crate::histogram::SignalStats;
use crate::input::AudioInputId;
use crate::lockfree::{AtomicDouble, AtomicFlag, AtomicFloat, AtomicTime};
use crate::metering::AtomicSignalStats;
use crate::time::{AudioSample, Beat, ContinuousDuration, Duration, Time};

/// The part of a track both threads see.
///
/// Every field is written with a single store by exactly one side: `state`
/// by the control thread for `FinishRecording` and by the audio thread for
/// every other transition, the rest by the audio thread except mute, pan and
/// volume.
pub(crate) struct TrackShared {
    id: TrackId,
    input: AudioInputId,
    state: AtomicU8,
    beat_duration: AtomicI64,
    start_time: AtomicTime<AudioSample>,
    discrete_duration: AtomicI64,
    exact_duration: AtomicDouble,
    last_sample_time: AtomicTime<AudioSample>,
    muted: AtomicFlag,
    pan: Arc<AtomicFloat>,
    volume: Arc<AtomicFloat>,
    just_stopped_recording: AtomicFlag,
    volume_stats: Arc<AtomicSignalStats>,
    timing_stats: AtomicSignalStats,
    frequency: Option<Arc<dyn FrequencyReader>>,
}

impl TrackShared {
    pub(crate) fn new(
        id: TrackId,
        input: AudioInputId,
        provisional_start: Time<AudioSample>,
        pan: Arc<AtomicFloat>,
        volume: Arc<AtomicFloat>,
        volume_stats: Arc<AtomicSignalStats>,
        frequency: Option<Arc<dyn FrequencyReader>>,
    ) -> Self {
        Self {
            id,
            input,
            state: AtomicU8::new(TrackState::Uninitialized.to_u8()),
            beat_duration: AtomicI64::new(1),
            start_time: AtomicTime::new(provisional_start),
            discrete_duration: AtomicI64::new(0),
            exact_duration: AtomicDouble::new(0.0),
            last_sample_time: AtomicTime::new(provisional_start),
            muted: AtomicFlag::new(false),
            pan,
            volume,
            just_stopped_recording: AtomicFlag::new(false),
            volume_stats,
            timing_stats: AtomicSignalStats::new(),
            frequency,
        }
    }

    pub(crate) fn id(&self) -> TrackId {
        self.id
    }

    pub(crate) fn input(&self) -> AudioInputId {
        self.input
    }

    #[inline]
    pub(crate) fn state(&self) -> TrackState {
        TrackState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set_state(&self, state: TrackState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    /// Audio thread, on installation. Loses to an early `request_finish_recording`.
    pub(crate) fn mark_recording(&self) {
        let _ = self.state.compare_exchange(
            TrackState::Uninitialized.to_u8(),
            TrackState::Recording.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Control thread. Moves a recording (or not yet installed) track to
    /// `FinishRecording`; the audio thread picks it up on its next callback.
    pub(crate) fn request_finish_recording(&self) -> Result<(), TrackState> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let state = TrackState::from_u8(current);
            if !matches!(state, TrackState::Uninitialized | TrackState::Recording) {
                return Err(state);
            }
            match self.state.compare_exchange_weak(
                current,
                TrackState::FinishRecording.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn beat_duration(&self) -> Duration<Beat> {
        Duration::new(self.beat_duration.load(Ordering::Acquire))
    }

    pub(crate) fn set_beat_duration(&self, beats: Duration<Beat>) {
        self.beat_duration.store(beats.value(), Ordering::Release);
    }

    pub(crate) fn start_time(&self) -> Time<AudioSample> {
        self.start_time.get()
    }

    pub(crate) fn set_start_time(&self, time: Time<AudioSample>) {
        self.start_time.set(time);
    }

    pub(crate) fn discrete_duration(&self) -> Duration<AudioSample> {
        Duration::new(self.discrete_duration.load(Ordering::Acquire))
    }

    pub(crate) fn set_discrete_duration(&self, duration: Duration<AudioSample>) {
        self.discrete_duration.store(duration.value(), Ordering::Release);
    }

    pub(crate) fn exact_duration(&self) -> ContinuousDuration<AudioSample> {
        ContinuousDuration::new(self.exact_duration.get())
    }

    pub(crate) fn set_exact_duration(&self, duration: ContinuousDuration<AudioSample>) {
        self.exact_duration.set(duration.value());
    }

    pub(crate) fn set_last_sample_time(&self, time: Time<AudioSample>) {
        self.last_sample_time.set(time);
    }

    pub(crate) fn is_muted(&self) -> bool {
        self.muted.get()
    }

    pub(crate) fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }

    pub(crate) fn pan(&self) -> &Arc<AtomicFloat> {
        &self.pan
    }

    pub(crate) fn volume(&self) -> &Arc<AtomicFloat> {
        &self.volume
    }

    pub(crate) fn signal_stats(&self) -> SignalStats {
        self.volume_stats.get()
    }

    pub(crate) fn set_timing_stats(&self, stats: SignalStats) {
        self.timing_stats.set(stats);
    }

    pub(crate) fn frequency(&self) -> Option<&Arc<dyn FrequencyReader>> {
        self.frequency.as_ref()
    }

    pub(crate) fn set_just_stopped_recording(&self) {
        self.just_stopped_recording.set(true);
    }

    /// True exactly once after the track starts looping.
    pub(crate) fn take_just_stopped_recording(&self) -> bool {
        self.just_stopped_recording.swap(false)
    }

    pub(crate) fn beat_position_now(&self, clock: &Clock) -> ContinuousDuration<Beat> {
        track_beats(clock, clock.now() - self.start_time(), self.beat_duration())
    }

    pub(crate) fn info(&self, clock: &Clock) -> TrackInfo {
        let state = self.state();
        let start_time = self.start_time();
        let beat_duration = self.beat_duration();
        let local_clock_time = clock.now() - start_time;
        let is_looping = state == TrackState::Looping;

        TrackInfo {
            state,
            is_looping,
            start_time,
            start_beat: clock.time_to_beats(start_time).value(),
            duration_samples: self.discrete_duration(),
            duration_beats: beat_duration,
            exact_duration: if is_looping {
                self.exact_duration().value()
            } else {
                0.0
            },
            local_clock_time,
            local_clock_beat: track_beats(clock, local_clock_time, beat_duration).value(),
            last_sample_time: self.last_sample_time.get() - start_time,
            pan: self.pan.get(),
            volume: self.volume.get(),
            muted: self.is_muted(),
            volume_stats: self.volume_stats.get(),
            timing_stats: self.timing_stats.get(),
        }
    }
}

impl core::fmt::Debug for TrackShared {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackShared")
            .field("id", &self.id)
            .field("input", &self.input)
            .field("state", &self.state())
            .field("beat_duration", &self.beat_duration())
            .finish()
    }
}
