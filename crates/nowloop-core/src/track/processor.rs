//! Audio-thread half of a track.

use std::sync::Arc;

use super::shared::TrackShared;
use super::state::next_beat_duration;
use super::{TrackId, TrackState};
use crate::analysis::{FrequencyReader, FrequencyTracker};
use crate::clock::Clock;
use crate::graph::GraphContext;
use crate::histogram::Histogram;
use crate::input::AudioInputId;
use crate::metering::MeasurementProcessor;
use crate::processor::{BlockProcessor, StereoBlock};
use crate::spatial::StereoPanner;
use crate::stream::SliceStream;
use crate::time::{AudioSample, Beat, ContinuousDuration, Duration, Interval, Time};

const SILENCE: [f32; 256] = [0.0; 256];

/// One loop. Built on the control thread, then owned and driven by the audio thread.
pub(crate) struct Track {
    shared: Arc<TrackShared>,
    clock: Arc<Clock>,
    /// One stream per source channel.
    streams: Vec<SliceStream>,
    source_channels: usize,
    beat_duration: Duration<Beat>,
    /// Playback cursor; only moves while looping.
    last_sample_time: Time<AudioSample>,
    pre_recording: Duration<AudioSample>,
    /// Exact loop length, fixed by the first finishing block.
    finish_target: Option<ContinuousDuration<AudioSample>>,
    panner: StereoPanner,
    meter: MeasurementProcessor,
    timing: Histogram,
}

impl Track {
    pub(crate) fn new(
        id: TrackId,
        input: AudioInputId,
        source_channels: usize,
        context: &GraphContext,
        frequency: Option<(Box<dyn FrequencyTracker>, Arc<dyn FrequencyReader>)>,
    ) -> Self {
        assert!(
            source_channels == 1 || source_channels == 2,
            "tracks record one or two channels"
        );
        let config = context.config();
        let clock = context.clock().clone();
        let pre_recording = context.pre_recording();
        let provisional_start = clock.now() - pre_recording;

        let (tracker, reader) = match frequency {
            Some((tracker, reader)) => (Some(tracker), Some(reader)),
            None => (None, None),
        };
        let panner = StereoPanner::new(config.initial_pan, config.initial_volume);
        let meter = MeasurementProcessor::new(context.volume_window(), tracker);
        let shared = Arc::new(TrackShared::new(
            id,
            input,
            provisional_start,
            panner.pan().clone(),
            panner.volume().clone(),
            meter.stats().clone(),
            reader,
        ));

        let streams = (0..source_channels)
            .map(|_| SliceStream::new(provisional_start, context.allocator().clone()))
            .collect();

        Self {
            shared,
            last_sample_time: clock.now(),
            clock,
            streams,
            source_channels,
            beat_duration: Duration::new(1),
            pre_recording,
            finish_target: None,
            panner,
            meter,
            timing: Histogram::new(config.quantum_histogram_capacity),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<TrackShared> {
        &self.shared
    }

    pub(crate) fn id(&self) -> TrackId {
        self.shared.id()
    }

    pub(crate) fn input(&self) -> AudioInputId {
        self.shared.input()
    }

    #[cfg(test)]
    pub(crate) fn streams(&self) -> &[SliceStream] {
        &self.streams
    }

    /// Audio thread, when the track enters the graph at `now`.
    ///
    /// The streams start `pre_recording` before `now` and are filled from the
    /// input's history; whatever the history no longer (or not yet) holds
    /// becomes silence. Playback begins at the stream start.
    pub(crate) fn install(&mut self, now: Time<AudioSample>, history: &[SliceStream]) {
        let start = now - self.pre_recording;
        for stream in &mut self.streams {
            stream.reset_initial_time(start);
        }

        if self.pre_recording.value() > 0 {
            assert_eq!(
                history.len(),
                self.streams.len(),
                "input history does not match track channels"
            );
            let wanted = Interval::new(start, self.pre_recording);
            for (stream, source) in self.streams.iter_mut().zip(history) {
                copy_history(source, wanted, stream);
            }
        }

        self.quantize(self.streams[0].discrete_duration());
        self.last_sample_time = start;
        self.shared.set_start_time(start);
        self.shared.set_last_sample_time(start);
        self.shared.set_discrete_duration(self.streams[0].discrete_duration());
        self.shared.mark_recording();
    }

    /// Record or play one block. `left`/`right` receive this track's stereo output.
    pub(crate) fn process(&mut self, source: &[&[f32]], left: &mut [f32], right: &mut [f32]) {
        assert_eq!(
            source.len(),
            self.source_channels,
            "track fed the wrong number of channels"
        );

        match self.shared.state() {
            TrackState::Uninitialized => {
                left.fill(0.0);
                right.fill(0.0);
            }
            TrackState::Recording => {
                self.record(source);
                left.fill(0.0);
                right.fill(0.0);
            }
            TrackState::FinishRecording => {
                self.finish_recording(source);
                left.fill(0.0);
                right.fill(0.0);
            }
            TrackState::Looping => self.play(left, right),
        }
    }

    /// Feed the callback-to-callback interval into the timing window.
    pub(crate) fn record_timing(&mut self, samples_since_last: f32) {
        self.timing.add(samples_since_last);
        self.shared.set_timing_stats(self.timing.stats());
    }

    fn record(&mut self, source: &[&[f32]]) {
        let frames = Duration::from_len(source[0].len());
        self.quantize(self.streams[0].discrete_duration() + frames);

        for (stream, samples) in self.streams.iter_mut().zip(source) {
            stream.append(samples);
        }
        self.shared.set_discrete_duration(self.streams[0].discrete_duration());
    }

    /// Grow the loop until `recorded` no longer covers it in whole beats.
    fn quantize(&mut self, recorded: Duration<AudioSample>) {
        let complete_beats: Duration<Beat> = self.clock.duration_to_beats(recorded).floor();
        // A block longer than a beat can cross more than one boundary.
        while complete_beats >= self.beat_duration {
            self.beat_duration = next_beat_duration(self.beat_duration);
        }
        self.shared.set_beat_duration(self.beat_duration);
    }

    fn finish_recording(&mut self, source: &[&[f32]]) {
        let frames = source[0].len();
        let recorded = self.streams[0].discrete_duration();
        let exact = match self.finish_target {
            Some(exact) => exact,
            None => {
                // The tempo may have risen since the last recorded block.
                self.quantize(recorded);
                let exact = self.clock.beat_duration() * self.beat_duration.value() as f64;
                self.finish_target = Some(exact);
                exact
            }
        };
        let rounded = exact.ceil();
        assert!(
            recorded <= rounded,
            "track {} recorded {:?} past its loop length {:?}",
            self.id(),
            recorded,
            rounded
        );

        if recorded + Duration::from_len(frames) < rounded {
            for (stream, samples) in self.streams.iter_mut().zip(source) {
                stream.append(samples);
            }
            self.shared.set_discrete_duration(self.streams[0].discrete_duration());
            return;
        }

        // The rest of this block is dropped.
        let capture = (rounded - recorded).as_len();
        for (stream, samples) in self.streams.iter_mut().zip(source) {
            stream.append(&samples[..capture]);
            stream.shut(exact);
        }

        self.shared.set_discrete_duration(self.streams[0].discrete_duration());
        self.shared.set_exact_duration(exact);
        self.shared.set_state(TrackState::Looping);
        self.shared.set_just_stopped_recording();
    }

    fn play(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len();
        let mut done = 0;
        while done < frames {
            let interval = Interval::new(self.last_sample_time, Duration::from_len(frames - done));
            let slice = self.streams[0].get_slice_containing(interval);
            slice.copy_to(&mut left[done..]);
            let count = slice.samples().len();

            if self.source_channels == 2 {
                let slice = self.streams[1].get_slice_containing(interval);
                assert_eq!(slice.samples().len(), count, "track channels out of step");
                slice.copy_to(&mut right[done..]);
            }

            done += count;
            self.last_sample_time += Duration::from_len(count);
        }
        self.shared.set_last_sample_time(self.last_sample_time);

        if self.shared.is_muted() {
            left.fill(0.0);
            right.fill(0.0);
        }

        let mut block = StereoBlock::new(left, right, self.source_channels);
        self.meter.process_block(&mut block);
        self.panner.process_block(&mut block);
    }
}

/// Append `wanted` from `source` to `dest`, padding the part `source` does not cover with silence.
fn copy_history(source: &SliceStream, wanted: Interval<AudioSample>, dest: &mut SliceStream) {
    let available = source.interval();
    let from = wanted.start().max(available.start()).min(wanted.end());
    let to = wanted.end().min(available.end()).max(from);

    let mut missing = (from - wanted.start()).as_len();
    while missing > 0 {
        let count = missing.min(SILENCE.len());
        dest.append(&SILENCE[..count]);
        missing -= count;
    }

    if to > from {
        source.append_slice_range(Interval::new(from, to - from), dest);
    }

    let mut trailing = (wanted.end() - to).as_len();
    while trailing > 0 {
        let count = trailing.min(SILENCE.len());
        dest.append(&SILENCE[..count]);
        trailing -= count;
    }
}
