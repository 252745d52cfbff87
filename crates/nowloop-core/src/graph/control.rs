//! Control-thread half of the graph.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use super::command::GraphCommand;
use super::processor::GraphProcessor;
use super::registry::TrackRegistry;
use super::{GraphContext, GraphInfo, GraphShared, GraphState};
use crate::analysis::FrequencyAnalyzer;
use crate::clock::{Clock, TimeInfo};
use crate::config::{GraphConfig, InputChannels};
use crate::histogram::SignalStats;
use crate::input::{AudioInputId, Input, InputProcessor, InputShared};
use crate::metering::MeasurementProcessor;
use crate::time::{Beat, ContinuousDuration};
use crate::track::{Track, TrackId, TrackInfo, TrackShared, TrackState};
use crate::{Error, Result};

const STATE_POLL_INTERVAL: StdDuration = StdDuration::from_millis(1);

struct GraphInner {
    context: GraphContext,
    shared: Arc<GraphShared>,
    inputs: Vec<Arc<InputShared>>,
    registry: Mutex<TrackRegistry>,
    commands: Sender<GraphCommand>,
    retired: Receiver<Box<Track>>,
    analyzer: Option<Arc<dyn FrequencyAnalyzer>>,
}

/// Control surface of a running looper.
///
/// Every operation here either writes a single field the audio thread reads
/// on its next callback or queues a command for it; none of them wait for
/// the audio thread.
#[derive(Clone)]
pub struct LoopGraph {
    inner: Arc<GraphInner>,
}

impl LoopGraph {
    pub fn builder() -> LoopGraphBuilder {
        LoopGraphBuilder::default()
    }

    pub fn state(&self) -> GraphState {
        self.inner.shared.state()
    }

    /// Poll until the graph reaches `expected`. False if `timeout` passes first.
    pub fn wait_for_state(&self, expected: GraphState, timeout: StdDuration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.state();
            if state == expected {
                return true;
            }
            if Instant::now() >= deadline {
                tracing::warn!(?expected, actual = ?state, ?timeout, "timed out waiting for graph state");
                return false;
            }
            std::thread::sleep(STATE_POLL_INTERVAL);
        }
    }

    pub fn info(&self) -> GraphInfo {
        let config = self.inner.context.config();
        GraphInfo {
            sample_rate_hz: config.sample_rate_hz,
            channel_count: config.output_channel_count,
            bits_per_sample: 32,
            latency_in_samples: 0,
            samples_per_quantum: self.inner.shared.samples_per_quantum(),
        }
    }

    pub fn time_info(&self) -> TimeInfo {
        self.inner.context.clock().time_info()
    }

    pub fn clock(&self) -> &Arc<Clock> {
        self.inner.context.clock()
    }

    pub fn context(&self) -> &GraphContext {
        &self.inner.context
    }

    /// Change the shared tempo. Tracks already looping keep their length.
    pub fn set_beats_per_minute(&self, beats_per_minute: f32) -> Result<()> {
        if !(20.0..=999.0).contains(&beats_per_minute) {
            return Err(Error::InvalidTempo(beats_per_minute));
        }
        self.clock().set_beats_per_minute(beats_per_minute);
        tracing::info!(beats_per_minute, "tempo changed");
        Ok(())
    }

    pub fn input(&self, id: AudioInputId) -> Result<Input> {
        let shared = self
            .inner
            .inputs
            .get(id.index())
            .ok_or(Error::UnknownInput(id))?;
        Ok(Input::new(shared.clone(), self.clone()))
    }

    pub fn inputs(&self) -> Vec<Input> {
        self.inner
            .inputs
            .iter()
            .map(|shared| Input::new(shared.clone(), self.clone()))
            .collect()
    }

    /// Level of the mixed output, taking the louder channel of each frame.
    pub fn output_signal_info(&self) -> SignalStats {
        self.inner.shared.output_stats().get()
    }

    /// Create a track recording from `input`. It starts on the next audio callback.
    pub fn create_recording_track(&self, input: AudioInputId) -> Result<TrackId> {
        let state = self.state();
        if state != GraphState::Running {
            return Err(Error::GraphNotRunning(state));
        }
        let input_shared = self
            .inner
            .inputs
            .get(input.index())
            .ok_or(Error::UnknownInput(input))?;

        let mut registry = self.inner.registry.lock();
        self.reclaim_retired();
        let id = registry
            .vacant()
            .ok_or(Error::TooManyTracks(registry.capacity()))?;

        let frequency = self.inner.analyzer.as_ref().map(|analyzer| analyzer.create());
        let track = Track::new(
            id,
            input,
            input_shared.channels().channel_count(),
            &self.inner.context,
            frequency,
        );
        let shared = track.shared().clone();

        self.inner
            .commands
            .try_send(GraphCommand::InsertTrack(Box::new(track)))
            .map_err(|e| match e {
                TrySendError::Full(_) => Error::CommandQueueFull,
                TrySendError::Disconnected(_) => Error::ProcessorDisconnected,
            })?;
        registry.insert(shared);

        tracing::debug!(track = %id, %input, "created recording track");
        Ok(id)
    }

    /// Stop recording. The track loops once the audio thread has captured its
    /// full quantized length.
    pub fn finish_recording(&self, id: TrackId) -> Result<()> {
        let track = self.track(id)?;
        track
            .request_finish_recording()
            .map_err(|actual| Error::InvalidTrackState {
                id,
                expected: TrackState::Recording,
                actual,
            })?;
        tracing::debug!(track = %id, beats = track.beat_duration().value(), "finishing recording");
        Ok(())
    }

    pub fn set_muted(&self, id: TrackId, muted: bool) -> Result<()> {
        self.track(id)?.set_muted(muted);
        Ok(())
    }

    pub fn set_track_pan(&self, id: TrackId, pan: f32) -> Result<()> {
        self.track(id)?.pan().set(pan.clamp(0.0, 1.0));
        Ok(())
    }

    pub fn set_track_volume(&self, id: TrackId, volume: f32) -> Result<()> {
        self.track(id)?.volume().set(volume.max(0.0));
        Ok(())
    }

    pub fn track_state(&self, id: TrackId) -> Result<TrackState> {
        Ok(self.track(id)?.state())
    }

    pub fn track_info(&self, id: TrackId) -> Result<TrackInfo> {
        Ok(self.track(id)?.info(self.clock()))
    }

    /// Beat position within the track's loop right now.
    pub fn beat_position_now(&self, id: TrackId) -> Result<ContinuousDuration<Beat>> {
        Ok(self.track(id)?.beat_position_now(self.clock()))
    }

    /// The input's level while the track records, the track's own once it loops.
    pub fn track_signal_info(&self, id: TrackId) -> Result<SignalStats> {
        let track = self.track(id)?;
        if track.state().is_recording() {
            Ok(self.track_input(&track).signal_stats())
        } else {
            Ok(track.signal_stats())
        }
    }

    /// Latest spectrum of the same signal [`track_signal_info`](Self::track_signal_info)
    /// reports. Leaves `out` untouched without a frequency analyzer.
    pub fn get_frequencies(&self, id: TrackId, out: &mut [f32]) -> Result<()> {
        let track = self.track(id)?;
        if track.state().is_recording() {
            self.track_input(&track).get_frequencies(out);
        } else if let Some(reader) = track.frequency() {
            reader.latest(out);
        }
        Ok(())
    }

    /// Remove a looping track from the graph.
    pub fn delete_track(&self, id: TrackId) -> Result<()> {
        let mut registry = self.inner.registry.lock();
        let track = registry.get(id).ok_or(Error::UnknownTrack(id))?;
        if track.state().is_recording() {
            return Err(Error::TrackStillRecording(id));
        }

        match self
            .inner
            .commands
            .try_send(GraphCommand::RemoveTrack(id.index()))
        {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return Err(Error::CommandQueueFull),
            // No audio thread left to hold the track.
            Err(TrySendError::Disconnected(_)) => {}
        }
        registry.remove(id);
        drop(registry);

        self.reclaim_retired();
        tracing::debug!(track = %id, "deleted track");
        Ok(())
    }

    /// Tracks that started looping since the last poll. Each is reported once.
    pub fn poll_finished_recordings(&self) -> Vec<TrackId> {
        let finished: Vec<TrackId> = self
            .inner
            .registry
            .lock()
            .iter()
            .filter(|track| track.take_just_stopped_recording())
            .map(|track| track.id())
            .collect();
        for id in &finished {
            tracing::debug!(track = %id, "recording finished");
        }
        finished
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.inner.registry.lock().iter().map(|t| t.id()).collect()
    }

    /// Stop accepting work. The processor outputs silence from its next callback.
    pub fn shutdown(&self) {
        self.inner.shared.set_state(GraphState::Uninitialized);
        self.reclaim_retired();
        tracing::info!("loop graph shut down");
    }

    fn track(&self, id: TrackId) -> Result<Arc<TrackShared>> {
        self.inner
            .registry
            .lock()
            .get(id)
            .cloned()
            .ok_or(Error::UnknownTrack(id))
    }

    fn track_input(&self, track: &TrackShared) -> &Arc<InputShared> {
        &self.inner.inputs[track.input().index()]
    }

    /// Drop tracks the audio thread has handed back.
    fn reclaim_retired(&self) {
        let mut count = 0usize;
        while let Ok(track) = self.inner.retired.try_recv() {
            drop(track);
            count += 1;
        }
        if count > 0 {
            tracing::debug!(count, "reclaimed retired tracks");
        }
    }
}

impl core::fmt::Debug for LoopGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoopGraph")
            .field("state", &self.state())
            .field("clock", self.clock())
            .field("tracks", &self.inner.registry.lock().len())
            .finish()
    }
}

/// Builder for [`LoopGraph`].
#[derive(Default)]
pub struct LoopGraphBuilder {
    config: GraphConfig,
    analyzer: Option<Arc<dyn FrequencyAnalyzer>>,
}

impl LoopGraphBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sample_rate(mut self, sample_rate_hz: u32) -> Self {
        self.config.sample_rate_hz = sample_rate_hz;
        self
    }

    pub fn beats_per_minute(mut self, beats_per_minute: f32) -> Self {
        self.config.beats_per_minute = beats_per_minute;
        self
    }

    pub fn beats_per_measure(mut self, beats_per_measure: u32) -> Self {
        self.config.beats_per_measure = beats_per_measure;
        self
    }

    /// One input per entry, in id order (default: a single mono input on channel 0).
    pub fn inputs(mut self, inputs: Vec<InputChannels>) -> Self {
        self.config.inputs = inputs;
        self
    }

    pub fn max_block_frames(mut self, frames: usize) -> Self {
        self.config.max_block_frames = frames;
        self
    }

    pub fn max_tracks(mut self, max_tracks: usize) -> Self {
        self.config.max_tracks = max_tracks;
        self
    }

    /// Pool layout: samples per block and number of blocks.
    pub fn block_pool(mut self, block_len: usize, block_count: usize) -> Self {
        self.config.block_len = block_len;
        self.config.block_pool_size = block_count;
        self
    }

    pub fn pre_recording(mut self, seconds: f64) -> Self {
        self.config.pre_recording_secs = seconds;
        self
    }

    pub fn monitor_inputs(mut self, monitor: bool) -> Self {
        self.config.monitor_inputs = monitor;
        self
    }

    /// Analyzer that gives every input and track a frequency tracker.
    pub fn frequency_analyzer(mut self, analyzer: Arc<dyn FrequencyAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Validate the configuration and build both halves of the graph.
    ///
    /// Everything the audio thread will ever use, block pool included, is
    /// allocated here.
    pub fn build(self) -> Result<(LoopGraph, GraphProcessor)> {
        self.config.validate()?;
        let context = GraphContext::new(self.config);
        let config = context.config();

        let (command_tx, command_rx) = bounded(config.max_tracks * 2);
        let (retired_tx, retired_rx) = bounded(config.max_tracks);

        let inputs: Vec<InputProcessor> = config
            .inputs
            .iter()
            .enumerate()
            .map(|(index, channels)| {
                InputProcessor::new(
                    AudioInputId::new(index as u32),
                    *channels,
                    &context,
                    self.analyzer.as_ref().map(|analyzer| analyzer.create()),
                )
            })
            .collect();
        let input_shared = inputs.iter().map(|input| input.shared().clone()).collect();

        let bus_meter = MeasurementProcessor::new(context.volume_window(), None);
        let shared = Arc::new(GraphShared::new(
            GraphState::Initialized,
            bus_meter.stats().clone(),
        ));

        tracing::info!(
            sample_rate_hz = config.sample_rate_hz,
            beats_per_minute = config.beats_per_minute,
            inputs = config.inputs.len(),
            max_tracks = config.max_tracks,
            "loop graph initialized"
        );

        let graph = LoopGraph {
            inner: Arc::new(GraphInner {
                registry: Mutex::new(TrackRegistry::new(config.max_tracks)),
                context: context.clone(),
                shared: shared.clone(),
                inputs: input_shared,
                commands: command_tx,
                retired: retired_rx,
                analyzer: self.analyzer,
            }),
        };
        let processor = GraphProcessor::new(context, shared, inputs, command_rx, retired_tx, bus_meter);
        Ok((graph, processor))
    }
}
