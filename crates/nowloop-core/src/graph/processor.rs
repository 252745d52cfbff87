//! Audio-thread half of the graph.

use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use super::command::GraphCommand;
use super::{GraphContext, GraphShared, GraphState};
use crate::input::InputProcessor;
use crate::metering::MeasurementProcessor;
use crate::time::{AudioSample, Duration, Time};
use crate::track::Track;

/// Drives inputs and tracks once per host callback.
///
/// Owned by the audio thread. Nothing in [`GraphProcessor::process`]
/// allocates, locks or logs; all buffers are sized at build time.
pub struct GraphProcessor {
    context: GraphContext,
    shared: Arc<GraphShared>,
    inputs: Vec<InputProcessor>,
    /// Indexed by track slot.
    tracks: Vec<Option<Box<Track>>>,
    commands: Receiver<GraphCommand>,
    retired: Sender<Box<Track>>,
    host_input_channels: usize,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
    bus_left: Vec<f32>,
    bus_right: Vec<f32>,
    bus_meter: MeasurementProcessor,
    last_callback: Option<Instant>,
}

impl GraphProcessor {
    pub(crate) fn new(
        context: GraphContext,
        shared: Arc<GraphShared>,
        inputs: Vec<InputProcessor>,
        commands: Receiver<GraphCommand>,
        retired: Sender<Box<Track>>,
        bus_meter: MeasurementProcessor,
    ) -> Self {
        let config = context.config();
        let frames = config.max_block_frames;
        let host_input_channels = config.host_input_channels();
        let tracks = (0..config.max_tracks).map(|_| None).collect();

        Self {
            shared,
            inputs,
            tracks,
            commands,
            retired,
            host_input_channels,
            scratch_left: vec![0.0; frames],
            scratch_right: vec![0.0; frames],
            bus_left: vec![0.0; frames],
            bus_right: vec![0.0; frames],
            bus_meter,
            last_callback: None,
            context,
        }
    }

    pub fn context(&self) -> &GraphContext {
        &self.context
    }

    /// Process one host callback.
    ///
    /// `inputs` holds one planar slice per host input channel, `output` is
    /// interleaved stereo of the same frame count. Inputs run before tracks,
    /// so a recording track sees this block's input. The clock advances by
    /// the block length once everything else is done.
    pub fn process(&mut self, inputs: &[&[f32]], output: &mut [f32]) {
        assert!(output.len() % 2 == 0, "output must be interleaved stereo");
        let frames = output.len() / 2;
        assert!(
            frames <= self.scratch_left.len(),
            "host block of {} frames exceeds max_block_frames {}",
            frames,
            self.scratch_left.len()
        );

        match self.shared.state() {
            GraphState::Initialized => {
                // Loses to a concurrent shutdown.
                if !self.shared.transition(GraphState::Initialized, GraphState::Running) {
                    output.fill(0.0);
                    return;
                }
            }
            GraphState::Running => {}
            GraphState::Uninitialized | GraphState::InError => {
                output.fill(0.0);
                return;
            }
        }

        if inputs.len() < self.host_input_channels || inputs.iter().any(|c| c.len() != frames) {
            self.shared.set_state(GraphState::InError);
            output.fill(0.0);
            return;
        }

        let since_last = self.samples_since_last_callback();
        let now = self.context.clock().now();
        self.process_commands(now);

        let bus_left = &mut self.bus_left[..frames];
        let bus_right = &mut self.bus_right[..frames];
        bus_left.fill(0.0);
        bus_right.fill(0.0);

        for input in self.inputs.iter_mut() {
            let left = &mut self.scratch_left[..frames];
            let right = &mut self.scratch_right[..frames];
            if input.process(inputs, left, right) {
                mix_into(bus_left, left);
                mix_into(bus_right, right);
            }
        }

        for track in self.tracks.iter_mut().flatten() {
            let (source, count) = self.inputs[track.input().index()].source(inputs);
            let left = &mut self.scratch_left[..frames];
            let right = &mut self.scratch_right[..frames];
            track.process(&source[..count], left, right);
            if let Some(samples) = since_last {
                track.record_timing(samples);
            }
            mix_into(bus_left, left);
            mix_into(bus_right, right);
        }

        // Meter the louder channel of each frame.
        let peak = &mut self.scratch_left[..frames];
        for (p, (l, r)) in peak.iter_mut().zip(bus_left.iter().zip(bus_right.iter())) {
            *p = l.abs().max(r.abs());
        }
        self.bus_meter.measure(peak);
        for (frame, (l, r)) in output
            .chunks_exact_mut(2)
            .zip(bus_left.iter().zip(bus_right.iter()))
        {
            frame[0] = *l;
            frame[1] = *r;
        }

        self.shared.set_samples_per_quantum(frames);
        self.context
            .clock()
            .advance_from_audio_graph(Duration::from_len(frames));
    }

    fn process_commands(&mut self, now: Time<AudioSample>) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                GraphCommand::InsertTrack(mut track) => {
                    let slot = track.id().index();
                    let input = &self.inputs[track.input().index()];
                    track.install(now, input.history());
                    debug_assert!(self.tracks[slot].is_none(), "track slot {slot} occupied");
                    self.tracks[slot] = Some(track);
                }
                GraphCommand::RemoveTrack(slot) => {
                    if let Some(track) = self.tracks[slot].take() {
                        // The retire queue holds every slot; it only fails once the
                        // control side is gone, and then the track is dropped here.
                        let _ = self.retired.try_send(track);
                    }
                }
            }
        }
    }

    /// Wall-clock time since the previous callback, in samples.
    fn samples_since_last_callback(&mut self) -> Option<f32> {
        let now = Instant::now();
        let previous = self.last_callback.replace(now)?;
        let elapsed = now.duration_since(previous).as_secs_f64();
        Some((elapsed * self.context.clock().sample_rate_hz() as f64) as f32)
    }
}

#[inline]
fn mix_into(bus: &mut [f32], block: &[f32]) {
    for (out, s) in bus.iter_mut().zip(block) {
        *out += *s;
    }
}

impl core::fmt::Debug for GraphProcessor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphProcessor")
            .field("state", &self.shared.state())
            .field("inputs", &self.inputs.len())
            .field("tracks", &self.tracks.iter().flatten().count())
            .finish()
    }
}
