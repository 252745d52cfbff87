//! Graph configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Host input channels feeding one [`Input`](crate::Input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputChannels {
    Mono(usize),
    Stereo(usize, usize),
}

impl InputChannels {
    /// Host channel indices, left first.
    pub fn indices(&self) -> ([usize; 2], usize) {
        match *self {
            InputChannels::Mono(c) => ([c, c], 1),
            InputChannels::Stereo(l, r) => ([l, r], 2),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.indices().1
    }

    fn max_index(&self) -> usize {
        let (indices, count) = self.indices();
        indices[..count].iter().copied().max().unwrap_or(0)
    }
}

/// Configuration for a loop graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub sample_rate_hz: u32,
    /// Mix bus width. Only stereo is supported.
    pub output_channel_count: usize,
    pub beats_per_minute: f32,
    pub beats_per_measure: u32,
    /// One input per entry, in id order.
    pub inputs: Vec<InputChannels>,
    /// Samples per pooled block.
    pub block_len: usize,
    /// Blocks allocated up front; shared by every input and track.
    pub block_pool_size: usize,
    /// Longest host callback, in frames.
    pub max_block_frames: usize,
    pub max_tracks: usize,
    /// Input history copied into the start of each new track, in seconds.
    pub pre_recording_secs: f64,
    /// Look-back each input keeps, in seconds.
    pub input_history_secs: f64,
    /// Callback timing window, in callbacks.
    pub quantum_histogram_capacity: usize,
    /// Volume window, in seconds.
    pub recent_volume_secs: f64,
    pub initial_pan: f32,
    pub initial_volume: f32,
    /// Whether inputs are heard on the output bus from the start.
    pub monitor_inputs: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48000,
            output_channel_count: 2,
            beats_per_minute: 60.0,
            beats_per_measure: 4,
            inputs: vec![InputChannels::Mono(0)],
            block_len: 48000,
            block_pool_size: 128,
            max_block_frames: 4096,
            max_tracks: 32,
            pre_recording_secs: 0.0,
            input_history_secs: 1.0,
            quantum_histogram_capacity: 200,
            recent_volume_secs: 0.1,
            initial_pan: 0.5,
            initial_volume: 1.0,
            monitor_inputs: true,
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000..=384000).contains(&self.sample_rate_hz) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate_hz {} out of range (8000-384000 Hz)",
                self.sample_rate_hz
            )));
        }
        if self.output_channel_count != 2 {
            return Err(Error::InvalidConfig(format!(
                "output_channel_count {} unsupported (stereo only)",
                self.output_channel_count
            )));
        }
        if !(20.0..=999.0).contains(&self.beats_per_minute) {
            return Err(Error::InvalidTempo(self.beats_per_minute));
        }
        if self.beats_per_measure == 0 {
            return Err(Error::InvalidConfig("beats_per_measure must be at least 1".into()));
        }
        if self.inputs.is_empty() {
            return Err(Error::InvalidConfig("at least one input is required".into()));
        }
        if self.block_len == 0 || self.max_block_frames == 0 || self.max_tracks == 0 {
            return Err(Error::InvalidConfig(
                "block_len, max_block_frames and max_tracks must be positive".into(),
            ));
        }
        if self.quantum_histogram_capacity == 0 {
            return Err(Error::InvalidConfig(
                "quantum_histogram_capacity must be positive".into(),
            ));
        }
        if self.input_history_secs <= 0.0 || self.recent_volume_secs <= 0.0 {
            return Err(Error::InvalidConfig(
                "input_history_secs and recent_volume_secs must be positive".into(),
            ));
        }
        if self.pre_recording_secs < 0.0 || self.pre_recording_secs > self.input_history_secs {
            return Err(Error::InvalidConfig(format!(
                "pre_recording_secs {} must be within the input history ({} s)",
                self.pre_recording_secs, self.input_history_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.initial_pan) {
            return Err(Error::InvalidConfig(format!(
                "initial_pan {} out of range (0-1)",
                self.initial_pan
            )));
        }
        if self.initial_volume < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "initial_volume {} must be non-negative",
                self.initial_volume
            )));
        }

        let history_blocks = self.input_history_blocks_per_channel();
        let input_channels: usize = self.inputs.iter().map(InputChannels::channel_count).sum();
        if history_blocks * input_channels >= self.block_pool_size {
            return Err(Error::InvalidConfig(format!(
                "block_pool_size {} leaves no room for tracks after {} input history blocks",
                self.block_pool_size,
                history_blocks * input_channels
            )));
        }
        Ok(())
    }

    /// Highest host input channel any input reads.
    pub fn host_input_channels(&self) -> usize {
        self.inputs
            .iter()
            .map(|c| c.max_index() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Worst-case blocks one input channel's history can hold at once.
    pub fn input_history_blocks_per_channel(&self) -> usize {
        let history = (self.input_history_secs * self.sample_rate_hz as f64).ceil() as usize;
        history.div_ceil(self.block_len) + 2
    }
}
