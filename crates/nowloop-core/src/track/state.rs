//! Track lifecycle and loop-length quantization.

use serde::{Deserialize, Serialize};

use crate::time::{Beat, Duration};

/// Where a track is in its one-way lifecycle.
///
/// `Uninitialized` only exists between creation on the control thread and
/// installation on the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackState {
    Uninitialized,
    Recording,
    FinishRecording,
    Looping,
}

impl TrackState {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            TrackState::Uninitialized => 0,
            TrackState::Recording => 1,
            TrackState::FinishRecording => 2,
            TrackState::Looping => 3,
        }
    }

    pub(crate) fn from_u8(val: u8) -> Self {
        match val {
            1 => TrackState::Recording,
            2 => TrackState::FinishRecording,
            3 => TrackState::Looping,
            _ => TrackState::Uninitialized,
        }
    }

    /// Still capturing input: output is silent and the track cannot be deleted.
    pub fn is_recording(self) -> bool {
        matches!(
            self,
            TrackState::Uninitialized | TrackState::Recording | TrackState::FinishRecording
        )
    }
}

/// Next loop length once recording has covered `current` beats: 1, 2, 4, then steps of 4.
pub fn next_beat_duration(current: Duration<Beat>) -> Duration<Beat> {
    match current.value() {
        1 => Duration::new(2),
        2 => Duration::new(4),
        n => Duration::new(n + 4),
    }
}

/// Whether `beats` is a length the quantizer can produce.
pub fn is_quantized(beats: Duration<Beat>) -> bool {
    matches!(beats.value(), 1 | 2) || (beats.value() >= 4 && beats.value() % 4 == 0)
}
