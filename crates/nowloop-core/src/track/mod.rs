//! Loop tracks.
//!
//! A track is split in two: [`Track`] is owned by the audio thread and does
//! the recording and playback, [`TrackShared`] holds the atomics the control
//! thread reads and writes. The graph hands tracks to the audio thread through
//! its command queue and gets them back the same way for deallocation.

mod info;
mod processor;
mod shared;
mod state;

use core::fmt;
use serde::{Deserialize, Serialize};

pub use info::TrackInfo;
pub(crate) use processor::Track;
pub(crate) use shared::TrackShared;
pub use state::{is_quantized, next_beat_duration, TrackState};

/// Handle to a track slot, checked against the slot's generation on every use.
///
/// Deleting a track bumps its slot's generation, so an id kept past deletion
/// is rejected instead of reaching whichever track reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId {
    index: u32,
    generation: u32,
}

impl TrackId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}
