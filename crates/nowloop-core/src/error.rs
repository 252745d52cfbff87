//! Error types for nowloop-core.
//!
//! Only control-thread operations return these. Contract violations on the
//! audio thread panic, since nothing can be reported out of a callback.

use thiserror::Error;

use crate::graph::GraphState;
use crate::input::AudioInputId;
use crate::track::{TrackId, TrackState};

/// Error type for nowloop-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid tempo: {0}. Must be between 20.0 and 999.0 BPM")]
    InvalidTempo(f32),

    #[error("Graph is not running (state: {0:?})")]
    GraphNotRunning(GraphState),

    #[error("Unknown track: {0}")]
    UnknownTrack(TrackId),

    #[error("Unknown input: {0}")]
    UnknownInput(AudioInputId),

    #[error("Track {0} is still recording")]
    TrackStillRecording(TrackId),

    #[error("Track {id} is {actual:?}, expected {expected:?}")]
    InvalidTrackState {
        id: TrackId,
        expected: TrackState,
        actual: TrackState,
    },

    #[error("Track limit reached ({0} tracks)")]
    TooManyTracks(usize),

    #[error("Audio command queue is full")]
    CommandQueueFull,

    #[error("Audio processor has been dropped")]
    ProcessorDisconnected,
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
