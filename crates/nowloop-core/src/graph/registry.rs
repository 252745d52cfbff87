//! Control-thread view of the track slots.

use std::sync::Arc;

use crate::track::{TrackId, TrackShared};

struct Slot {
    generation: u32,
    track: Option<Arc<TrackShared>>,
}

/// Fixed set of track slots with per-slot generations.
///
/// Mirrors the audio thread's slot array: a slot is occupied here before its
/// insert command is sent and vacated before its remove command is sent.
pub(crate) struct TrackRegistry {
    slots: Vec<Slot>,
}

impl TrackRegistry {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity)
                .map(|_| Slot {
                    generation: 0,
                    track: None,
                })
                .collect(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.track.is_some()).count()
    }

    /// Id the next track would get, if any slot is free.
    pub(crate) fn vacant(&self) -> Option<TrackId> {
        self.slots
            .iter()
            .position(|s| s.track.is_none())
            .map(|index| TrackId::new(index, self.slots[index].generation))
    }

    pub(crate) fn insert(&mut self, track: Arc<TrackShared>) {
        let id = track.id();
        let slot = &mut self.slots[id.index()];
        assert!(
            slot.track.is_none() && slot.generation == id.generation(),
            "track slot {} is not free for {}",
            id.index(),
            id
        );
        slot.track = Some(track);
    }

    pub(crate) fn get(&self, id: TrackId) -> Option<&Arc<TrackShared>> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.track.as_ref()
    }

    /// Vacate the slot and invalidate every outstanding copy of `id`.
    pub(crate) fn remove(&mut self, id: TrackId) -> Option<Arc<TrackShared>> {
        self.get(id)?;
        let slot = &mut self.slots[id.index()];
        slot.generation = slot.generation.wrapping_add(1);
        slot.track.take()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<TrackShared>> + '_ {
        self.slots.iter().filter_map(|s| s.track.as_ref())
    }
}
