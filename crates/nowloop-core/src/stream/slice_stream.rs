//! Append-only, time-indexed stream of pooled audio blocks.
//!
//! A stream covers `[initial_time, initial_time + discrete_duration)`. It has
//! exactly one writer (the audio thread) and only ever grows at its end, which
//! is what lets readers of the already-appended prefix go without a lock.
//!
//! Once shut, a stream has a fixed length and reads wrap around it, which is
//! how a finished track loops. A stream built with a maximum buffered duration
//! instead forgets its oldest blocks as it grows, returning them to the pool
//! and moving `initial_time` forward.

use std::collections::VecDeque;
use std::sync::Arc;

use super::{AudioBlock, BufferAllocator, Slice};
use crate::time::{AudioSample, ContinuousDuration, Duration, Interval, Time};

pub struct SliceStream {
    initial_time: Time<AudioSample>,
    allocator: Arc<BufferAllocator>,
    blocks: VecDeque<AudioBlock>,
    discrete_duration: Duration<AudioSample>,
    /// Set by `shut`; the stream is frozen from then on.
    exact_duration: Option<ContinuousDuration<AudioSample>>,
    max_buffered_duration: Option<Duration<AudioSample>>,
}

impl SliceStream {
    /// Unbounded stream, e.g. a track recording.
    ///
    /// The block list is reserved for the whole pool here, so appending on the
    /// audio thread never reallocates it.
    pub fn new(initial_time: Time<AudioSample>, allocator: Arc<BufferAllocator>) -> Self {
        let capacity = allocator.block_count();
        Self {
            initial_time,
            allocator,
            blocks: VecDeque::with_capacity(capacity),
            discrete_duration: Duration::new(0),
            exact_duration: None,
            max_buffered_duration: None,
        }
    }

    /// Stream that keeps at least `max_buffered_duration` of history and recycles older blocks.
    pub fn with_max_buffered_duration(
        initial_time: Time<AudioSample>,
        allocator: Arc<BufferAllocator>,
        max_buffered_duration: Duration<AudioSample>,
    ) -> Self {
        assert!(
            max_buffered_duration.value() > 0,
            "bounded stream needs a positive history length"
        );
        let mut stream = Self::new(initial_time, allocator);
        stream.max_buffered_duration = Some(max_buffered_duration);
        stream
    }

    #[inline]
    pub fn initial_time(&self) -> Time<AudioSample> {
        self.initial_time
    }

    /// Whole samples currently held.
    #[inline]
    pub fn discrete_duration(&self) -> Duration<AudioSample> {
        self.discrete_duration
    }

    /// The length the stream was shut at, or the discrete length while still open.
    #[inline]
    pub fn exact_duration(&self) -> ContinuousDuration<AudioSample> {
        self.exact_duration
            .unwrap_or_else(|| self.discrete_duration.to_continuous())
    }

    #[inline]
    pub fn is_shut(&self) -> bool {
        self.exact_duration.is_some()
    }

    #[inline]
    pub fn interval(&self) -> Interval<AudioSample> {
        Interval::new(self.initial_time, self.discrete_duration)
    }

    #[inline]
    pub fn block_len(&self) -> usize {
        self.allocator.block_len()
    }

    /// Move the origin of a stream that has not been written yet.
    pub fn reset_initial_time(&mut self, initial_time: Time<AudioSample>) {
        assert!(
            self.discrete_duration.value() == 0 && !self.is_shut(),
            "cannot move the origin of a stream that already holds audio"
        );
        self.initial_time = initial_time;
    }

    /// Copy `samples` onto the end of the stream, taking blocks from the pool as needed.
    pub fn append(&mut self, samples: &[f32]) {
        assert!(!self.is_shut(), "append to a shut stream");

        let block_len = self.block_len();
        let mut remaining = samples;
        while !remaining.is_empty() {
            let fill = self.discrete_duration.as_len() % block_len;
            if fill == 0 {
                self.recycle_expired_blocks();
                self.blocks.push_back(self.allocator.allocate());
            }

            let last = self.blocks.len() - 1;
            let count = (block_len - fill).min(remaining.len());
            self.blocks[last][fill..fill + count].copy_from_slice(&remaining[..count]);
            self.discrete_duration += Duration::from_len(count);
            remaining = &remaining[count..];
        }
    }

    /// Copy `interval` of this stream onto the end of `dest`.
    pub fn append_slice_range(&self, interval: Interval<AudioSample>, dest: &mut SliceStream) {
        let mut rest = interval;
        while !rest.is_empty() {
            let slice = self.get_slice_containing(rest);
            dest.append(slice.samples());
            rest = rest.suffix(slice.duration());
        }
    }

    /// Freeze the stream at `exact_duration`, dropping any whole samples past its ceiling.
    pub fn shut(&mut self, exact_duration: ContinuousDuration<AudioSample>) {
        assert!(!self.is_shut(), "stream shut twice");
        let discrete = exact_duration.ceil();
        assert!(
            discrete.value() > 0 && discrete <= self.discrete_duration,
            "cannot shut a stream of {:?} at {:?}",
            self.discrete_duration,
            exact_duration
        );

        self.discrete_duration = discrete;
        self.exact_duration = Some(exact_duration);

        let needed = discrete.as_len().div_ceil(self.block_len());
        while self.blocks.len() > needed {
            if let Some(block) = self.blocks.pop_back() {
                self.allocator.free(block);
            }
        }
    }

    /// Largest slice starting at `interval.start()` that stays inside one block
    /// and does not exceed `interval.duration()`.
    ///
    /// The result may be shorter than requested; callers loop until they have
    /// consumed the whole interval. On a shut stream the start time is taken
    /// modulo the stream length, so reads past the end continue from the start;
    /// the slice is then stamped with the wrapped time.
    pub fn get_slice_containing(&self, interval: Interval<AudioSample>) -> Slice<'_> {
        assert!(!interval.is_empty(), "empty slice request");

        let offset = interval.start() - self.initial_time;
        let offset = if self.is_shut() {
            offset.rem_euclid(self.discrete_duration)
        } else {
            assert!(
                offset.value() >= 0 && offset < self.discrete_duration,
                "{:?} starts outside stream {:?}",
                interval,
                self.interval()
            );
            offset
        };

        let offset = offset.as_len();
        let block_len = self.block_len();
        let within = offset % block_len;
        let available = (block_len - within).min(self.discrete_duration.as_len() - offset);
        let count = available.min(interval.duration().as_len());

        let block = &self.blocks[offset / block_len];
        let time = self.initial_time + Duration::from_len(offset);
        Slice::new(time, within, &block[within..within + count])
    }

    /// Copy `interval` into the front of `dest`, however many slices it spans.
    pub fn copy_interval_to(&self, interval: Interval<AudioSample>, dest: &mut [f32]) {
        let mut rest = interval;
        let mut written = 0;
        while !rest.is_empty() {
            let slice = self.get_slice_containing(rest);
            slice.copy_to(&mut dest[written..]);
            written += slice.samples().len();
            rest = rest.suffix(slice.duration());
        }
    }

    fn recycle_expired_blocks(&mut self) {
        let Some(max) = self.max_buffered_duration else {
            return;
        };
        let block = Duration::from_len(self.block_len());
        // Only whole, full blocks at the front are recycled.
        while self.blocks.len() > 1 && self.discrete_duration - block >= max {
            if let Some(oldest) = self.blocks.pop_front() {
                self.allocator.free(oldest);
            }
            self.initial_time += block;
            self.discrete_duration -= block;
        }
    }
}

impl Drop for SliceStream {
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            self.allocator.free(block);
        }
    }
}

impl core::fmt::Debug for SliceStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SliceStream")
            .field("interval", &self.interval())
            .field("exact_duration", &self.exact_duration)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}
