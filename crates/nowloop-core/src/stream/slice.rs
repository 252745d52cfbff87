//! Read-only view of samples inside one backing block.

use crate::time::{AudioSample, Duration, Interval, Time};

/// Contiguous run of samples from a single block of a [`SliceStream`](super::SliceStream).
#[derive(Debug, Clone, Copy)]
pub struct Slice<'a> {
    /// Stream time of the first sample.
    time: Time<AudioSample>,
    /// Offset of the first sample within its backing block.
    offset: usize,
    samples: &'a [f32],
}

impl<'a> Slice<'a> {
    pub(crate) fn new(time: Time<AudioSample>, offset: usize, samples: &'a [f32]) -> Self {
        Self {
            time,
            offset,
            samples,
        }
    }

    #[inline]
    pub fn time(&self) -> Time<AudioSample> {
        self.time
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn duration(&self) -> Duration<AudioSample> {
        Duration::from_len(self.samples.len())
    }

    #[inline]
    pub fn interval(&self) -> Interval<AudioSample> {
        Interval::new(self.time, self.duration())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    /// Copy the slice into the front of `dest`, which must be at least as long.
    #[inline]
    pub fn copy_to(&self, dest: &mut [f32]) {
        dest[..self.samples.len()].copy_from_slice(self.samples);
    }
}
