//! Fixed-capacity rolling statistics window.
//!
//! Not a binned histogram: it keeps the last `capacity` values in insertion
//! order with a running total, so [`Histogram::average`] is always O(1).
//! Min and max are cached and only recomputed (O(capacity)) when the value
//! evicted from the window was one of the cached extremes.

use serde::{Deserialize, Serialize};

/// Min/max/average of a window of values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub min: f32,
    pub max: f32,
    pub average: f32,
}

#[derive(Debug, Clone)]
pub struct Histogram {
    values: Box<[f32]>,
    /// Index of the oldest retained value.
    head: usize,
    len: usize,
    total: f64,
    min: f32,
    max: f32,
    min_max_known: bool,
}

impl Histogram {
    /// Allocates the whole window up front; nothing allocates afterwards.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "histogram capacity must be positive");
        Self {
            values: vec![0.0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            total: 0.0,
            min: 0.0,
            max: 0.0,
            min_max_known: true,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.total
    }

    #[inline]
    pub fn add(&mut self, value: f32) {
        if self.len == 0 {
            self.values[self.head] = value;
            self.len = 1;
            self.total = value as f64;
            self.min = value;
            self.max = value;
            self.min_max_known = true;
            return;
        }

        if self.len == self.capacity() {
            let evicted = self.values[self.head];
            self.head = (self.head + 1) % self.capacity();
            self.len -= 1;
            self.total -= evicted as f64;
            // Only losing a cached extreme makes the cache stale.
            if evicted <= self.min || evicted >= self.max {
                self.min_max_known = false;
            }
        }

        let tail = (self.head + self.len) % self.capacity();
        self.values[tail] = value;
        self.len += 1;
        self.total += value as f64;

        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Add every value of `data`, optionally taking absolute values (for volume).
    pub fn add_all(&mut self, data: &[f32], absolute_value: bool) {
        for &value in data {
            self.add(if absolute_value { value.abs() } else { value });
        }
    }

    /// Retained values, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.len).map(move |i| self.values[(self.head + i) % self.capacity()])
    }

    pub fn ensure_min_max_known(&mut self) {
        if self.min_max_known || self.len == 0 {
            return;
        }
        let first = self.values[self.head];
        let (min, max) = self
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        self.min = min;
        self.max = max;
        self.min_max_known = true;
    }

    pub fn min(&mut self) -> f32 {
        self.ensure_min_max_known();
        self.min
    }

    pub fn max(&mut self) -> f32 {
        self.ensure_min_max_known();
        self.max
    }

    /// Exact mean of the retained window; 0 when empty.
    #[inline]
    pub fn average(&self) -> f32 {
        if self.len == 0 {
            0.0
        } else {
            (self.total / self.len as f64) as f32
        }
    }

    pub fn stats(&mut self) -> SignalStats {
        SignalStats {
            min: self.min(),
            max: self.max(),
            average: self.average(),
        }
    }
}
