//! Stereo panning with gain.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use crate::lockfree::AtomicFloat;
use crate::processor::{BlockProcessor, StereoBlock};

/// Pans a block onto the stereo bus.
///
/// Mono sources use a constant-power law (`cos`/`sin` of `pan * pi/2`).
/// Stereo sources keep both channels at unity gain in the centre and
/// attenuate the far side linearly as the pan moves away from it.
/// Pan and volume are read once per block from shared atomics.
#[derive(Debug, Clone)]
pub struct StereoPanner {
    pan: Arc<AtomicFloat>,
    volume: Arc<AtomicFloat>,
}

impl StereoPanner {
    pub fn new(pan: f32, volume: f32) -> Self {
        Self {
            pan: Arc::new(AtomicFloat::new(pan.clamp(0.0, 1.0))),
            volume: Arc::new(AtomicFloat::new(volume.max(0.0))),
        }
    }

    /// Shared pan, 0 = hard left, 1 = hard right.
    pub fn pan(&self) -> &Arc<AtomicFloat> {
        &self.pan
    }

    /// Shared linear gain.
    pub fn volume(&self) -> &Arc<AtomicFloat> {
        &self.volume
    }

    /// Left and right gains for the current settings.
    pub fn gains(&self, source_channels: usize) -> (f32, f32) {
        let pan = self.pan.get().clamp(0.0, 1.0);
        let volume = self.volume.get();
        if source_channels == 1 {
            let angle = pan * FRAC_PI_2;
            (angle.cos() * volume, angle.sin() * volume)
        } else {
            let left = (2.0 * (1.0 - pan)).min(1.0);
            let right = (2.0 * pan).min(1.0);
            (left * volume, right * volume)
        }
    }
}

impl BlockProcessor for StereoPanner {
    fn process_block(&mut self, block: &mut StereoBlock<'_>) {
        let (left_gain, right_gain) = self.gains(block.source_channels);
        if block.source_channels == 1 {
            for (l, r) in block.left.iter_mut().zip(block.right.iter_mut()) {
                let s = *l;
                *l = s * left_gain;
                *r = s * right_gain;
            }
        } else {
            for s in block.left.iter_mut() {
                *s *= left_gain;
            }
            for s in block.right.iter_mut() {
                *s *= right_gain;
            }
        }
    }
}
