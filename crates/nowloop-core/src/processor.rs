//! Per-block processing capability shared by the panner and the meters.

/// One block on its way to the stereo bus.
///
/// `left` holds the first source channel and `right` the second when
/// `source_channels == 2`. For a mono source `right` is scratch until a
/// panner spreads `left` across both.
pub struct StereoBlock<'a> {
    pub left: &'a mut [f32],
    pub right: &'a mut [f32],
    pub source_channels: usize,
}

impl<'a> StereoBlock<'a> {
    pub fn new(left: &'a mut [f32], right: &'a mut [f32], source_channels: usize) -> Self {
        assert_eq!(left.len(), right.len(), "stereo block halves differ in length");
        assert!(
            source_channels == 1 || source_channels == 2,
            "unsupported source channel count {source_channels}"
        );
        Self {
            left,
            right,
            source_channels,
        }
    }
}

/// Something an input, track or the bus runs over each block, in place.
///
/// Called on the audio thread: implementations must not allocate, lock or log.
pub trait BlockProcessor: Send {
    fn process_block(&mut self, block: &mut StereoBlock<'_>);
}
