//! Pool of pre-allocated audio blocks.

use crossbeam_channel::{bounded, Receiver, Sender};

/// One fixed-length backing block handed out by a [`BufferAllocator`].
pub type AudioBlock = Box<[f32]>;

/// Pre-sized pool of audio blocks.
///
/// Every block is allocated when the pool is built. `allocate` and `free` only
/// move boxes through a bounded lock-free queue, so both are safe to call from
/// the audio thread. Running out of blocks is a configuration error and panics.
pub struct BufferAllocator {
    block_len: usize,
    block_count: usize,
    free_tx: Sender<AudioBlock>,
    free_rx: Receiver<AudioBlock>,
}

impl BufferAllocator {
    pub fn new(block_len: usize, block_count: usize) -> Self {
        assert!(block_len > 0, "audio blocks must hold at least one sample");
        assert!(block_count > 0, "audio block pool must not be empty");

        let (free_tx, free_rx) = bounded(block_count);
        for _ in 0..block_count {
            let sent = free_tx.try_send(vec![0.0; block_len].into_boxed_slice());
            debug_assert!(sent.is_ok(), "pool queue sized to block count");
        }

        Self {
            block_len,
            block_count,
            free_tx,
            free_rx,
        }
    }

    /// Samples per block.
    #[inline]
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Blocks owned by the pool, free or in use.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Blocks currently available.
    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.free_rx.len()
    }

    /// Take a block from the pool. Contents are whatever the previous owner left.
    #[inline]
    pub fn allocate(&self) -> AudioBlock {
        match self.free_rx.try_recv() {
            Ok(block) => block,
            Err(_) => panic!(
                "audio block pool exhausted: all {} blocks of {} samples are in use",
                self.block_count, self.block_len
            ),
        }
    }

    /// Return a block to the pool.
    #[inline]
    pub fn free(&self, block: AudioBlock) {
        assert_eq!(
            block.len(),
            self.block_len,
            "returned block does not belong to this pool"
        );
        if self.free_tx.try_send(block).is_err() {
            panic!("audio block returned to a pool that is already full");
        }
    }
}

impl core::fmt::Debug for BufferAllocator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BufferAllocator")
            .field("block_len", &self.block_len)
            .field("block_count", &self.block_count)
            .field("free_blocks", &self.free_blocks())
            .finish()
    }
}
