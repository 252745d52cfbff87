//! Time-indexed audio buffers.
//!
//! - [`BufferAllocator`]: pre-sized pool of fixed-length backing blocks
//! - [`SliceStream`]: append-only stream of blocks covering a time interval
//! - [`Slice`]: non-owning view of a run of samples inside one block

mod allocator;
mod slice;
mod slice_stream;

pub use allocator::{AudioBlock, BufferAllocator};
pub use slice::Slice;
pub use slice_stream::SliceStream;
