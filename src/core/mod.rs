//! Core module: Magic Ring Buffer dengan mirrored mmap backing
//!
//! Prinsip desain:
//! - Mirrored: Storage di-map dua kali berurutan, wrap tanpa split-copy
//! - Zero-Copy Read: `peek`/`poll` mengembalikan slice langsung ke region
//! - Lock-Free: Hanya atomic cursors, tidak ada Mutex/RwLock
//! - No-Allocation: Region dialokasikan sekali saat konstruksi

mod cursor;
mod error;
mod mirror;
mod ring_buffer;
mod spsc;

pub use error::{AllocationError, Half};
pub use mirror::{page_size, MirroredRegion};
pub use ring_buffer::CircularBuffer;
pub use spsc::{Consumer, PollGuard, Producer};

pub(crate) use ring_buffer::round_to_page;
