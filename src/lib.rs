//! cirbuf - Magic Ring Buffer
//!
//! Byte-oriented circular buffer yang storage-nya di-map dua kali secara
//! berurutan di virtual memory, sehingga data yang melewati titik wrap
//! tetap bisa diakses lewat satu pointer linear.
//!
//! ```
//! use cirbuf::CircularBuffer;
//!
//! let mut cb = CircularBuffer::new(65536)?;
//! assert_eq!(cb.offer(b"abcd"), 4);
//! assert_eq!(cb.used_space(), 4);
//! assert_eq!(cb.poll(4), Some(&b"abcd"[..]));
//! assert!(cb.is_empty());
//! # Ok::<(), cirbuf::AllocationError>(())
//! ```

#![cfg(unix)]

pub mod config;
pub mod core;

pub use crate::config::BufferConfig;
pub use crate::core::{
    page_size, AllocationError, CircularBuffer, Consumer, Half, PollGuard, Producer,
};
