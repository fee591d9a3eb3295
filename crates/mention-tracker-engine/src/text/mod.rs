//! Text helpers shared by the engine and the reference host.
//!
//! Hosts index their buffers in UTF-16 code units, Rust strings in bytes.
//! Everything here converts between the two without ever splitting a
//! surrogate pair.

pub mod length_filter;
pub mod utf16;

pub use length_filter::{Filtered, LengthFilter};
