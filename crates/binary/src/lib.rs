//! # Thinner Binary Primitives
//!
//! Low-level building blocks shared by the packfile and scene codecs.
//!
//! ## Layers
//!
//! ### 1. Cursor ([`cursor`])
//! A growable, seekable byte buffer with an explicit per-instance
//! [`Endian`](thinner_core::Endian):
//! - fixed-width integers and floats
//! - null-terminated strings (lossy UTF-8)
//! - "jps" strings: size byte, length byte, text, NUL, zero padding
//! - 32-bit booleans (`FF FF FF FF` is true, anything else false)
//! - 16-bit values followed by `CD CD` filler
//!
//! ### 2. String pool ([`string_pool`])
//! Deduplicating string table builder used by every encoder that writes
//! pointers into a string section.
//!
//! ### 3. Compression ([`compression`])
//! zlib deflate/inflate for packfile payloads.
//!
//! ## Usage Example
//!
//! ```rust
//! use thinner_binary::BinaryCursor;
//! use thinner_core::Endian;
//!
//! let mut cursor = BinaryCursor::new(Endian::Big);
//! cursor.write_u32(0x0100_0001);
//! cursor.write_str_jps("Root").unwrap();
//!
//! cursor.seek(0).unwrap();
//! assert_eq!(cursor.read_u32().unwrap(), 0x0100_0001);
//! assert_eq!(cursor.read_str_jps().unwrap(), "Root");
//! ```

pub mod compression;
pub mod cursor;
pub mod string_pool;

pub use compression::*;
pub use cursor::*;
pub use string_pool::*;
