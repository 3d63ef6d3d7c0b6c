//! # Thinner Packfile
//!
//! Codec for the engine's virtual-filesystem container.
//!
//! ## Features
//! - Endian sniffing from the literal magic bytes
//! - Per-file zlib compression and 32-byte aligned data blocks
//! - Deduplicated folder/file name pool
//! - Case-insensitive path lookup and in-memory mutation
//! - JSON or XML manifest for extract/rebuild workflows
//! - Self-contained JSON and XML documents with payloads inline
//!
//! ## Binary Layout
//!
//! - **Header**: magic, version, reserved zero, header size, data offset
//! - **Record table** (at header size): file count, then 24 bytes per file
//! - **Name pool**: null-terminated names, pointers relative to its start
//! - **Data**: one 32-byte aligned block per file, in list order
//!
//! File order is significant to the engine and is never changed implicitly.

pub mod codec;
pub mod document;
pub mod manifest;
pub mod packfile;
pub mod path;
pub mod type_tag;
pub mod virtual_file;
mod xml;

pub use codec::{sniff_endian, EntryLayout, PackLayout, DATA_ALIGNMENT, DEFAULT_HEADER_SIZE, RECORD_SIZE};
pub use manifest::{ManifestEntry, ManifestFormat, PackManifest};
pub use packfile::{Packfile, DEFAULT_VERSION, MAGIC};
pub use path::{normalize_path, split_path};
pub use type_tag::TypeTag;
pub use virtual_file::VirtualFile;
