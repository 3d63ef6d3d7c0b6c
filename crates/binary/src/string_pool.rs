//! Deduplicating string table builder

use crate::cursor::BinaryCursor;
use std::collections::HashMap;
use thinner_core::{Endian, Result, ThinnerError};

/// How each pooled string is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEncoding {
    /// UTF-8 bytes followed by a single NUL (packfile name table)
    NullTerminated,
    /// Size byte, length byte, text, NUL, padding to 4 (scene string table)
    Jps,
}

/// Accumulates unique strings into one contiguous blob.
///
/// The first occurrence of a string fixes its offset, so the same input
/// order always yields the same bytes. Returned offsets include `base`,
/// the position the blob will occupy in the final image.
#[derive(Debug, Clone)]
pub struct StringPool {
    base: u32,
    encoding: PoolEncoding,
    offsets: HashMap<String, u32>,
    data: Vec<u8>,
}

impl StringPool {
    pub fn new(base: u32, encoding: PoolEncoding) -> Self {
        Self {
            base,
            encoding,
            offsets: HashMap::new(),
            data: Vec::new(),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn encoding(&self) -> PoolEncoding {
        self.encoding
    }

    /// Add `text` if it is new and return `base + offset` of its single copy
    pub fn intern(&mut self, text: &str) -> Result<u32> {
        if let Some(&offset) = self.offsets.get(text) {
            return self.pointer(offset);
        }

        let offset = u32::try_from(self.data.len()).map_err(|_| {
            ThinnerError::encoding(self.data.len(), "string pool exceeds 4 GiB")
        })?;
        let pointer = self.pointer(offset)?;

        // The pool has no endianness of its own; jps strings only contain bytes
        let mut cursor = BinaryCursor::new(Endian::Big);
        match self.encoding {
            PoolEncoding::NullTerminated => cursor.write_str_null(text),
            PoolEncoding::Jps => cursor.write_str_jps(text),
        }
        .map_err(|err| match err {
            ThinnerError::Encoding { message, .. } => {
                ThinnerError::encoding(self.base as usize + self.data.len(), message)
            }
            other => other,
        })?;

        self.data.extend_from_slice(cursor.as_slice());
        self.offsets.insert(text.to_string(), offset);
        tracing::trace!("pooled {:?} at +{:#x}", text, offset);
        Ok(pointer)
    }

    fn pointer(&self, offset: u32) -> Result<u32> {
        self.base.checked_add(offset).ok_or_else(|| {
            ThinnerError::encoding(
                self.base as usize + offset as usize,
                "string pointer does not fit in 32 bits",
            )
        })
    }

    /// Pointer of an already interned string
    pub fn offset_of(&self, text: &str) -> Option<u32> {
        self.offsets
            .get(text)
            .and_then(|offset| self.base.checked_add(*offset))
    }

    /// Byte length of the blob
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of distinct strings
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
