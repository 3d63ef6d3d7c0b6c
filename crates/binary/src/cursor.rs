//! Endian-aware random-access byte cursor
//!
//! Reads past the end fail with `OutOfBounds`; writes past the end grow the
//! buffer. Writes inside the buffer overwrite in place, which is what the
//! encoders rely on when they back-patch header fields.

use bytes::{Buf, Bytes};
use thinner_core::{Endian, Result, ThinnerError};

/// Filler written after every 16-bit scene value
pub const SHORT_FILLER: [u8; 2] = [0xCD, 0xCD];

/// Longest string (in bytes) whose jps size still fits the size byte
pub const JPS_MAX_LEN: usize = 249;

const BOOL_TRUE: [u8; 4] = [0xFF; 4];
const BOOL_FALSE: [u8; 4] = [0x00; 4];

/// Round `value` up to the next multiple of `alignment` (a power of two or not)
#[inline]
pub fn align_up(value: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

/// Total bytes a jps string of `byte_len` bytes occupies.
///
/// # Format
/// - u8: total size (this value)
/// - u8: logical length (`byte_len + 1`, or 0 for the empty string)
/// - text bytes, then NUL
/// - zero padding up to `size`
///
/// The size is `logical + 2` rounded up to 4. Readers skip by the stored
/// size, never by the text they actually found.
#[inline]
pub fn jps_size(byte_len: usize) -> usize {
    let logical = if byte_len > 0 { byte_len + 1 } else { 0 };
    align_up(logical + 2, 4)
}

/// Growable, seekable byte buffer with an explicit byte order
#[derive(Debug, Clone, Default)]
pub struct BinaryCursor {
    data: Vec<u8>,
    pos: usize,
    endian: Endian,
}

macro_rules! numeric_io {
    ($($read:ident, $write:ident, $ty:ty, $get_be:ident, $get_le:ident);* $(;)?) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` in the cursor's byte order")]
            #[inline]
            pub fn $read(&mut self) -> Result<$ty> {
                let endian = self.endian;
                let mut raw = self.take(std::mem::size_of::<$ty>())?;
                Ok(match endian {
                    Endian::Big => raw.$get_be(),
                    Endian::Little => raw.$get_le(),
                })
            }

            #[doc = concat!("Write a `", stringify!($ty), "` in the cursor's byte order")]
            #[inline]
            pub fn $write(&mut self, value: $ty) {
                match self.endian {
                    Endian::Big => self.put(&value.to_be_bytes()),
                    Endian::Little => self.put(&value.to_le_bytes()),
                }
            }
        )*
    };
}

impl BinaryCursor {
    /// Empty cursor for writing
    pub fn new(endian: Endian) -> Self {
        Self {
            data: Vec::new(),
            pos: 0,
            endian,
        }
    }

    /// Cursor over existing bytes, positioned at the start
    pub fn from_bytes(data: impl Into<Vec<u8>>, endian: Endian) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            endian,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Buffer length, independent of the position
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }

    fn out_of_bounds(&self, offset: usize, requested: usize) -> ThinnerError {
        ThinnerError::OutOfBounds {
            offset,
            requested,
            available: self.data.len().saturating_sub(offset),
        }
    }

    /// Absolute positioning. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(self.out_of_bounds(pos, 0));
        }
        self.pos = pos;
        Ok(())
    }

    /// Relative positioning
    pub fn move_by(&mut self, delta: i64) -> Result<()> {
        let target = isize::try_from(delta)
            .ok()
            .and_then(|delta| self.pos.checked_add_signed(delta));
        match target {
            Some(target) => self.seek(target),
            None => Err(self.out_of_bounds(
                self.pos,
                usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX),
            )),
        }
    }

    /// Seek forward to the next multiple of `alignment`
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        self.seek(align_up(self.pos, alignment))
    }

    /// Write zeros up to the next multiple of `alignment`
    pub fn pad(&mut self, alignment: usize) {
        let target = align_up(self.pos, alignment);
        self.pad_to(target);
    }

    /// Write zeros until the position reaches `target`
    pub fn pad_to(&mut self, target: usize) {
        if target > self.pos {
            let zeros = vec![0u8; target - self.pos];
            self.put(&zeros);
        }
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        let start = self.pos;
        let end = match start.checked_add(n) {
            Some(end) if end <= self.data.len() => end,
            _ => return Err(self.out_of_bounds(start, n)),
        };
        self.pos = end;
        Ok(&self.data[start..end])
    }

    fn put(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.take(n)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.put(bytes);
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn write_u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_u8(value as u8);
    }

    numeric_io! {
        read_u16, write_u16, u16, get_u16, get_u16_le;
        read_i16, write_i16, i16, get_i16, get_i16_le;
        read_u32, write_u32, u32, get_u32, get_u32_le;
        read_i32, write_i32, i32, get_i32, get_i32_le;
        read_u64, write_u64, u64, get_u64, get_u64_le;
        read_i64, write_i64, i64, get_i64, get_i64_le;
        read_f32, write_f32, f32, get_f32, get_f32_le;
        read_f64, write_f64, f64, get_f64, get_f64_le;
    }

    /// Read a u32 without advancing
    pub fn peek_u32(&mut self) -> Result<u32> {
        let start = self.pos;
        let value = self.read_u32();
        self.pos = start;
        value
    }

    /// Read a 128-bit value stored as two u64 halves, high half first
    pub fn read_u128(&mut self) -> Result<u128> {
        let high = self.read_u64()? as u128;
        let low = self.read_u64()? as u128;
        Ok((high << 64) | low)
    }

    pub fn write_u128(&mut self, value: u128) {
        self.write_u64((value >> 64) as u64);
        self.write_u64(value as u64);
    }

    /// Read a 32-bit boolean: only `FF FF FF FF` is true
    pub fn read_bool32(&mut self) -> Result<bool> {
        Ok(self.take(4)? == BOOL_TRUE)
    }

    pub fn write_bool32(&mut self, value: bool) {
        self.put(if value { &BOOL_TRUE } else { &BOOL_FALSE });
    }

    /// Read a u16 and skip the two filler bytes after it
    pub fn read_u16_filler(&mut self) -> Result<u16> {
        let value = self.read_u16()?;
        self.take(2)?;
        Ok(value)
    }

    /// Write a u16 followed by `CD CD`
    pub fn write_u16_filler(&mut self, value: u16) {
        self.write_u16(value);
        self.put(&SHORT_FILLER);
    }

    pub fn read_i16_filler(&mut self) -> Result<i16> {
        let value = self.read_i16()?;
        self.take(2)?;
        Ok(value)
    }

    pub fn write_i16_filler(&mut self, value: i16) {
        self.write_i16(value);
        self.put(&SHORT_FILLER);
    }

    /// Read bytes up to a NUL and consume the NUL.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD rather than failing.
    pub fn read_str_null(&mut self) -> Result<String> {
        let start = self.pos;
        let rest = self.data.get(start..).unwrap_or_default();
        let Some(len) = rest.iter().position(|&b| b == 0) else {
            return Err(self.out_of_bounds(start, rest.len() + 1));
        };
        let text = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos = start + len + 1;
        Ok(text)
    }

    /// Write the UTF-8 bytes of `text` followed by a NUL
    pub fn write_str_null(&mut self, text: &str) -> Result<()> {
        if text.as_bytes().contains(&0) {
            return Err(ThinnerError::encoding(
                self.pos,
                format!("string {:?} contains an embedded NUL", text),
            ));
        }
        self.put(text.as_bytes());
        self.write_u8(0);
        Ok(())
    }

    /// Read a jps string and skip to the end of its declared size
    pub fn read_str_jps(&mut self) -> Result<String> {
        let start = self.pos;
        let size = self.read_u8()? as usize;
        let _logical_len = self.read_u8()?;
        let text = self.read_str_null()?;

        let end = start + size;
        if self.pos > end {
            return Err(ThinnerError::format(
                start,
                format!(
                    "jps string {:?} overruns its declared size of {} bytes",
                    text, size
                ),
            ));
        }
        self.seek(end)?;
        Ok(text)
    }

    /// Write a jps string, padded to exactly [`jps_size`] bytes
    pub fn write_str_jps(&mut self, text: &str) -> Result<()> {
        let bytes = text.as_bytes();
        if bytes.len() > JPS_MAX_LEN {
            return Err(ThinnerError::encoding(
                self.pos,
                format!(
                    "string of {} bytes exceeds the {} byte jps limit",
                    bytes.len(),
                    JPS_MAX_LEN
                ),
            ));
        }

        let start = self.pos;
        let size = jps_size(bytes.len());
        let logical = if bytes.is_empty() { 0 } else { bytes.len() + 1 };

        self.write_u8(size as u8);
        self.write_u8(logical as u8);
        self.write_str_null(text)?;
        self.pad_to(start + size);
        Ok(())
    }
}
