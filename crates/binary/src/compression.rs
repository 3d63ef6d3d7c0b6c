//! zlib layer for packfile payloads

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thinner_core::{Result, ThinnerError};

/// zlib level used when nothing else is specified
pub const DEFAULT_LEVEL: u32 = 6;

/// Lowest and highest accepted zlib levels
pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 9;

/// Deflate `data` into a zlib stream at `level` (1-9)
pub fn deflate(data: &[u8], level: u32) -> Result<Vec<u8>> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(ThinnerError::encoding(
            0,
            format!("zlib level {} outside {}..={}", level, MIN_LEVEL, MAX_LEVEL),
        ));
    }

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflate a zlib stream that was found at `offset` in the source image
pub fn inflate(data: &[u8], offset: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|err| ThinnerError::format(offset, format!("inflate failed: {}", err)))?;
    Ok(decompressed)
}
