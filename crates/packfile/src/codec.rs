//! Packfile binary codec
//!
//! # Format
//! ```text
//! 0x00  magic         "PAK " (little-endian) or " KAP" (big-endian)
//! 0x04  u32 version
//! 0x08  u32 reserved, always 0
//! 0x0C  u32 header_size (32)
//! 0x10  u32 data offset, relative to header_size
//! header_size:
//!       u32 file count
//!       count x { u32 real, u32 compressed, u32 aligned,
//!                 u32 folder ptr, [u8; 4] type tag, u32 name ptr }
//!       name pool (null-terminated, pointers relative to its start)
//! data offset (32-aligned):
//!       payload blocks, each zero-padded to 32 bytes
//! ```

use crate::packfile::{Packfile, MAGIC};
use crate::path::{join_path, split_path};
use crate::type_tag::TypeTag;
use crate::virtual_file::VirtualFile;
use std::borrow::Cow;
use thinner_binary::{align_up, deflate, inflate, BinaryCursor, PoolEncoding, StringPool, MAX_LEVEL, MIN_LEVEL};
use thinner_core::{Endian, Result, ThinnerError};

pub const DEFAULT_HEADER_SIZE: u32 = 32;
pub const RECORD_SIZE: usize = 24;
pub const DATA_ALIGNMENT: usize = 32;

/// Placement of one file in an encoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLayout {
    pub real_size: u32,
    pub compressed_size: u32,
    pub aligned_size: u32,
    pub folder_pointer: u32,
    pub name_pointer: u32,
    /// Absolute offset of the data block
    pub data_offset: usize,
}

impl EntryLayout {
    /// Whether the payload is stored deflated
    pub fn is_compressed(&self) -> bool {
        self.compressed_size != self.real_size
    }

    /// Byte range of the aligned data block
    pub fn block(&self) -> std::ops::Range<usize> {
        self.data_offset..self.data_offset + self.aligned_size as usize
    }
}

/// Where everything lands when a packfile is encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackLayout {
    pub header_size: u32,
    pub pool_offset: usize,
    pub pool_size: usize,
    pub data_offset: usize,
    pub entries: Vec<EntryLayout>,
    pub total_size: usize,
}

impl PackLayout {
    /// Index of the file whose aligned block contains `offset`
    pub fn entry_at(&self, offset: usize) -> Option<usize> {
        self.entries.iter().position(|e| e.block().contains(&offset))
    }
}

struct Prepared<'a> {
    layout: PackLayout,
    pool: StringPool,
    payloads: Vec<Cow<'a, [u8]>>,
}

/// Detect byte order from the literal magic bytes
pub fn sniff_endian(bytes: &[u8]) -> Result<Endian> {
    let magic = bytes
        .get(..4)
        .ok_or_else(|| ThinnerError::format(0, "truncated packfile magic"))?;

    let mut reversed = MAGIC;
    reversed.reverse();

    if magic == MAGIC {
        Ok(Endian::Little)
    } else if magic == reversed {
        Ok(Endian::Big)
    } else {
        Err(ThinnerError::format(
            0,
            format!("bad packfile magic {:02x?}", magic),
        ))
    }
}

fn to_u32(value: usize, offset: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ThinnerError::encoding(offset, format!("{} of {} bytes exceeds u32", what, value)))
}

/// Payload bytes as they will be stored.
///
/// A deflated stream that happens to be exactly as long as the raw data would
/// read back as uncompressed, so other levels are tried before giving up.
fn stored_payload(file: &VirtualFile) -> Result<Cow<'_, [u8]>> {
    if !file.compress {
        return Ok(Cow::Borrowed(&file.data));
    }

    let compressed = deflate(&file.data, file.compression_level)?;
    if compressed.len() != file.data.len() {
        return Ok(Cow::Owned(compressed));
    }

    for level in (MIN_LEVEL..=MAX_LEVEL).filter(|&l| l != file.compression_level) {
        let retry = deflate(&file.data, level)?;
        if retry.len() != file.data.len() {
            tracing::debug!("{}: stored at zlib level {} to keep sizes distinct", file.path, level);
            return Ok(Cow::Owned(retry));
        }
    }

    tracing::warn!(
        "{}: deflated size equals raw size at every level, storing uncompressed",
        file.path
    );
    Ok(Cow::Borrowed(&file.data))
}

fn read_name(cursor: &mut BinaryCursor, pool_offset: usize, pointer: u32, what: &str) -> Result<String> {
    let target = pool_offset + pointer as usize;
    if target >= cursor.size() {
        return Err(ThinnerError::format(
            cursor.position(),
            format!("{} pointer {:#x} outside image", what, pointer),
        ));
    }

    let resume = cursor.position();
    cursor.seek(target)?;
    let name = cursor.read_str_null().map_err(|e| e.while_reading(what))?;
    cursor.seek(resume)?;
    Ok(name)
}

impl Packfile {
    /// Parse a complete packfile image
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let endian = sniff_endian(bytes)?;
        let mut cursor = BinaryCursor::from_bytes(bytes, endian);

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        if endian == Endian::Big {
            magic.reverse();
        }

        cursor.seek(4)?;
        let (version, reserved, header_size, data_rel) = (|| {
            Ok::<_, ThinnerError>((
                cursor.read_u32()?,
                cursor.read_u32()?,
                cursor.read_u32()?,
                cursor.read_u32()?,
            ))
        })()
        .map_err(|e| e.while_reading("packfile header"))?;

        if reserved != 0 {
            tracing::warn!("packfile reserved header field is {:#x}, expected 0", reserved);
        }

        let header_size = header_size as usize;
        let mut data_pos = header_size + data_rel as usize;

        cursor
            .seek(header_size)
            .map_err(|e| e.while_reading("file table"))?;
        let count = cursor.read_u32().map_err(|e| e.while_reading("file count"))? as usize;

        let pool_offset = count
            .checked_mul(RECORD_SIZE)
            .and_then(|table| table.checked_add(header_size + 4))
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| {
                ThinnerError::format(header_size, format!("file count {} exceeds image size", count))
            })?;

        let mut files = Vec::with_capacity(count);
        for index in 0..count {
            let record_offset = cursor.position();
            let real_size = cursor.read_u32()? as usize;
            let compressed_size = cursor.read_u32()? as usize;
            let aligned_size = cursor.read_u32()? as usize;
            let folder_pointer = cursor.read_u32()?;
            let type_tag = TypeTag::from_wire(cursor.read_array::<4>()?, endian);
            let name_pointer = cursor.read_u32()?;

            if aligned_size < compressed_size {
                return Err(ThinnerError::format(
                    record_offset,
                    format!(
                        "file {} aligned size {} is smaller than stored size {}",
                        index, aligned_size, compressed_size
                    ),
                ));
            }

            let folder = read_name(&mut cursor, pool_offset, folder_pointer, "folder name")?;
            let name = read_name(&mut cursor, pool_offset, name_pointer, "file name")?;
            let path = join_path(&folder, &name);

            let stored = bytes
                .get(data_pos..data_pos + compressed_size)
                .ok_or_else(|| {
                    ThinnerError::format(
                        data_pos,
                        format!("truncated data for {} ({} bytes)", path, compressed_size),
                    )
                })?;

            let compress = compressed_size != real_size;
            let data = if compress {
                let data = inflate(stored, data_pos)?;
                if data.len() != real_size {
                    return Err(ThinnerError::format(
                        data_pos,
                        format!(
                            "{} inflated to {} bytes, record says {}",
                            path,
                            data.len(),
                            real_size
                        ),
                    ));
                }
                data
            } else {
                stored.to_vec()
            };

            tracing::trace!(
                "record {}: {} [{}] real={} stored={} at {:#x}",
                index,
                path,
                type_tag,
                real_size,
                compressed_size,
                data_pos
            );

            files.push(VirtualFile {
                path,
                data,
                compress,
                compression_level: thinner_binary::DEFAULT_LEVEL,
                type_tag,
            });
            data_pos += aligned_size;
        }

        tracing::debug!("decoded packfile: {} files, {} endian", files.len(), endian);
        Ok(Packfile {
            magic,
            version,
            files,
        })
    }

    fn prepare(&self) -> Result<Prepared<'_>> {
        let header_size = DEFAULT_HEADER_SIZE as usize;
        let pool_offset = header_size + 4 + self.files.len() * RECORD_SIZE;
        let mut pool = StringPool::new(0, PoolEncoding::NullTerminated);

        let mut pointers = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let (folder, name) = split_path(&file.path);
            let folder_pointer = pool.intern(folder)?;
            let name_pointer = pool.intern(name)?;
            pointers.push((folder_pointer, name_pointer));
        }

        let data_offset = align_up(pool_offset + pool.len(), DATA_ALIGNMENT);

        let mut entries = Vec::with_capacity(self.files.len());
        let mut payloads = Vec::with_capacity(self.files.len());
        let mut cursor = data_offset;
        for (file, (folder_pointer, name_pointer)) in self.files.iter().zip(pointers) {
            let payload = stored_payload(file)?;
            let aligned = align_up(payload.len(), DATA_ALIGNMENT);
            entries.push(EntryLayout {
                real_size: to_u32(file.data.len(), cursor, "file")?,
                compressed_size: to_u32(payload.len(), cursor, "stored file")?,
                aligned_size: to_u32(aligned, cursor, "aligned file")?,
                folder_pointer,
                name_pointer,
                data_offset: cursor,
            });
            payloads.push(payload);
            cursor += aligned;
        }

        Ok(Prepared {
            layout: PackLayout {
                header_size: DEFAULT_HEADER_SIZE,
                pool_offset,
                pool_size: pool.len(),
                data_offset,
                entries,
                total_size: cursor,
            },
            pool,
            payloads,
        })
    }

    /// Compute the encoded layout without building the image
    pub fn plan(&self) -> Result<PackLayout> {
        Ok(self.prepare()?.layout)
    }

    /// Serialise to a packfile image in the given byte order.
    ///
    /// Output is deterministic for a given file list.
    pub fn encode(&self, endian: Endian) -> Result<Vec<u8>> {
        let Prepared {
            layout,
            pool,
            payloads,
        } = self.prepare()?;

        let mut cursor = BinaryCursor::new(endian);
        let mut magic = self.magic;
        if endian == Endian::Big {
            magic.reverse();
        }
        cursor.write_bytes(&magic);
        cursor.write_u32(self.version);
        cursor.write_u32(0);
        cursor.write_u32(layout.header_size);
        cursor.write_u32(to_u32(
            layout.data_offset - layout.header_size as usize,
            0x10,
            "data offset",
        )?);
        cursor.pad_to(layout.header_size as usize);

        cursor.write_u32(to_u32(self.files.len(), cursor.position(), "file count")?);
        for (file, entry) in self.files.iter().zip(&layout.entries) {
            cursor.write_u32(entry.real_size);
            cursor.write_u32(entry.compressed_size);
            cursor.write_u32(entry.aligned_size);
            cursor.write_u32(entry.folder_pointer);
            cursor.write_bytes(&file.type_tag.to_wire(endian));
            cursor.write_u32(entry.name_pointer);
        }

        cursor.write_bytes(pool.as_bytes());
        cursor.pad_to(layout.data_offset);

        for payload in &payloads {
            cursor.write_bytes(payload);
            cursor.pad(DATA_ALIGNMENT);
        }

        tracing::debug!(
            "encoded packfile: {} files, {} bytes, {} endian",
            self.files.len(),
            cursor.size(),
            endian
        );
        Ok(cursor.into_inner())
    }

    /// Which file's data block covers absolute `offset` of the encoded image
    pub fn file_at_data_offset(&self, offset: usize) -> Result<Option<&VirtualFile>> {
        let layout = self.plan()?;
        Ok(layout.entry_at(offset).map(|idx| &self.files[idx]))
    }
}
