//! Scene file schema versions and detection

use thinner_binary::BinaryCursor;
use thinner_core::{Endian, Result, ThinnerError};

/// First word of wrapped (v2 family) files
pub const WRAPPER_SENTINEL: u32 = 0x0100_0001;
/// Data sentinel of v2 files
pub const V2_SENTINEL: u32 = 0x0200_0002;
/// Data sentinel of v2-prototype files
pub const V2_PROTOTYPE_SENTINEL: u32 = 0x0200_0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SceneVersion {
    /// Plain layout with a GUID
    #[default]
    V1,
    /// Wrapped like v2 but still carrying a GUID
    V2Prototype,
    /// Wrapped, extra string table, no GUID
    V2,
}

/// Where a version's optional fields live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionLayout {
    /// Leading wrapper word and a data sentinel are present
    pub wrapped: bool,
    pub data_sentinel: Option<u32>,
    /// Added to stored string pointers to get absolute offsets
    pub pointer_adjust: u32,
    pub has_guid: bool,
    pub has_extra_strings: bool,
    /// Entity records carry a second reserved word
    pub entity_reserved_v2: bool,
}

impl VersionLayout {
    /// Absolute offset of the string table
    pub fn pool_start(&self) -> usize {
        if self.wrapped {
            8
        } else {
            4
        }
    }

    /// Value written into the pool's `StringPool` base, so interned
    /// offsets come out as stored pointers
    pub fn pointer_base(&self) -> u32 {
        self.pool_start() as u32 - self.pointer_adjust
    }
}

const V1_LAYOUT: VersionLayout = VersionLayout {
    wrapped: false,
    data_sentinel: None,
    pointer_adjust: 0,
    has_guid: true,
    has_extra_strings: false,
    entity_reserved_v2: false,
};

const V2_PROTOTYPE_LAYOUT: VersionLayout = VersionLayout {
    wrapped: true,
    data_sentinel: Some(V2_PROTOTYPE_SENTINEL),
    pointer_adjust: 4,
    has_guid: true,
    has_extra_strings: true,
    entity_reserved_v2: true,
};

const V2_LAYOUT: VersionLayout = VersionLayout {
    wrapped: true,
    data_sentinel: Some(V2_SENTINEL),
    pointer_adjust: 4,
    has_guid: false,
    has_extra_strings: true,
    entity_reserved_v2: true,
};

impl SceneVersion {
    pub fn layout(self) -> VersionLayout {
        match self {
            SceneVersion::V1 => V1_LAYOUT,
            SceneVersion::V2Prototype => V2_PROTOTYPE_LAYOUT,
            SceneVersion::V2 => V2_LAYOUT,
        }
    }

    /// Number used by the XML and JSON forms
    pub fn number(self) -> u32 {
        match self {
            SceneVersion::V1 => 1,
            SceneVersion::V2Prototype => 2,
            SceneVersion::V2 => 3,
        }
    }

    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(SceneVersion::V1),
            2 => Some(SceneVersion::V2Prototype),
            3 => Some(SceneVersion::V2),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SceneVersion::V1 => "v1",
            SceneVersion::V2Prototype => "v2-prototype",
            SceneVersion::V2 => "v2",
        }
    }
}

impl std::fmt::Display for SceneVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Work out which schema the cursor's buffer uses.
///
/// The cursor is returned to where it started, whatever the outcome.
pub fn detect_version(cursor: &mut BinaryCursor) -> Result<SceneVersion> {
    let start = cursor.position();
    let result = sniff(cursor, start);
    cursor.seek(start)?;
    result
}

fn sniff(cursor: &mut BinaryCursor, start: usize) -> Result<SceneVersion> {
    let first = cursor
        .read_u32()
        .map_err(|e| e.while_reading("scene header"))?;
    if first != WRAPPER_SENTINEL {
        return Ok(SceneVersion::V1);
    }

    let offset = cursor
        .read_u32()
        .map_err(|e| e.while_reading("scene header"))? as usize;
    let sentinel_at = start + offset + 4;
    cursor
        .seek(sentinel_at)
        .map_err(|e| e.while_reading("scene data sentinel"))?;
    let sentinel = cursor
        .read_u32()
        .map_err(|e| e.while_reading("scene data sentinel"))?;

    match sentinel {
        V2_SENTINEL => Ok(SceneVersion::V2),
        V2_PROTOTYPE_SENTINEL => Ok(SceneVersion::V2Prototype),
        other => Err(ThinnerError::format(
            sentinel_at,
            format!("unknown scene data sentinel {:#010x}", other),
        )),
    }
}

/// Convenience wrapper over a byte slice
pub fn detect_version_bytes(bytes: &[u8], endian: Endian) -> Result<SceneVersion> {
    let mut cursor = BinaryCursor::from_bytes(bytes, endian);
    detect_version(&mut cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapped(sentinel: u32) -> BinaryCursor {
        let mut cursor = BinaryCursor::new(Endian::Big);
        cursor.write_u32(WRAPPER_SENTINEL);
        // 8 bytes of string table
        cursor.write_u32(12);
        cursor.write_u32(0);
        cursor.write_u32(0);
        cursor.write_u32(sentinel);
        cursor.seek(0).unwrap();
        cursor
    }

    #[test]
    fn test_detects_each_version() {
        assert_eq!(detect_version(&mut wrapped(V2_SENTINEL)).unwrap(), SceneVersion::V2);
        assert_eq!(
            detect_version(&mut wrapped(V2_PROTOTYPE_SENTINEL)).unwrap(),
            SceneVersion::V2Prototype
        );
        assert_eq!(
            detect_version_bytes(&[0, 0, 0, 4, 0, 0, 0, 0], Endian::Big).unwrap(),
            SceneVersion::V1
        );
    }

    #[test]
    fn test_cursor_is_restored() {
        let mut cursor = wrapped(V2_SENTINEL);
        cursor.seek(0).unwrap();
        detect_version(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 0);

        let mut bad = wrapped(0xDEAD_BEEF);
        assert!(matches!(
            detect_version(&mut bad),
            Err(ThinnerError::Format { offset: 16, .. })
        ));
        assert_eq!(bad.position(), 0);
    }

    #[test]
    fn test_truncated_wrapper() {
        let err = detect_version_bytes(&[1, 0, 0, 1, 0, 0], Endian::Big).unwrap_err();
        assert!(matches!(err, ThinnerError::Format { .. }));
    }

    #[test]
    fn test_layout_table() {
        let v2p = SceneVersion::V2Prototype.layout();
        assert!(v2p.has_guid && v2p.has_extra_strings && v2p.wrapped);
        assert_eq!(v2p.pool_start(), 8);
        assert_eq!(v2p.pointer_base(), 4);
        assert_eq!(SceneVersion::V1.layout().pointer_base(), 4);
        assert!(!SceneVersion::V2.layout().has_guid);
        assert_eq!(SceneVersion::from_number(3), Some(SceneVersion::V2));
        assert_eq!(SceneVersion::from_number(4), None);
    }
}
