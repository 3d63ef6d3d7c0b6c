//! Opaque identifiers (link IDs, template IDs, GUIDs)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque fixed-width identifier.
///
/// Link IDs are 32-bit on the wire, template IDs are usually 32-bit and
/// scene GUIDs are 128-bit; all of them fit in one `u128`. Equality is
/// numeric, so `00,00,00,01` and `0,0,0,1` name the same ID.
///
/// Textually an ID is a comma-separated list of hex byte groups, most
/// significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Id(pub u128);

/// Error returned when hex-group text cannot be parsed into an [`Id`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ID text {text:?}: {reason}")]
pub struct IdParseError {
    pub text: String,
    pub reason: &'static str,
}

impl Id {
    pub const NULL: Id = Id(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u128 {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// The value as a 32-bit wire ID, if it fits
    pub fn to_u32(&self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }

    /// Smallest of the three supported widths (4, 8, 16 bytes) that holds the value
    pub fn min_width(&self) -> usize {
        if self.0 <= u32::MAX as u128 {
            4
        } else if self.0 <= u64::MAX as u128 {
            8
        } else {
            16
        }
    }

    fn groups(&self, width: usize) -> impl Iterator<Item = u8> {
        let width = width.max(self.min_width()).min(16);
        let bytes = self.0.to_be_bytes();
        bytes.into_iter().skip(16 - width)
    }

    /// Zero-filled hex groups, e.g. `00,00,1a,2b`.
    ///
    /// `width` is a minimum; values that need more bytes widen to 8 or 16.
    pub fn to_hex_groups(&self, width: usize) -> String {
        self.groups(width)
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Hex groups without the leading zero nibble, e.g. `0,0,1a,2b`.
    ///
    /// This is the spelling template IDs use inside scene string tables.
    pub fn to_compact_groups(&self, width: usize) -> String {
        self.groups(width)
            .map(|b| format!("{:x}", b))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse comma-separated hex byte groups.
    ///
    /// Whitespace is ignored. The group count must be 4, 8 or 16.
    pub fn parse_hex_groups(text: &str) -> Result<Self, IdParseError> {
        let err = |reason| IdParseError {
            text: text.to_string(),
            reason,
        };

        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let groups: Vec<&str> = cleaned.split(',').collect();
        if !matches!(groups.len(), 4 | 8 | 16) {
            return Err(err("expected 4, 8 or 16 byte groups"));
        }

        let mut value: u128 = 0;
        for group in groups {
            if group.is_empty() || group.len() > 2 {
                return Err(err("each group must be one or two hex digits"));
            }
            let byte = u8::from_str_radix(group, 16).map_err(|_| err("non-hex digit"))?;
            value = (value << 8) | byte as u128;
        }
        Ok(Self(value))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_groups(4))
    }
}

impl FromStr for Id {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex_groups(s)
    }
}

impl From<u32> for Id {
    fn from(id: u32) -> Self {
        Self(id as u128)
    }
}

impl From<u64> for Id {
    fn from(id: u64) -> Self {
        Self(id as u128)
    }
}

impl From<u128> for Id {
    fn from(id: u128) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_groups_zero_filled() {
        let id = Id::from(0x0001_1a2bu32);
        assert_eq!(id.to_hex_groups(4), "00,01,1a,2b");
        assert_eq!(id.to_string(), "00,01,1a,2b");
    }

    #[test]
    fn test_compact_groups() {
        let id = Id::from(0x0001_0a2bu32);
        assert_eq!(id.to_compact_groups(4), "0,1,a,2b");
    }

    #[test]
    fn test_parse_accepts_both_spellings() {
        let filled: Id = "00,01,0a,2b".parse().unwrap();
        let compact: Id = "0, 1, a, 2b".parse().unwrap();
        assert_eq!(filled, compact);
        assert_eq!(filled.get(), 0x0001_0a2b);
    }

    #[test]
    fn test_guid_width() {
        let guid = Id::new(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10);
        let text = guid.to_hex_groups(16);
        assert_eq!(text.split(',').count(), 16);
        assert_eq!(text.parse::<Id>().unwrap(), guid);
    }

    #[test]
    fn test_width_grows_with_value() {
        let id = Id::from(0x1_0000_0000u64);
        assert_eq!(id.min_width(), 8);
        assert_eq!(id.to_hex_groups(4).split(',').count(), 8);
        assert_eq!(id.to_u32(), None);
    }

    #[test]
    fn test_parse_rejects_bad_group_counts() {
        assert!("00,01".parse::<Id>().is_err());
        assert!("".parse::<Id>().is_err());
        assert!("00,01,02,zz".parse::<Id>().is_err());
        assert!("00,01,02,100".parse::<Id>().is_err());
    }
}
