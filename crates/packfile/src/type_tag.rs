//! Four-character file type tags

use serde::{Deserialize, Serialize};
use std::fmt;
use thinner_core::{Endian, Result, ThinnerError};

/// Short ASCII type marker stored in every file record.
///
/// On the wire the tag is null-padded to four bytes and byte-reversed for
/// little-endian images. Untyped files carry an empty tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeTag(String);

impl TypeTag {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.len() > 4 || text.contains('\0') {
            return Err(ThinnerError::encoding(
                0,
                format!("type tag {:?} must be at most 4 bytes without NUL", text),
            ));
        }
        Ok(Self(text))
    }

    /// Empty tag for untyped files
    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the four record bytes
    pub fn from_wire(raw: [u8; 4], endian: Endian) -> Self {
        let mut raw = raw;
        if endian == Endian::Little {
            raw.reverse();
        }
        let bytes: Vec<u8> = raw.into_iter().filter(|&b| b != 0).collect();
        Self(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Encode as four record bytes
    pub fn to_wire(&self, endian: Endian) -> [u8; 4] {
        let mut raw = [0u8; 4];
        raw[..self.0.len()].copy_from_slice(self.0.as_bytes());
        if endian == Endian::Little {
            raw.reverse();
        }
        raw
    }

    /// Tag the engine expects for a virtual path, inferred from its extension
    pub fn for_path(path: &str) -> Self {
        let path = crate::path::normalize_path(path);
        let ends = |exts: &[&str]| exts.iter().any(|ext| path.ends_with(ext));

        let tag = if ends(&[".bsq"]) {
            "BSQ"
        } else if ends(&[".nif", ".nif_wii"]) {
            "NIF"
        } else if ends(&[".kf", ".kf_wii"]) {
            "KF"
        } else if ends(&[".kfm", ".kfm_wii"]) {
            "KFM"
        } else if ends(&[".hkx", ".hkx_wii"]) {
            // Behaviour graphs live under characters/, shared rigs do not
            if path.starts_with("characters/") && !path.starts_with("characters/shared/") {
                "HKB"
            } else {
                "HKX"
            }
        } else if ends(&[".hkw"]) {
            "HKW"
        } else if ends(&[".lit_cooked"]) {
            "LIT"
        } else {
            ""
        };
        Self(tag.to_string())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TypeTag {
    type Error = ThinnerError;

    fn try_from(text: String) -> Result<Self> {
        Self::new(text)
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_is_endian_mirrored() {
        let tag = TypeTag::new("NIF").unwrap();
        assert_eq!(&tag.to_wire(Endian::Big), b"NIF\0");
        assert_eq!(&tag.to_wire(Endian::Little), b"\0FIN");

        assert_eq!(TypeTag::from_wire(*b"\0FIN", Endian::Little), tag);
        assert_eq!(TypeTag::from_wire(*b"NIF\0", Endian::Big), tag);
        assert!(TypeTag::from_wire([0; 4], Endian::Big).is_empty());
    }

    #[test]
    fn test_rejects_long_tags() {
        assert!(TypeTag::new("TOOLONG").is_err());
        assert!(TypeTag::new("A\0").is_err());
        assert!(TypeTag::new("").is_ok());
    }

    #[test]
    fn test_for_path() {
        assert_eq!(TypeTag::for_path("levels/a.bsq").as_str(), "BSQ");
        assert_eq!(TypeTag::for_path("Models\\Tree.NIF").as_str(), "NIF");
        assert_eq!(TypeTag::for_path("anim/walk.kf_wii").as_str(), "KF");
        assert_eq!(TypeTag::for_path("anim/walk.kfm").as_str(), "KFM");
        assert_eq!(TypeTag::for_path("characters/mickey/behave.hkx").as_str(), "HKB");
        assert_eq!(TypeTag::for_path("characters/shared/rig.hkx").as_str(), "HKX");
        assert_eq!(TypeTag::for_path("physics/world.hkw").as_str(), "HKW");
        assert_eq!(TypeTag::for_path("light/a.lit_cooked").as_str(), "LIT");
        assert!(TypeTag::for_path("scripts/main.lua").is_empty());
    }

    #[test]
    fn test_serde_validates() {
        let tag: TypeTag = serde_json::from_str("\"HKB\"").unwrap();
        assert_eq!(tag.as_str(), "HKB");
        assert!(serde_json::from_str::<TypeTag>("\"HAVOK\"").is_err());
    }
}
