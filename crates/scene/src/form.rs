//! Telling the three scene forms apart by content

use crate::model::SceneFile;
use std::fmt;
use thinner_core::{Endian, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneForm {
    Binary,
    Xml,
    Json,
}

impl fmt::Display for SceneForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SceneForm::Binary => "binary",
            SceneForm::Xml => "XML",
            SceneForm::Json => "JSON",
        })
    }
}

/// Guess the form of a scene file.
///
/// NUL-free UTF-8 whose first non-blank character is `<` is XML, `{` is
/// JSON. Everything else is binary; a little-endian string table size of 60
/// or 123 bytes starts with `<` or `{` too, but is followed by zero bytes.
pub fn detect_form(bytes: &[u8]) -> SceneForm {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if body.contains(&0) || std::str::from_utf8(body).is_err() {
        return SceneForm::Binary;
    }
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') => SceneForm::Xml,
        Some(b'{') => SceneForm::Json,
        _ => SceneForm::Binary,
    }
}

impl SceneFile {
    /// Load any form; `endian` only applies when the bytes are binary
    pub fn from_bytes_auto(bytes: &[u8], endian: Endian) -> Result<Self> {
        let form = detect_form(bytes);
        tracing::debug!("detected {} scene ({} bytes)", form, bytes.len());

        let text = || String::from_utf8_lossy(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes));
        match form {
            SceneForm::Binary => Self::decode(bytes, endian),
            SceneForm::Xml => Self::from_xml(&text()),
            SceneForm::Json => Self::from_json(&text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;
    use crate::version::SceneVersion;
    use thinner_core::Id;

    fn sample() -> SceneFile {
        let mut file = SceneFile::new(SceneVersion::V2);
        file.objects.entities.push(Entity::new("Root", Id::from(1u32)));
        file
    }

    #[test]
    fn test_detect() {
        assert_eq!(detect_form(b"  \n<GSA/>"), SceneForm::Xml);
        assert_eq!(detect_form(b"\xEF\xBB\xBF<?xml version=\"1.0\"?>"), SceneForm::Xml);
        assert_eq!(detect_form(b"\t{\"version\": 3}"), SceneForm::Json);
        assert_eq!(detect_form(&[0x3C, 0xFF, 0xFE]), SceneForm::Binary);
        assert_eq!(detect_form(&[0, 0, 0, 1]), SceneForm::Binary);
        assert_eq!(detect_form(&[0x3C, 0, 0, 0, 0x7B]), SceneForm::Binary);
        assert_eq!(detect_form(b""), SceneForm::Binary);
    }

    #[test]
    fn test_every_form_loads() {
        let file = sample();
        let inputs = [
            file.encode(Endian::Little).unwrap(),
            file.to_xml(true).unwrap().into_bytes(),
            file.to_json(false).unwrap().into_bytes(),
        ];
        for bytes in inputs {
            assert_eq!(SceneFile::from_bytes_auto(&bytes, Endian::Little).unwrap(), file);
        }
    }
}
