//! One named entry of a packfile

use crate::path::{normalize_path, split_path};
use crate::type_tag::TypeTag;
use thinner_binary::DEFAULT_LEVEL;

/// A file inside a packfile.
///
/// `data` is always the decompressed payload. `compress` decides whether the
/// encoder deflates it; `compression_level` only matters while encoding and
/// cannot be recovered from an encoded image, so equality ignores it.
#[derive(Debug, Clone)]
pub struct VirtualFile {
    pub path: String,
    pub data: Vec<u8>,
    pub compress: bool,
    pub compression_level: u32,
    pub type_tag: TypeTag,
}

impl VirtualFile {
    /// Uncompressed, untyped file
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
            compress: false,
            compression_level: DEFAULT_LEVEL,
            type_tag: TypeTag::none(),
        }
    }

    /// File whose tag and compression are inferred from the path
    pub fn from_path_and_data(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        Self {
            type_tag: TypeTag::for_path(&path),
            compress: Self::compress_by_default(&path),
            ..Self::new(path, data)
        }
    }

    pub fn with_compression(mut self, level: u32) -> Self {
        self.compress = true;
        self.compression_level = level;
        self
    }

    pub fn with_type_tag(mut self, tag: TypeTag) -> Self {
        self.type_tag = tag;
        self
    }

    /// Scene and script payloads ship compressed
    pub fn compress_by_default(path: &str) -> bool {
        let path = normalize_path(path);
        path.ends_with(".bin") || path.ends_with(".lua")
    }

    /// (folder, file name) as stored in the name pool
    pub fn split_path(&self) -> (&str, &str) {
        split_path(&self.path)
    }

    pub fn normalized_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// Case- and separator-insensitive path match
    pub fn matches_path(&self, path: &str) -> bool {
        self.normalized_path() == normalize_path(path)
    }

    pub fn real_size(&self) -> usize {
        self.data.len()
    }
}

impl PartialEq for VirtualFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.data == other.data
            && self.compress == other.compress
            && self.type_tag == other.type_tag
    }
}

impl Eq for VirtualFile {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference() {
        let file = VirtualFile::from_path_and_data("levels/Level01.BIN", vec![1, 2, 3]);
        assert!(file.compress);
        assert_eq!(file.compression_level, 6);
        assert!(file.type_tag.is_empty());

        let file = VirtualFile::from_path_and_data("models/a.nif", vec![]);
        assert!(!file.compress);
        assert_eq!(file.type_tag.as_str(), "NIF");
    }

    #[test]
    fn test_equality_ignores_level() {
        let a = VirtualFile::new("a.lua", b"x".to_vec()).with_compression(1);
        let b = VirtualFile::new("a.lua", b"x".to_vec()).with_compression(9);
        assert_eq!(a, b);
        assert_ne!(a, VirtualFile::new("a.lua", b"x".to_vec()));
    }

    #[test]
    fn test_matches_path() {
        let file = VirtualFile::new("Characters\\Mickey.NIF", vec![]);
        assert!(file.matches_path("characters/mickey.nif"));
        assert!(file.matches_path("/CHARACTERS/MICKEY.nif"));
        assert!(!file.matches_path("characters/mickey"));
    }
}
