//! Packfile model, lookup and mutation

use crate::path::normalize_path;
use crate::virtual_file::VirtualFile;
use thinner_core::{Result, ThinnerError};

/// Magic as spelled by little-endian images; big-endian images store it reversed
pub const MAGIC: [u8; 4] = *b"PAK ";

/// Container version written by the shipping tools
pub const DEFAULT_VERSION: u32 = 2;

/// Ordered collection of virtual files.
///
/// The list order is the on-disk data order and the engine's load order.
/// Every mutation below keeps the relative order of untouched files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packfile {
    /// Canonical (little-endian) spelling of the magic
    pub magic: [u8; 4],
    pub version: u32,
    pub files: Vec<VirtualFile>,
}

impl Default for Packfile {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: DEFAULT_VERSION,
            files: Vec::new(),
        }
    }
}

impl Packfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: Vec<VirtualFile>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Position of the first file matching `path` (case-insensitive)
    pub fn index_of(&self, path: &str) -> Option<usize> {
        let wanted = normalize_path(path);
        self.files.iter().position(|f| f.normalized_path() == wanted)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index_of(path).is_some()
    }

    pub fn get_file_from_path(&self, path: &str) -> Option<&VirtualFile> {
        self.index_of(path).map(|idx| &self.files[idx])
    }

    pub fn get_file_mut(&mut self, path: &str) -> Option<&mut VirtualFile> {
        self.index_of(path).map(move |idx| &mut self.files[idx])
    }

    fn require(&self, path: &str) -> Result<usize> {
        self.index_of(path)
            .ok_or_else(|| ThinnerError::NotFound(format!("no file {:?} in packfile", path)))
    }

    fn check_index(&self, index: usize, limit: usize) -> Result<()> {
        if index > limit {
            return Err(ThinnerError::OutOfBounds {
                offset: index,
                requested: 1,
                available: self.files.len(),
            });
        }
        Ok(())
    }

    /// Stored paths in list order
    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    /// First file whose normalised path ends with the normalised `suffix`
    pub fn find_by_suffix(&self, suffix: &str) -> Option<&VirtualFile> {
        let suffix = normalize_path(suffix);
        self.files
            .iter()
            .find(|f| f.normalized_path().ends_with(&suffix))
    }

    /// Append at the end of the load order
    pub fn add_file(&mut self, file: VirtualFile) {
        tracing::trace!("add {}", file.path);
        self.files.push(file);
    }

    /// Insert before the file currently at `index` (`index == len` appends)
    pub fn insert_file(&mut self, index: usize, file: VirtualFile) -> Result<()> {
        self.check_index(index, self.files.len())?;
        tracing::trace!("insert {} at {}", file.path, index);
        self.files.insert(index, file);
        Ok(())
    }

    pub fn remove_file(&mut self, path: &str) -> Result<VirtualFile> {
        let idx = self.require(path)?;
        Ok(self.files.remove(idx))
    }

    pub fn rename_file(&mut self, old_path: &str, new_path: &str) -> Result<()> {
        let idx = self.require(old_path)?;
        self.files[idx].path = new_path.to_string();
        Ok(())
    }

    /// Replace payload, compression and tag of the file with the same path,
    /// keeping its position and stored path spelling
    pub fn replace_file(&mut self, replacement: VirtualFile) -> Result<()> {
        let idx = self.require(&replacement.path)?;
        let file = &mut self.files[idx];
        file.data = replacement.data;
        file.compress = replacement.compress;
        file.compression_level = replacement.compression_level;
        file.type_tag = replacement.type_tag;
        Ok(())
    }

    /// Move the file at `from` so that it ends up at index `to`
    pub fn move_file(&mut self, from: usize, to: usize) -> Result<()> {
        let last = self.files.len().saturating_sub(1);
        self.check_index(from, last)?;
        self.check_index(to, last)?;
        if self.files.is_empty() {
            return Err(ThinnerError::NotFound("packfile is empty".into()));
        }
        let file = self.files.remove(from);
        self.files.insert(to, file);
        Ok(())
    }

    pub fn swap_files(&mut self, a: usize, b: usize) -> Result<()> {
        let last = self.files.len().saturating_sub(1);
        self.check_index(a, last)?;
        self.check_index(b, last)?;
        if self.files.is_empty() {
            return Err(ThinnerError::NotFound("packfile is empty".into()));
        }
        self.files.swap(a, b);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Packfile {
        Packfile::with_files(vec![
            VirtualFile::new("a.bin", vec![1]),
            VirtualFile::new("models/b.nif", vec![2]),
            VirtualFile::new("models/c.nif", vec![3]),
        ])
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut pak = Packfile::new();
        pak.add_file(VirtualFile::new("Characters\\Mickey.NIF", vec![9]));

        let file = pak.get_file_from_path("characters/mickey.nif").unwrap();
        assert_eq!(file.data, vec![9]);
        assert!(pak.contains("/CHARACTERS/mickey.nif"));
        assert!(pak.get_file_from_path("characters/minnie.nif").is_none());
    }

    #[test]
    fn test_insert_and_remove_keep_order() {
        let mut pak = sample();
        pak.insert_file(1, VirtualFile::new("x.lua", vec![])).unwrap();
        assert_eq!(pak.paths(), vec!["a.bin", "x.lua", "models/b.nif", "models/c.nif"]);

        let removed = pak.remove_file("MODELS/B.NIF").unwrap();
        assert_eq!(removed.data, vec![2]);
        assert_eq!(pak.paths(), vec!["a.bin", "x.lua", "models/c.nif"]);

        assert!(pak.insert_file(9, VirtualFile::new("y", vec![])).is_err());
        assert!(matches!(pak.remove_file("nope"), Err(ThinnerError::NotFound(_))));
    }

    #[test]
    fn test_rename_and_replace() {
        let mut pak = sample();
        pak.rename_file("a.bin", "levels/a.bin").unwrap();
        assert_eq!(pak.files[0].path, "levels/a.bin");

        pak.replace_file(VirtualFile::new("Models/C.nif", vec![7, 7]).with_compression(9))
            .unwrap();
        let c = &pak.files[2];
        assert_eq!(c.path, "models/c.nif");
        assert_eq!(c.data, vec![7, 7]);
        assert!(c.compress);
        assert_eq!(c.compression_level, 9);
    }

    #[test]
    fn test_move_and_swap() {
        let mut pak = sample();
        pak.move_file(0, 2).unwrap();
        assert_eq!(pak.paths(), vec!["models/b.nif", "models/c.nif", "a.bin"]);

        pak.swap_files(0, 1).unwrap();
        assert_eq!(pak.paths(), vec!["models/c.nif", "models/b.nif", "a.bin"]);

        assert!(pak.move_file(3, 0).is_err());
        assert!(Packfile::new().swap_files(0, 0).is_err());
    }

    #[test]
    fn test_find_by_suffix() {
        let pak = sample();
        assert_eq!(pak.find_by_suffix("C.NIF").unwrap().data, vec![3]);
        assert!(pak.find_by_suffix("d.nif").is_none());
    }

    #[test]
    fn test_get_file_mut() {
        let mut pak = sample();
        pak.get_file_mut("a.bin").unwrap().data.push(5);
        assert_eq!(pak.files[0].data, vec![1, 5]);
    }
}
