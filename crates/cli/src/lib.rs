//! Command implementations behind the `thinner` binary
//!
//! # Commands
//!
//! - `thinner pak list <pak>` - one line per file: index, path, tag, sizes
//! - `thinner pak extract <pak> <dir>` - payloads, `manifest.json` (or `.xml`) and scene sidecars
//! - `thinner pak build <manifest> <dir> <out>` - rebuild from an extracted tree
//! - `thinner pak create <dir> <out>` - pack a plain directory
//! - `thinner pak convert <in> <out>` - packfile to or from a document with inline payloads
//! - `thinner scene convert <in> <out>` - binary, XML or JSON, chosen by extension or content
//! - `thinner scene info <in>` - version and counts
//!
//! Every command takes the resolved [`ToolConfig`](thinner_config::ToolConfig)
//! explicitly; nothing here reads the environment.

pub mod pak;
pub mod scene;

use anyhow::{bail, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thinner_config::SceneFormat;
use thinner_packfile::ManifestFormat;

/// Stem of the manifest written next to extracted payloads
pub const MANIFEST_STEM: &str = "manifest";

/// `manifest.json` or `manifest.xml`
pub fn manifest_file(format: ManifestFormat) -> String {
    format!("{}.{}", MANIFEST_STEM, format.extension())
}

/// Map a packfile path onto `root`, refusing anything that escapes it
pub fn payload_path(root: &Path, pak_path: &str) -> Result<PathBuf> {
    let mut out = root.to_path_buf();
    let mut parts = 0;
    for part in pak_path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => bail!("packfile path {:?} leaves the output directory", pak_path),
            part => {
                out.push(part);
                parts += 1;
            }
        }
    }
    if parts == 0 {
        bail!("packfile path {:?} is empty", pak_path);
    }
    Ok(out)
}

/// `<payload>.xml` or `<payload>.json`
pub fn sidecar_path(payload: &Path, format: SceneFormat) -> PathBuf {
    let mut name = OsString::from(payload.as_os_str());
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

/// Packfile entries that may hold a scene
pub fn is_scene_path(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".bin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_path() {
        let root = Path::new("out");
        assert_eq!(
            payload_path(root, "levels\\town/a.bin").unwrap(),
            Path::new("out/levels/town/a.bin")
        );
        assert!(payload_path(root, "../etc/passwd").is_err());
        assert!(payload_path(root, "a/../../b").is_err());
        assert!(payload_path(root, "/").is_err());
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("x/a.bin"), SceneFormat::Json),
            Path::new("x/a.bin.json")
        );
        assert!(is_scene_path("Levels/A.BIN"));
        assert!(!is_scene_path("a.bin.xml"));
    }

    #[test]
    fn test_manifest_file() {
        assert_eq!(manifest_file(ManifestFormat::Json), "manifest.json");
        assert_eq!(manifest_file(ManifestFormat::Xml), "manifest.xml");
    }
}
