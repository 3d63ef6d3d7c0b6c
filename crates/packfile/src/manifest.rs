//! Manifest describing a packfile without its payloads
//!
//! Extracting writes one manifest next to the payload files; rebuilding reads
//! it back and asks a resolver for each payload, in manifest order. The
//! manifest is JSON or XML; the XML root is `<PackfileStripped>`.

use crate::packfile::{Packfile, DEFAULT_VERSION};
use crate::type_tag::TypeTag;
use crate::virtual_file::VirtualFile;
use crate::xml::{entry_attrs, parse_files, XmlOut, FILE_ELEMENT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thinner_binary::DEFAULT_LEVEL;
use thinner_core::{Result, ThinnerError};

const STRIPPED_ROOT: &str = "PackfileStripped";

/// Text form of a manifest or packfile document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestFormat {
    #[default]
    Json,
    Xml,
}

impl ManifestFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ManifestFormat::Json => "json",
            ManifestFormat::Xml => "xml",
        }
    }

    /// Format named by a file name's extension
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        ext.parse().ok()
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ManifestFormat {
    type Err = ThinnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ManifestFormat::Json),
            "xml" => Ok(ManifestFormat::Xml),
            other => Err(ThinnerError::Config(format!(
                "unknown manifest format {:?} (expected json or xml)",
                other
            ))),
        }
    }
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

fn default_level() -> u32 {
    DEFAULT_LEVEL
}

/// One file entry, in load order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    #[serde(rename = "type", default)]
    pub type_tag: TypeTag,
    #[serde(default)]
    pub compress: bool,
    #[serde(default = "default_level")]
    pub compression_level: u32,
}

impl ManifestEntry {
    pub(crate) fn describe(file: &VirtualFile) -> Self {
        Self {
            path: file.path.clone(),
            type_tag: file.type_tag.clone(),
            compress: file.compress,
            compression_level: file.compression_level,
        }
    }

    pub(crate) fn with_data(&self, data: Vec<u8>) -> VirtualFile {
        VirtualFile {
            path: self.path.clone(),
            data,
            compress: self.compress,
            compression_level: self.compression_level,
            type_tag: self.type_tag.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackManifest {
    #[serde(default = "default_version")]
    pub version: u32,
    pub files: Vec<ManifestEntry>,
}

impl PackManifest {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// `<PackfileStripped>` document; default attributes are left out
    pub fn to_xml(&self, pretty: bool) -> Result<String> {
        let mut out = XmlOut::new(pretty)?;
        out.start(STRIPPED_ROOT, &[("version", self.version.to_string())])?;
        for entry in &self.files {
            out.leaf(FILE_ELEMENT, &entry_attrs(entry, false), "")?;
        }
        out.end(STRIPPED_ROOT)?;
        out.finish()
    }

    pub fn from_xml(text: &str) -> Result<Self> {
        let parsed = parse_files(text, STRIPPED_ROOT)?;
        Ok(Self {
            version: parsed.version,
            files: parsed.files.into_iter().map(|(entry, _)| entry).collect(),
        })
    }

    pub fn to_text(&self, format: ManifestFormat, pretty: bool) -> Result<String> {
        match format {
            ManifestFormat::Json => self.to_json(pretty),
            ManifestFormat::Xml => self.to_xml(pretty),
        }
    }

    pub fn from_text(text: &str, format: ManifestFormat) -> Result<Self> {
        match format {
            ManifestFormat::Json => Self::from_json(text),
            ManifestFormat::Xml => Self::from_xml(text),
        }
    }
}

impl Packfile {
    /// Describe every file except its payload
    pub fn manifest(&self) -> PackManifest {
        PackManifest {
            version: self.version,
            files: self.files.iter().map(ManifestEntry::describe).collect(),
        }
    }

    /// Rebuild from a manifest; `resolver` supplies each payload
    pub fn from_manifest<F>(manifest: &PackManifest, mut resolver: F) -> Result<Self>
    where
        F: FnMut(&ManifestEntry) -> Result<Vec<u8>>,
    {
        let mut files = Vec::with_capacity(manifest.files.len());
        for entry in &manifest.files {
            let data = resolver(entry)?;
            files.push(entry.with_data(data));
        }
        tracing::debug!("rebuilt packfile from manifest: {} files", files.len());

        Ok(Packfile {
            version: manifest.version,
            files,
            ..Packfile::default()
        })
    }
}
