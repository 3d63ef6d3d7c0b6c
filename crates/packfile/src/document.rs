//! Self-contained text forms of a packfile, payloads included
//!
//! Payloads are written as decimal byte values separated by spaces, sixteen
//! per line. Readers accept any whitespace between values.

use crate::manifest::{ManifestEntry, ManifestFormat};
use crate::packfile::{Packfile, DEFAULT_VERSION};
use crate::xml::{entry_attrs, parse_files, XmlOut, FILE_ELEMENT};
use serde::{Deserialize, Serialize};
use thinner_core::{Result, ThinnerError};

const ROOT: &str = "Packfile";
const BYTES_PER_LINE: usize = 16;

fn default_version() -> u32 {
    DEFAULT_VERSION
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentEntry {
    #[serde(flatten)]
    entry: ManifestEntry,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PackDocument {
    #[serde(default = "default_version")]
    version: u32,
    files: Vec<DocumentEntry>,
}

fn data_text(data: &[u8]) -> String {
    data.chunks(BYTES_PER_LINE)
        .map(|line| {
            line.iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_data(text: &str, path: &str) -> Result<Vec<u8>> {
    text.split_whitespace()
        .map(|value| {
            value.parse::<u8>().map_err(|_| {
                ThinnerError::Format {
                    offset: 0,
                    message: format!("{}: {:?} is not a byte value", path, value),
                }
            })
        })
        .collect()
}

impl Packfile {
    /// `<Packfile>` document with every attribute and payload
    pub fn to_xml(&self, pretty: bool) -> Result<String> {
        let mut out = XmlOut::new(pretty)?;
        out.start(ROOT, &[("version", self.version.to_string())])?;
        for file in &self.files {
            let attrs = entry_attrs(&ManifestEntry::describe(file), true);
            out.leaf(FILE_ELEMENT, &attrs, &data_text(&file.data))?;
        }
        out.end(ROOT)?;
        out.finish()
    }

    pub fn from_xml(text: &str) -> Result<Self> {
        let parsed = parse_files(text, ROOT)?;
        let files = parsed
            .files
            .into_iter()
            .map(|(entry, body)| parse_data(&body, &entry.path).map(|data| entry.with_data(data)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Packfile {
            version: parsed.version,
            files,
            ..Packfile::default()
        })
    }

    /// JSON document: the manifest fields plus a `data` string per file
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let document = PackDocument {
            version: self.version,
            files: self
                .files
                .iter()
                .map(|file| DocumentEntry {
                    entry: ManifestEntry::describe(file),
                    data: data_text(&file.data),
                })
                .collect(),
        };
        Ok(if pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let document: PackDocument = serde_json::from_str(text)?;
        let files = document
            .files
            .into_iter()
            .map(|f| parse_data(&f.data, &f.entry.path).map(|data| f.entry.with_data(data)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Packfile {
            version: document.version,
            files,
            ..Packfile::default()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_file::VirtualFile;
    use thinner_core::Endian;

    fn sample() -> Packfile {
        let mut pak = Packfile::with_files(vec![
            VirtualFile::from_path_and_data("levels/a.bin", (0..=40u8).collect::<Vec<_>>()),
            VirtualFile::from_path_and_data("models/b.nif", vec![255, 0, 7]),
            VirtualFile::new("empty.bin", Vec::new()),
        ]);
        pak.files[0].compression_level = 3;
        pak
    }

    #[test]
    fn test_xml_document_roundtrip() {
        let pak = sample();
        let xml = pak.to_xml(true).unwrap();
        assert!(xml.contains(r#"<VirtualFile path="models/b.nif" type="NIF" compress="False" compression_level="6">255 0 7</VirtualFile>"#));
        assert!(xml.contains(r#"<VirtualFile path="empty.bin" type="" compress="False" compression_level="6"/>"#));

        let back = Packfile::from_xml(&xml).unwrap();
        assert_eq!(back, pak);
        assert_eq!(back.files[0].compression_level, 3);
        assert_eq!(Packfile::from_xml(&pak.to_xml(false).unwrap()).unwrap(), pak);
    }

    #[test]
    fn test_json_document_roundtrip() {
        let pak = sample();
        let json = pak.to_json(true).unwrap();
        assert!(json.contains("\"data\": \"255 0 7\""));

        let back = Packfile::from_json(&json).unwrap();
        assert_eq!(back, pak);
        assert_eq!(back.encode(Endian::Big).unwrap(), pak.encode(Endian::Big).unwrap());
    }

    #[test]
    fn test_sixteen_bytes_per_line() {
        let text = data_text(&[1u8; 17]);
        assert_eq!(text.lines().count(), 2);
        assert_eq!(text.lines().nth(1), Some("1"));
        assert_eq!(parse_data("\n1 2 \n 3 ", "x").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_bad_payload_text() {
        let xml = r#"<Packfile version="2"><VirtualFile path="a.bin">1 256</VirtualFile></Packfile>"#;
        let err = Packfile::from_xml(xml).unwrap_err();
        assert!(err.to_string().contains("a.bin"));

        assert!(Packfile::from_json(r#"{"files":[{"path":"a","data":"x"}]}"#).is_err());
        assert!(Packfile::from_xml(r#"<PackfileStripped version="2"/>"#).is_err());
    }
}
