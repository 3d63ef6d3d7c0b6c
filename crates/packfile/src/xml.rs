//! XML plumbing shared by the manifest and the embedded document
//!
//! ```text
//! <Packfile version="2">                      (or <PackfileStripped>)
//!   <VirtualFile path type compress compression_level>payload bytes</VirtualFile>
//! </Packfile>
//! ```

use crate::manifest::ManifestEntry;
use crate::packfile::DEFAULT_VERSION;
use crate::type_tag::TypeTag;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;
use thinner_binary::DEFAULT_LEVEL;
use thinner_core::{Result, ThinnerError};

pub(crate) const FILE_ELEMENT: &str = "VirtualFile";

const TRUE: &str = "True";
const FALSE: &str = "False";

pub(crate) fn xml_err<E: Display>(err: E) -> ThinnerError {
    ThinnerError::Xml(err.to_string())
}

pub(crate) struct XmlOut {
    writer: Writer<Vec<u8>>,
    pretty: bool,
}

impl XmlOut {
    pub(crate) fn new(pretty: bool) -> Result<Self> {
        let writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 4)
        } else {
            Writer::new(Vec::new())
        };
        let mut out = Self { writer, pretty };
        out.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(out)
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(xml_err)
    }

    fn element<'a>(name: &'a str, attrs: &[(&str, String)]) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for (key, value) in attrs {
            start.push_attribute((*key, value.as_str()));
        }
        start
    }

    pub(crate) fn start(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<()> {
        self.write(Event::Start(Self::element(name, attrs)))
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Element holding only text; empty text becomes an empty element
    pub(crate) fn leaf(&mut self, name: &str, attrs: &[(&str, String)], text: &str) -> Result<()> {
        if text.is_empty() {
            return self.write(Event::Empty(Self::element(name, attrs)));
        }
        self.start(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    pub(crate) fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner();
        if self.pretty {
            bytes.push(b'\n');
        }
        String::from_utf8(bytes).map_err(xml_err)
    }
}

/// Attributes of one file element.
///
/// With `full` every attribute is written; otherwise the empty tag, an
/// uncompressed flag and the default level are left out.
pub(crate) fn entry_attrs(entry: &ManifestEntry, full: bool) -> Vec<(&'static str, String)> {
    let mut attrs = vec![("path", entry.path.clone())];
    if full || !entry.type_tag.is_empty() {
        attrs.push(("type", entry.type_tag.as_str().to_string()));
    }
    if full || entry.compress {
        attrs.push(("compress", (if entry.compress { TRUE } else { FALSE }).to_string()));
    }
    if full || entry.compression_level != DEFAULT_LEVEL {
        attrs.push(("compression_level", entry.compression_level.to_string()));
    }
    attrs
}

/// Parsed document: root version plus each file element and its text
pub(crate) struct ParsedFiles {
    pub version: u32,
    pub files: Vec<(ManifestEntry, String)>,
}

fn attrs_of(start: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    start
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(xml_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_err)?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn lookup<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn parse_flag(text: &str) -> Result<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case(TRUE) || text == "1" {
        Ok(true)
    } else if text.eq_ignore_ascii_case(FALSE) || text == "0" {
        Ok(false)
    } else {
        Err(ThinnerError::Xml(format!("bad compress flag {:?}", text)))
    }
}

fn parse_number(text: &str, what: &str) -> Result<u32> {
    text.trim()
        .parse()
        .map_err(|e| ThinnerError::Xml(format!("bad {} {:?}: {}", what, text, e)))
}

fn entry_from(attrs: &[(String, String)]) -> Result<ManifestEntry> {
    let path = lookup(attrs, "path")
        .ok_or_else(|| ThinnerError::Xml(format!("<{}> is missing the path attribute", FILE_ELEMENT)))?;
    Ok(ManifestEntry {
        path: path.to_string(),
        type_tag: match lookup(attrs, "type") {
            Some(tag) => TypeTag::new(tag)?,
            None => TypeTag::none(),
        },
        compress: lookup(attrs, "compress").map(parse_flag).transpose()?.unwrap_or(false),
        compression_level: match lookup(attrs, "compression_level") {
            Some(level) => parse_number(level, "compression_level")?,
            None => DEFAULT_LEVEL,
        },
    })
}

/// Read a document whose root element must be `root`
pub(crate) fn parse_files(text: &str, root: &str) -> Result<ParsedFiles> {
    let mut reader = Reader::from_str(text);
    let mut version = None;
    let mut files = Vec::new();
    let mut open: Option<(ManifestEntry, String)> = None;
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match event {
            Event::Start(ref start) | Event::Empty(ref start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let empty = matches!(event, Event::Empty(_));
                match depth {
                    0 if name == root => {
                        let attrs = attrs_of(start)?;
                        version = Some(match lookup(&attrs, "version") {
                            Some(v) => parse_number(v, "version")?,
                            None => DEFAULT_VERSION,
                        });
                    }
                    0 => {
                        return Err(ThinnerError::Xml(format!(
                            "expected a <{}> document, found <{}>",
                            root, name
                        )))
                    }
                    1 if name == FILE_ELEMENT => {
                        let entry = entry_from(&attrs_of(start)?)?;
                        if empty {
                            files.push((entry, String::new()));
                        } else {
                            open = Some((entry, String::new()));
                        }
                    }
                    _ => {
                        return Err(ThinnerError::Xml(format!(
                            "unexpected <{}> inside <{}>",
                            name, root
                        )))
                    }
                }
                if !empty {
                    depth += 1;
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if let Some(file) = open.take() {
                    files.push(file);
                }
            }
            Event::Text(ref t) => {
                if let Some((_, body)) = open.as_mut() {
                    body.push_str(&t.unescape().map_err(xml_err)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let version =
        version.ok_or_else(|| ThinnerError::Xml(format!("document has no <{}> root", root)))?;
    Ok(ParsedFiles { version, files })
}
