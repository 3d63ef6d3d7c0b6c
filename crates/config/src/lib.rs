//! Thinner Configuration Management
//!
//! Loads tool options from a `thinner.cfg` file of `key = value` lines.
//! Lines starting with `#` and blank lines are skipped, unknown keys are
//! logged and ignored.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thinner_core::{Endian, Result, ThinnerError};

/// File picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "thinner.cfg";

/// Text form scene files are converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneFormat {
    #[default]
    Xml,
    Json,
}

impl SceneFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            SceneFormat::Xml => "xml",
            SceneFormat::Json => "json",
        }
    }
}

impl fmt::Display for SceneFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SceneFormat {
    type Err = ThinnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(SceneFormat::Xml),
            "json" => Ok(SceneFormat::Json),
            other => Err(ThinnerError::Config(format!(
                "scene_format must be xml or json, got {:?}",
                other
            ))),
        }
    }
}

/// Options shared by every `thinner` command
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Byte order used when writing packfiles and scene files (from "endian")
    pub endian: Endian,
    /// zlib level for newly compressed payloads (from "compression_level", 1-9)
    pub compression_level: u32,
    /// Sidecar format for converted scenes (from "scene_format")
    pub scene_format: SceneFormat,
    /// Indent XML and JSON output (from "pretty")
    pub pretty: bool,
    /// Write scene sidecars on extract and prefer them on build (from "convert_scenes")
    pub convert_scenes: bool,
    /// Fallback tracing filter when RUST_LOG is unset (from "log_level")
    pub log_level: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            endian: Endian::Big,
            compression_level: 6,
            scene_format: SceneFormat::Xml,
            pretty: true,
            convert_scenes: true,
            log_level: "info".to_string(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ThinnerError::Config(format!(
            "{} must be true or false, got {:?}",
            key, value
        ))),
    }
}

impl ToolConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)
            .map_err(|e| ThinnerError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else `thinner.cfg` when it exists, else defaults.
    ///
    /// An explicitly named file that cannot be read is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load_from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) => config.parse_option(key.trim(), value.trim())?,
                None => tracing::warn!("config line {} has no '=': {:?}", number + 1, line),
            }
        }

        Ok(config)
    }

    fn parse_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "endian" => {
                self.endian = value
                    .parse()
                    .map_err(|e| ThinnerError::Config(format!("endian: {}", e)))?;
            }
            "compression_level" => {
                self.compression_level = value
                    .parse()
                    .ok()
                    .filter(|level| (1..=9).contains(level))
                    .ok_or_else(|| {
                        ThinnerError::Config(format!(
                            "compression_level must be 1-9, got {:?}",
                            value
                        ))
                    })?;
            }
            "scene_format" => self.scene_format = value.parse()?,
            "pretty" => self.pretty = parse_bool(key, value)?,
            "convert_scenes" => self.convert_scenes = parse_bool(key, value)?,
            "log_level" => self.log_level = value.to_string(),
            _ => {
                tracing::warn!("Unknown config option: {} = {}", key, value);
            }
        }
        Ok(())
    }

    /// Log the effective configuration
    pub fn display(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  endian: {}", self.endian);
        tracing::info!("  compression_level: {}", self.compression_level);
        tracing::info!("  scene_format: {}", self.scene_format);
        tracing::info!("  pretty: {}", self.pretty);
        tracing::info!("  convert_scenes: {}", self.convert_scenes);
        tracing::info!("  log_level: {}", self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ToolConfig::default();
        assert_eq!(config.endian, Endian::Big);
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.scene_format, SceneFormat::Xml);
        assert!(config.pretty && config.convert_scenes);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# Wii build
endian = little
compression_level = 9
scene_format = JSON
pretty = false
convert_scenes = no
log_level = thinner=debug
mystery = 12
"#;
        let config = ToolConfig::parse(config_text).unwrap();
        assert_eq!(config.endian, Endian::Little);
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.scene_format, SceneFormat::Json);
        assert!(!config.pretty);
        assert!(!config.convert_scenes);
        assert_eq!(config.log_level, "thinner=debug");
    }

    #[test]
    fn test_invalid_values() {
        for text in [
            "compression_level = 0",
            "compression_level = ten",
            "endian = middle",
            "scene_format = yaml",
            "pretty = maybe",
        ] {
            assert!(
                matches!(ToolConfig::parse(text), Err(ThinnerError::Config(_))),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endian=little").unwrap();
        writeln!(file, "pretty=off").unwrap();

        let config = ToolConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.endian, Endian::Little);
        assert!(!config.pretty);

        let loaded = ToolConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_an_error_only_when_named() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.cfg");
        assert!(matches!(
            ToolConfig::load_or_default(Some(&missing)),
            Err(ThinnerError::Io(_))
        ));
    }
}
