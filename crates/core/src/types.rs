//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ThinnerError;

/// Byte order of a binary image.
///
/// Every cursor carries one explicitly; nothing falls back to host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    /// Wii builds
    #[default]
    Big,
    /// PC builds
    Little,
}

impl Endian {
    pub fn flipped(self) -> Self {
        match self {
            Self::Big => Self::Little,
            Self::Little => Self::Big,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Big => "big",
            Self::Little => "little",
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endian {
    type Err = ThinnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "big" | "be" => Ok(Self::Big),
            "little" | "le" => Ok(Self::Little),
            other => Err(ThinnerError::Config(format!("unknown endianness: {}", other))),
        }
    }
}
