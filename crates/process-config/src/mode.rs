//! Processing modes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;

/// How a process treats existing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Process on demand without writing output.
    Memory,
    /// Only read existing output.
    Readonly,
    /// Skip tiles that already exist.
    #[default]
    Continue,
    /// Replace existing tiles.
    Overwrite,
}

impl ProcessingMode {
    pub const ALL: [ProcessingMode; 4] = [
        ProcessingMode::Memory,
        ProcessingMode::Readonly,
        ProcessingMode::Continue,
        ProcessingMode::Overwrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Memory => "memory",
            ProcessingMode::Readonly => "readonly",
            ProcessingMode::Continue => "continue",
            ProcessingMode::Overwrite => "overwrite",
        }
    }

    pub fn is_readonly(&self) -> bool {
        matches!(self, ProcessingMode::Readonly)
    }
}

impl FromStr for ProcessingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ConfigError::Mode(s.to_string()))
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
