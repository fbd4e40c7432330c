//! Shared types and enums used across the batch driver.
//! Includes `InputFormat` (record separator detection), `SplitMode`, and the
//! engine selector enums (`TautomerEngine`, `IsomerEngine`, `OmegaMode`,
//! `OptimizingEngine`) that are passed through to the external engine untouched.
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Marker that closes every record in an SDF file.
pub const SDF_SEPARATOR: &str = "$$$$";

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum InputFormat {
    Smiles,
    Sdf,
}

impl InputFormat {
    /// Resolve the format from a file suffix. Only `.smi`, `.smiles`, `.sdf` and `.sd`
    /// are accepted; matching is case-sensitive.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext {
            "smi" | "smiles" => Ok(InputFormat::Smiles),
            "sdf" | "sd" => Ok(InputFormat::Sdf),
            _ => Err(Error::UnsupportedExtension {
                ext: if ext.is_empty() {
                    String::new()
                } else {
                    format!(".{}", ext)
                },
            }),
        }
    }

    /// Byte pattern whose presence in a line closes the current record.
    pub fn separator(&self) -> &'static [u8] {
        match self {
            InputFormat::Smiles => b"\n",
            InputFormat::Sdf => SDF_SEPARATOR.as_bytes(),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Smiles => write!(f, "SMILES"),
            InputFormat::Sdf => write!(f, "SDF"),
        }
    }
}

/// How the input is cut into per-record files.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Byte-for-byte split on the format separator
    #[default]
    Basic,
    /// Parse each record and write it back through a record writer
    Structured,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TautomerEngine {
    Rdkit,
    Oechem,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsomerEngine {
    Rdkit,
    Omega,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OmegaMode {
    Classic,
    Macrocycle,
    Dense,
    Pose,
    Rocs,
    FastRocs,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum OptimizingEngine {
    #[value(name = "ANI2x")]
    #[serde(rename = "ANI2x")]
    Ani2x,
    #[value(name = "ANI2xt")]
    #[serde(rename = "ANI2xt")]
    Ani2xt,
    #[value(name = "AIMNET")]
    #[serde(rename = "AIMNET")]
    Aimnet,
}

impl std::fmt::Display for OptimizingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizingEngine::Ani2x => write!(f, "ANI2x"),
            OptimizingEngine::Ani2xt => write!(f, "ANI2xt"),
            OptimizingEngine::Aimnet => write!(f, "AIMNET"),
        }
    }
}
