//! Repository configuration file support.
//!
//! Reads repository selection and the optional period-table path from a
//! TOML configuration file:
//!
//! ```toml
//! [repository]
//! type = "local"
//!
//! [periods]
//! file = "config/periods.toml"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::RepositoryError;
use super::factory::RepositoryType;

/// Default locations searched for the configuration file, in order.
const DEFAULT_LOCATIONS: [&str; 3] = [
    "campus.toml",
    "config/campus.toml",
    "/etc/campus-scheduling/campus.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub repository: RepositorySettings,
    #[serde(default)]
    pub periods: PeriodSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodSettings {
    /// Path to a period-table TOML file; the standard table when absent.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl RepositoryConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        toml::from_str(&text).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to parse config {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Search standard locations, honoring `CAMPUS_CONFIG` first.
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        if let Ok(path) = std::env::var("CAMPUS_CONFIG") {
            return Self::from_file(path);
        }
        for candidate in DEFAULT_LOCATIONS {
            if Path::new(candidate).exists() {
                return Self::from_file(candidate);
            }
        }
        Err(RepositoryError::configuration(
            "No campus.toml found in default locations",
        ))
    }

    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        self.repository.repo_type.parse()
    }
}
