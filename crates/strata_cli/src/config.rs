//! Project configuration loaded from `strata.toml`.
//!
//! Everything has a sensible default, so the file is optional; CLI flags
//! override whatever the file sets.

use serde::Deserialize;
use std::path::Path;
use strata_common::{StrataError, StrataResult};
use strata_place::NetModel;

/// Logging section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Minimum level: "verbose", "debug", "info", "warning" or "error".
    pub level: Option<String>,
}

/// Placement section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceConfig {
    /// Maximum bisection depth.
    pub max_levels: Option<usize>,
    /// Minimum instances for a region to be subdivided.
    pub min_instances: Option<usize>,
    /// Net model: "clique" or "b2b".
    pub net_model: Option<String>,
}

/// The `strata.toml` contents.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct StrataConfig {
    /// Logging settings.
    pub log: LogConfig,
    /// Placement settings.
    pub place: PlaceConfig,
}

impl StrataConfig {
    /// Loads the configuration from a file.
    pub fn load(path: &Path) -> StrataResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| StrataError::invalid_state(format!("{}: {e}", path.display())))
    }

    /// Loads `strata.toml` from the working directory when present.
    pub fn discover() -> StrataResult<Self> {
        let path = Path::new("strata.toml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The configured net model, defaulting to clique.
    pub fn net_model(&self) -> StrataResult<NetModel> {
        match self.place.net_model.as_deref() {
            None | Some("clique") => Ok(NetModel::Clique),
            Some("b2b") => Ok(NetModel::BoundToBound),
            Some(other) => Err(StrataError::invalid_state(format!(
                "unknown net model '{other}' (expected 'clique' or 'b2b')"
            ))),
        }
    }
}
