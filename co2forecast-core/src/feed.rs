use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::project::Project;
use crate::reserves::{StableProduction, YearLimits};
use crate::types::{ConversionConstant, ProductionDatapoint, ReserveEntry, Source};

/// Everything the engine reads from upstream, as one JSON document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedBundle {
    pub conversions: Vec<ConversionConstant>,
    pub sources: Vec<Source>,
    pub production: Vec<ProductionDatapoint>,
    pub projection: Vec<ProductionDatapoint>,
    pub reserves: Vec<ReserveEntry>,
    pub projects: Vec<Project>,
    pub stable_production: StableProduction,
    pub limits: Option<YearLimits>,
}

impl FeedBundle {
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}
