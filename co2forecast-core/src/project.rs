use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ProductionDatapoint, SourceId};

/// Kind of series a project data point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Production,
    Projection,
    Reserve,
}

/// Dense projects report emissions data; sparse ones need the methane proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectType {
    #[default]
    #[serde(alias = "dense")]
    Dense,
    #[serde(alias = "sparse")]
    Sparse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDataPoint {
    pub data_type: DataType,
    #[serde(flatten)]
    pub datapoint: ProductionDatapoint,
}

/// An extraction project and its data points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_identifier: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_type: ProjectType,
    pub last_year: i32,
    #[serde(default)]
    pub methane_m3_ton: Option<f64>,
    #[serde(default)]
    pub data_points: Vec<ProjectDataPoint>,
}

impl Project {
    pub fn is_sparse(&self) -> bool {
        self.project_type == ProjectType::Sparse
    }

    /// Production point of the latest year; the earliest listed wins a tie
    pub fn latest_production(&self) -> Option<&ProductionDatapoint> {
        self.data_points
            .iter()
            .filter(|p| p.data_type == DataType::Production)
            .map(|p| &p.datapoint)
            .fold(None, |latest: Option<&ProductionDatapoint>, point| match latest {
                Some(last) if point.year <= last.year => Some(last),
                _ => Some(point),
            })
    }

    /// Distinct source ids of all data points, in order of appearance
    pub fn source_ids(&self) -> Vec<SourceId> {
        let mut ids = Vec::new();
        for point in &self.data_points {
            if !ids.contains(&point.datapoint.source_id) {
                ids.push(point.datapoint.source_id);
            }
        }
        ids
    }
}

/// One entry per project identifier, keeping the most recent record
///
/// Records without an identifier or ending before `min_year` are dropped.
/// Order follows the first appearance of each identifier.
pub fn current_projects(projects: &[Project], min_year: i32) -> Vec<Project> {
    let mut current: Vec<Project> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for project in projects {
        let id = project.project_identifier.as_str();
        if let Some(&pos) = positions.get(id) {
            if current[pos].last_year > project.last_year {
                continue;
            }
        }
        if id.is_empty() || project.last_year < min_year {
            continue;
        }
        match positions.get(id) {
            Some(&pos) => current[pos] = project.clone(),
            None => {
                positions.insert(id, current.len());
                current.push(project.clone());
            }
        }
    }

    current
}
