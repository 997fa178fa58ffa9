use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ConversionConstant, Triple};

/// Factor attached to one directed edge of a conversion graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeFactor {
    pub factor: f64,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub modifier: Option<String>,
    /// Country the constant was tagged for, `None` for the default
    pub country: Option<String>,
}

impl EdgeFactor {
    pub fn from_constant(constant: &ConversionConstant) -> Self {
        Self {
            factor: constant.factor,
            low: constant.low,
            high: constant.high,
            modifier: constant.modifier.clone(),
            country: constant.country.clone(),
        }
    }

    /// Low, mid and high with missing bounds falling back to the mid factor
    pub fn triple(&self) -> Triple {
        [
            self.low.unwrap_or(self.factor),
            self.factor,
            self.high.unwrap_or(self.factor),
        ]
    }
}

/// Per-fuel mapping from `"from>to"` to the edge's factor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionTable {
    entries: HashMap<String, EdgeFactor>,
}

impl ConversionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of a directed unit pair
    pub fn edge_key(from: &str, to: &str) -> String {
        format!("{}>{}", from, to)
    }

    /// Insert an edge factor, returning the entry it replaced
    pub fn insert(&mut self, from: &str, to: &str, factor: EdgeFactor) -> Option<EdgeFactor> {
        self.entries.insert(Self::edge_key(from, to), factor)
    }

    pub fn get(&self, from: &str, to: &str) -> Option<&EdgeFactor> {
        self.entries.get(&Self::edge_key(from, to))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EdgeFactor)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_bounds_use_factor() {
        let edge = EdgeFactor {
            factor: 2.0,
            low: None,
            high: Some(3.0),
            modifier: None,
            country: None,
        };
        assert_eq!(edge.triple(), [2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_insert_reports_replaced_entry() {
        let mut table = ConversionTable::new();
        let c = ConversionConstant::new(Some("oil"), "bbl", "e6bbl", 1e-6, None, None);
        assert!(table.insert("bbl", "e6bbl", EdgeFactor::from_constant(&c)).is_none());
        assert!(table.insert("bbl", "e6bbl", EdgeFactor::from_constant(&c)).is_some());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("bbl", "e6bbl").map(|e| e.factor), Some(1e-6));
        assert!(table.get("e6bbl", "bbl").is_none());
    }
}
