use crate::models::StudySpot;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Campus catalog shipped with the service
const BUNDLED_CATALOG: &str = include_str!("../../data/study_spots.json");

/// Errors that can occur when loading the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate study spot id: {0}")]
    DuplicateId(String),
}

/// Read-only list of study spots, in catalog order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    spots: Vec<StudySpot>,
}

impl Catalog {
    /// Load the bundled campus catalog
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Load a catalog from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse a JSON array of spots
    ///
    /// The array itself must be well-formed. Individual records missing an id,
    /// a name or coordinates are skipped with a warning; bad attribute values
    /// inside a record are kept as unknown.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let records: Vec<Value> = serde_json::from_str(raw)?;
        let total = records.len();

        let spots: Vec<StudySpot> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(spot) => Some(spot),
                Err(e) => {
                    tracing::warn!("Skipping catalog record #{}: {}", index, e);
                    None
                }
            })
            .collect();

        if spots.len() < total {
            tracing::warn!("Loaded {} of {} catalog records", spots.len(), total);
        }

        Self::from_spots(spots)
    }

    pub fn from_spots(spots: Vec<StudySpot>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(spots.len());
        for spot in &spots {
            if !seen.insert(spot.id.as_str()) {
                return Err(CatalogError::DuplicateId(spot.id.clone()));
            }
        }
        Ok(Self { spots })
    }

    pub fn all(&self) -> &[StudySpot] {
        &self.spots
    }

    pub fn get(&self, id: &str) -> Option<&StudySpot> {
        self.spots.iter().find(|spot| spot.id == id)
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }
}
