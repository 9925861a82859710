//! Press geometry: per-tower roll positions and fan-out distances.
//!
//! The geometry document is JSON keyed by tower identifier:
//!
//! ```json
//! {"towers": {"07": {"roll_position": "ABC", "fanout_mm": {"C": 0.5, "M": 0.3, "Y": 0.2}}}}
//! ```
//!
//! [`JsonGeometryFile`] re-reads the file on every lookup so edits made on the
//! press floor take effect with the next plate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::colour::Colour;

/// Errors raised while resolving geometry for a plate.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("Failed to read geometry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse geometry document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Tower {0:?} is not present in the geometry document")]
    UnknownTower(String),

    #[error("Tower {tower:?} has no fan-out entry for colour {colour}")]
    MissingColour { tower: String, colour: char },
}

impl GeometryError {
    /// Whether the error is about document content rather than file access.
    pub fn is_validation(&self) -> bool {
        !matches!(self, GeometryError::Io { .. })
    }
}

/// Geometry of one tower for one colour.
#[derive(Debug, Clone, PartialEq)]
pub struct TowerGeometry {
    pub roll_position: String,
    pub fanout_mm: f64,
}

/// Everything the compensator needs to know about one plate.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryParameters {
    pub tower: String,
    /// Odd cylinders print the front of the web, even ones the back.
    pub cylinder: u32,
    pub section: char,
    pub fanout_mm: f64,
    pub roll_position: String,
    pub dpi: u32,
}

/// Lookup seam between the compensator pipeline and wherever geometry lives.
pub trait GeometrySource {
    fn lookup(&self, tower: &str, colour: Colour) -> Result<TowerGeometry, GeometryError>;
}

#[derive(Debug, Clone, Deserialize)]
struct TowerEntry {
    roll_position: String,
    #[serde(default)]
    fanout_mm: HashMap<String, f64>,
}

/// A parsed geometry document.
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryDocument {
    towers: HashMap<String, TowerEntry>,
}

impl GeometryDocument {
    pub fn from_json(json: &str) -> Result<Self, GeometryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of towers described.
    pub fn len(&self) -> usize {
        self.towers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }
}

impl GeometrySource for GeometryDocument {
    fn lookup(&self, tower: &str, colour: Colour) -> Result<TowerGeometry, GeometryError> {
        let entry = self
            .towers
            .get(tower)
            .ok_or_else(|| GeometryError::UnknownTower(tower.to_string()))?;

        let fanout_mm = entry
            .fanout_mm
            .get(&colour.letter().to_string())
            .copied()
            .ok_or_else(|| GeometryError::MissingColour {
                tower: tower.to_string(),
                colour: colour.letter(),
            })?;

        Ok(TowerGeometry {
            roll_position: entry.roll_position.clone(),
            fanout_mm,
        })
    }
}

/// Geometry document stored on disk, read afresh for every lookup.
#[derive(Debug, Clone)]
pub struct JsonGeometryFile {
    path: PathBuf,
}

impl JsonGeometryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<GeometryDocument, GeometryError> {
        let json = std::fs::read_to_string(&self.path).map_err(|source| GeometryError::Io {
            path: self.path.clone(),
            source,
        })?;
        let document = GeometryDocument::from_json(&json)?;
        debug!(path = %self.path.display(), towers = document.len(), "Loaded geometry document");
        Ok(document)
    }
}

impl GeometrySource for JsonGeometryFile {
    fn lookup(&self, tower: &str, colour: Colour) -> Result<TowerGeometry, GeometryError> {
        self.read_document()?.lookup(tower, colour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "towers": {
            "07": {"roll_position": "ABC", "fanout_mm": {"C": 0.5, "M": 0.3, "Y": 0.2}},
            "08": {"roll_position": "AB", "fanout_mm": {"C": 0.1}}
        }
    }"#;

    #[test]
    fn test_lookup_returns_colour_fanout() {
        let doc = GeometryDocument::from_json(DOCUMENT).unwrap();
        let geometry = doc.lookup("07", Colour::Magenta).unwrap();
        assert_eq!(geometry.roll_position, "ABC");
        assert_eq!(geometry.fanout_mm, 0.3);
    }

    #[test]
    fn test_lookup_unknown_tower() {
        let doc = GeometryDocument::from_json(DOCUMENT).unwrap();
        let err = doc.lookup("99", Colour::Cyan).unwrap_err();
        assert!(matches!(err, GeometryError::UnknownTower(ref t) if t == "99"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_lookup_missing_colour() {
        let doc = GeometryDocument::from_json(DOCUMENT).unwrap();
        let err = doc.lookup("08", Colour::Yellow).unwrap_err();
        assert!(matches!(err, GeometryError::MissingColour { colour: 'Y', .. }));
    }

    #[test]
    fn test_unparsable_value_is_rejected() {
        let err = GeometryDocument::from_json(
            r#"{"towers": {"01": {"roll_position": "A", "fanout_mm": {"C": "wide"}}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::Parse(_)));
    }

    #[test]
    fn test_file_is_reread_for_every_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geometry.json");
        std::fs::write(&path, DOCUMENT).unwrap();

        let source = JsonGeometryFile::new(&path);
        assert_eq!(source.lookup("07", Colour::Cyan).unwrap().fanout_mm, 0.5);

        std::fs::write(
            &path,
            r#"{"towers": {"07": {"roll_position": "A", "fanout_mm": {"C": 0.9}}}}"#,
        )
        .unwrap();
        let geometry = source.lookup("07", Colour::Cyan).unwrap();
        assert_eq!(geometry.fanout_mm, 0.9);
        assert_eq!(geometry.roll_position, "A");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = JsonGeometryFile::new("/nonexistent/geometry.json");
        let err = source.lookup("07", Colour::Cyan).unwrap_err();
        assert!(matches!(err, GeometryError::Io { .. }));
        assert!(!err.is_validation());
    }
}
