//! Folder slot observation.

use std::fmt;
use std::io;
use std::path::Path;

/// One of the three conveyor folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Intake,
    Processing,
    Delivery,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Intake => f.write_str("intake"),
            Slot::Processing => f.write_str("processing"),
            Slot::Delivery => f.write_str("delivery"),
        }
    }
}

/// What a folder holds, counting plate files only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Occupied(String),
    /// More than one plate; names sorted.
    Anomaly(Vec<String>),
}

/// Plate files carry a `tif`/`tiff` extension in any case.
pub fn is_plate_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}

/// List the plate files in `dir` and classify the folder.
pub fn observe(dir: &Path) -> io::Result<SlotState> {
    let mut plates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if !is_plate_file(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            plates.push(name.to_string());
        }
    }

    plates.sort();
    Ok(match plates.len() {
        0 => SlotState::Empty,
        1 => SlotState::Occupied(plates.remove(0)),
        _ => SlotState::Anomaly(plates),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plate_extensions() {
        assert!(is_plate_file(Path::new("071A1.tif")));
        assert!(is_plate_file(Path::new("071A1.TIF")));
        assert!(is_plate_file(Path::new("071A1.Tiff")));
        assert!(!is_plate_file(Path::new("071A1.tif.tmp")));
        assert!(!is_plate_file(Path::new("notes.txt")));
        assert!(!is_plate_file(Path::new("tif")));
    }

    #[test]
    fn test_observe_classifies_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(observe(dir.path()).unwrap(), SlotState::Empty);

        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("b.tif.tmp"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("old.tif")).unwrap();
        assert_eq!(observe(dir.path()).unwrap(), SlotState::Empty);

        std::fs::write(dir.path().join("b.TIF"), b"x").unwrap();
        assert_eq!(
            observe(dir.path()).unwrap(),
            SlotState::Occupied("b.TIF".to_string())
        );

        std::fs::write(dir.path().join("a.tiff"), b"x").unwrap();
        assert_eq!(
            observe(dir.path()).unwrap(),
            SlotState::Anomaly(vec!["a.tiff".to_string(), "b.TIF".to_string()])
        );
    }

    #[test]
    fn test_observe_missing_folder_errors() {
        assert!(observe(Path::new("/nonexistent/intake")).is_err());
    }
}
