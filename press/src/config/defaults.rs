//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, bool, &'static str);

const DEFS: &[DefTuple] = &[
    // Folders
    ("INTAKE_DIR", "", true, "Folder plates arrive in"),
    ("PROCESSING_DIR", "", true, "Folder holding the plate being compensated"),
    ("DELIVERY_DIR", "", true, "Folder the plate setter picks plates up from"),
    ("LOG_DIR", "", true, "Folder for daily log files"),
    ("REJECT_DIR", "", false, "Folder for invalid plates (default: LOG_DIR/rejected)"),
    // Alignment marks
    ("MARKS_DIR", "", false, "Folder containing the alignment mark images"),
    ("LEAD_MARK_FILE", "", false, "Lead alignment mark image, relative to MARKS_DIR"),
    ("TRAIL_MARK_FILE", "", false, "Trail alignment mark image, relative to MARKS_DIR"),
    ("LEAD_MARK_POSITION", "0,0", false, "Lead mark offset on the plate (x,y)"),
    ("TRAIL_MARK_POSITION", "0,0", false, "Trail mark offset on the plate (x,y)"),
    // Compensation
    ("GEOMETRY_FILE", "", true, "Press geometry JSON document"),
    ("RESOLUTION_DPI", "1200", false, "Plate resolution in dots per inch"),
    // Conveyor timing
    ("POLL_INTERVAL_MS", "1000", false, "Pause between conveyor iterations"),
    ("MOVE_RETRY_ATTEMPTS", "5", false, "Retries for a failed file move"),
    ("MOVE_RETRY_DELAY_MS", "100", false, "Pause between file move retries"),
    // Filename layout
    ("TOWER_FIELD", "1,2", false, "Tower id position in the filename (start,length)"),
    ("CYLINDER_FIELD", "3,1", false, "Cylinder position in the filename (start,length)"),
    ("SECTION_FIELD", "4,1", false, "Section position in the filename (start,length)"),
    ("HALF_FIELD", "5,1", false, "Half position in the filename (start,length)"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, required, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    required,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}

/// Keys that must be given a non-empty value, in table order.
pub fn required_keys() -> impl Iterator<Item = &'static str> {
    DEFS.iter()
        .filter(|(_, _, required, _)| *required)
        .map(|(key, ..)| *key)
}
