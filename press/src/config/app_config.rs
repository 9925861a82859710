//! Runtime application configuration built once at startup.

use std::path::PathBuf;
use std::time::Duration;

use super::manager::SettingsManager;
use crate::conveyor::RetryPolicy;
use crate::plate_name::{FieldLayout, NameLayout};

/// Alignment mark image files and where they sit on the plate.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkConfig {
    pub lead_file: PathBuf,
    pub lead_position: (i64, i64),
    pub trail_file: PathBuf,
    pub trail_position: (i64, i64),
}

/// Typed runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub intake_dir: PathBuf,
    pub processing_dir: PathBuf,
    pub delivery_dir: PathBuf,
    pub log_dir: PathBuf,
    pub reject_dir: PathBuf,
    pub marks: Option<MarkConfig>,
    pub geometry_file: PathBuf,
    pub resolution_dpi: u32,
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    pub name_layout: NameLayout,
}

impl AppConfig {
    /// Build the configuration from validated settings.
    ///
    /// Fails when a required setting is missing or any value is invalid.
    pub fn load(sm: &SettingsManager) -> Result<Self, anyhow::Error> {
        let missing = sm.missing_settings();
        if !missing.is_empty() {
            anyhow::bail!("missing required settings: {}", missing.join(", "));
        }
        sm.validate_all()?;

        let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default() };
        let path = |key: &str| PathBuf::from(g(key).trim());

        let log_dir = path("LOG_DIR");
        let reject_dir = {
            let dir = g("REJECT_DIR");
            if dir.trim().is_empty() {
                log_dir.join("rejected")
            } else {
                PathBuf::from(dir.trim())
            }
        };

        let defaults = NameLayout::default();
        let name_layout = NameLayout {
            tower: parse_layout(&g("TOWER_FIELD"), defaults.tower)?,
            cylinder: parse_layout(&g("CYLINDER_FIELD"), defaults.cylinder)?,
            section: parse_layout(&g("SECTION_FIELD"), defaults.section)?,
            half: parse_layout(&g("HALF_FIELD"), defaults.half)?,
        };

        Ok(Self {
            intake_dir: path("INTAKE_DIR"),
            processing_dir: path("PROCESSING_DIR"),
            delivery_dir: path("DELIVERY_DIR"),
            log_dir,
            reject_dir,
            marks: load_marks(sm)?,
            geometry_file: path("GEOMETRY_FILE"),
            resolution_dpi: parse_u32(&g("RESOLUTION_DPI"), bitplate::DEFAULT_DPI),
            poll_interval: Duration::from_millis(parse_u64(&g("POLL_INTERVAL_MS"), 1000)),
            retry: RetryPolicy {
                attempts: parse_u32(&g("MOVE_RETRY_ATTEMPTS"), 5),
                delay: Duration::from_millis(parse_u64(&g("MOVE_RETRY_DELAY_MS"), 100)),
            },
            name_layout,
        })
    }
}

fn load_marks(sm: &SettingsManager) -> Result<Option<MarkConfig>, anyhow::Error> {
    let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default().trim().to_string() };
    let (lead, trail) = (g("LEAD_MARK_FILE"), g("TRAIL_MARK_FILE"));

    match (lead.is_empty(), trail.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => {
            let dir = PathBuf::from(g("MARKS_DIR"));
            Ok(Some(MarkConfig {
                lead_file: dir.join(lead),
                lead_position: parse_position(&g("LEAD_MARK_POSITION")),
                trail_file: dir.join(trail),
                trail_position: parse_position(&g("TRAIL_MARK_POSITION")),
            }))
        }
        _ => anyhow::bail!("LEAD_MARK_FILE and TRAIL_MARK_FILE must be set together"),
    }
}

fn parse_layout(s: &str, default: FieldLayout) -> Result<FieldLayout, anyhow::Error> {
    if s.is_empty() {
        return Ok(default);
    }
    Ok(s.parse::<FieldLayout>()?)
}

fn parse_position(s: &str) -> (i64, i64) {
    s.split_once(',')
        .and_then(|(x, y)| Some((x.trim().parse().ok()?, y.trim().parse().ok()?)))
        .unwrap_or((0, 0))
}

fn parse_u32(s: &str, default: u32) -> u32 {
    if s.is_empty() {
        return default;
    }
    s.trim().parse().unwrap_or(default)
}

fn parse_u64(s: &str, default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    s.trim().parse().unwrap_or(default)
}
