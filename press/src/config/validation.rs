//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

static RE_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-?\d+\s*,\s*-?\d+\s*$").unwrap());
static RE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([1-9]\d*)\s*,\s*([1-9]\d*)\s*$").unwrap());

/// Validate a setting value. Returns `Ok(())` or an error message.
///
/// Empty values pass; whether a key may be empty is decided by the
/// required flag in the definitions table.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    match key {
        "LEAD_MARK_POSITION" | "TRAIL_MARK_POSITION" => {
            if !RE_POSITION.is_match(value) {
                return Err("must be 'x,y' with integer coordinates".into());
            }
        }
        "TOWER_FIELD" | "CYLINDER_FIELD" | "HALF_FIELD" => {
            if !RE_FIELD.is_match(value) {
                return Err("must be 'start,length' with both at least 1".into());
            }
        }
        "SECTION_FIELD" => {
            let caps = RE_FIELD
                .captures(value)
                .ok_or("must be 'start,length' with both at least 1")?;
            if &caps[2] != "1" {
                return Err("section is a single character, length must be 1".into());
            }
        }
        "RESOLUTION_DPI" => validate_int_range(value, 1, 10_000)?,
        "POLL_INTERVAL_MS" => validate_int_range(value, 10, 3_600_000)?,
        "MOVE_RETRY_ATTEMPTS" => validate_int_range(value, 0, 100)?,
        "MOVE_RETRY_DELAY_MS" => validate_int_range(value, 0, 60_000)?,
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.trim().parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}
