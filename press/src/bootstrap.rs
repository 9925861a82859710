use std::path::Path;

use bitplate::{PlateCodec, TiffCodec};
use fanout::{AlignmentMarks, FanoutCompensator, JsonGeometryFile, MarkPlacement};
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{self, AppConfig, MarkConfig, SettingsManager};
use crate::conveyor::{Conveyor, ConveyorPaths};
use crate::services::{DailyLogLayer, PlatePipeline, PressLine};

const DEFAULT_LOG_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Console-only subscriber for use before the log folder is known.
pub fn console_subscriber() -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt().with_env_filter(env_filter()).finish()
}

/// Install the global subscriber: console plus daily files in `log_dir`.
pub fn init_tracing(log_dir: Option<&Path>) {
    let registry = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(log_dir.map(DailyLogLayer::new));
    if let Err(e) = registry.try_init() {
        eprintln!("Tracing already initialized: {e}");
    }
}

/// Load and validate settings (fatal on error).
pub fn init_foundation() -> Result<AppConfig, anyhow::Error> {
    let path = config::config_path();
    let sm = SettingsManager::load(&path)?;

    let unknown = sm.unknown_keys();
    if !unknown.is_empty() {
        tracing::warn!("Ignoring unknown settings: {unknown:?}");
    }

    let config = AppConfig::load(&sm)?;
    tracing::info!(
        intake = %config.intake_dir.display(),
        processing = %config.processing_dir.display(),
        delivery = %config.delivery_dir.display(),
        dpi = config.resolution_dpi,
        marks = config.marks.is_some(),
        "Settings loaded"
    );
    Ok(config)
}

/// Assemble the conveyor and plate pipeline described by `config`.
pub fn build_press_line(config: &AppConfig) -> Result<PressLine<JsonGeometryFile>, anyhow::Error> {
    let codec = TiffCodec::new(config.resolution_dpi);
    let compensator = match &config.marks {
        Some(marks) => FanoutCompensator::new(load_marks(&codec, marks)?),
        None => FanoutCompensator::without_marks(),
    };

    let conveyor = Conveyor::new(
        ConveyorPaths {
            intake: config.intake_dir.clone(),
            processing: config.processing_dir.clone(),
            delivery: config.delivery_dir.clone(),
            log: config.log_dir.clone(),
            reject: config.reject_dir.clone(),
        },
        config.retry,
    );
    let pipeline = PlatePipeline::new(
        config.name_layout,
        JsonGeometryFile::new(&config.geometry_file),
        codec,
        compensator,
    );
    Ok(PressLine::new(conveyor, pipeline))
}

fn load_marks(codec: &TiffCodec, marks: &MarkConfig) -> Result<AlignmentMarks, anyhow::Error> {
    let load = |path: &Path, (x, y): (i64, i64)| -> Result<MarkPlacement, anyhow::Error> {
        let image = codec
            .load(path)
            .map_err(|e| anyhow::anyhow!("failed to load mark {}: {e}", path.display()))?;
        tracing::info!(
            file = %path.display(),
            width = image.width(),
            height = image.height(),
            x,
            y,
            "Alignment mark loaded"
        );
        Ok(MarkPlacement::new(image, x, y))
    };

    Ok(AlignmentMarks::new(
        load(&marks.lead_file, marks.lead_position)?,
        load(&marks.trail_file, marks.trail_position)?,
    ))
}
