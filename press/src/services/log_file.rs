//! Daily plain-text log files in the configured log folder.
//!
//! Each event becomes one line, `LEVEL - yyyyMMdd HH:mm:ss - message`,
//! appended to `<log dir>/<yyyyMMdd>_press.log`.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

const FILE_SUFFIX: &str = "_press.log";

pub struct DailyLogLayer {
    dir: PathBuf,
    // Serializes appends from concurrent events.
    write_lock: Mutex<()>,
}

impl DailyLogLayer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Log file used for events at `now`.
    pub fn file_for(&self, now: DateTime<Local>) -> PathBuf {
        self.dir
            .join(format!("{}{FILE_SUFFIX}", now.format("%Y%m%d")))
    }

    fn append(&self, path: &Path, line: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")
    }
}

impl<S> Layer<S> for DailyLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let now = Local::now();
        let mut line = format!(
            "{} - {} - {}",
            meta.level(),
            now.format("%Y%m%d %H:%M:%S"),
            visitor.message.unwrap_or_else(|| meta.name().to_string())
        );
        line.push_str(&visitor.fields);

        // Nowhere left to report a failing log write.
        let _ = self.append(&self.file_for(now), &line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: Option<String>,
    fields: String,
}

impl LineVisitor {
    fn record_text(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_text(field, format!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_events_append_to_daily_file() {
        let dir = tempfile::tempdir().unwrap();
        let layer = DailyLogLayer::new(dir.path());
        let path = layer.file_for(Local::now());
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(file = "071A1.tif", "Moved to delivery");
            tracing::warn!("More than one plate");
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("INFO - "));
        assert!(lines[0].ends_with(" - Moved to delivery file=071A1.tif"));
        assert!(lines[1].starts_with("WARN - "));
        assert!(lines[1].ends_with(" - More than one plate"));
    }

    #[test]
    fn test_file_name_uses_local_date() {
        let layer = DailyLogLayer::new("/var/log/press");
        let day = Local::now();
        let expected = format!("{}_press.log", day.format("%Y%m%d"));
        assert_eq!(
            layer.file_for(day),
            Path::new("/var/log/press").join(expected)
        );
    }
}
