//! Three-folder conveyor: intake → processing → delivery, one plate at a time.
//!
//! A plate only advances into an empty folder. The plate setter watches the
//! delivery folder, so plates land there under a temporary name first and
//! are renamed once complete.

pub mod retry;
pub mod slot;
pub mod transfer;

pub use retry::{RetryPolicy, retry_io, validation_delay};
pub use slot::{Slot, SlotState};

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::background::sleep_or_cancel;
use crate::error::Severity;

/// Pause before touching a freshly observed plate, so writers can finish.
const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Suffix of in-flight files in the delivery folder.
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, thiserror::Error)]
pub enum ConveyorError {
    #[error("{name} folder {path} is not available")]
    MissingDirectory { name: &'static str, path: PathBuf },

    #[error("More than one plate in the {slot} folder: {files:?}")]
    Anomaly { slot: Slot, files: Vec<String> },

    #[error("Failed to read the {slot} folder: {source}")]
    Scan {
        slot: Slot,
        #[source]
        source: io::Error,
    },

    #[error("{action} failed: {source}")]
    Io {
        action: String,
        #[source]
        source: io::Error,
    },
}

impl ConveyorError {
    pub fn severity(&self) -> Severity {
        match self {
            ConveyorError::MissingDirectory { .. } | ConveyorError::Scan { .. } => {
                Severity::Transient
            }
            ConveyorError::Anomaly { .. } => Severity::OperatorAction,
            ConveyorError::Io { .. } => Severity::Fatal,
        }
    }
}

/// The folders the conveyor works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConveyorPaths {
    pub intake: PathBuf,
    pub processing: PathBuf,
    pub delivery: PathBuf,
    pub log: PathBuf,
    /// Created on demand.
    pub reject: PathBuf,
}

impl ConveyorPaths {
    pub fn slot_dir(&self, slot: Slot) -> &Path {
        match slot {
            Slot::Intake => &self.intake,
            Slot::Processing => &self.processing,
            Slot::Delivery => &self.delivery,
        }
    }

    fn required(&self) -> [(&'static str, &Path); 4] {
        [
            ("Intake", &self.intake),
            ("Processing", &self.processing),
            ("Delivery", &self.delivery),
            ("Log", &self.log),
        ]
    }
}

/// Result of one conveyor step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The named plate advanced.
    Moved(String),
    /// Nothing to move, or the next folder is busy.
    Idle,
}

/// Moves plates between folders and remembers which anomalies it has
/// already reported.
#[derive(Debug)]
pub struct Conveyor {
    paths: ConveyorPaths,
    retry: RetryPolicy,
    settle_delay: Duration,
    reported: HashMap<Slot, Vec<String>>,
}

impl Conveyor {
    pub fn new(paths: ConveyorPaths, retry: RetryPolicy) -> Self {
        Self {
            paths,
            retry,
            settle_delay: SETTLE_DELAY,
            reported: HashMap::new(),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn paths(&self) -> &ConveyorPaths {
        &self.paths
    }

    /// Path of a plate inside the processing folder.
    pub fn processing_path(&self, name: &str) -> PathBuf {
        self.paths.processing.join(name)
    }

    /// Check that every working folder exists.
    pub fn validate(&self) -> Result<(), ConveyorError> {
        for (name, path) in self.paths.required() {
            if !path.is_dir() {
                return Err(ConveyorError::MissingDirectory {
                    name,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }

    /// Keep validating with an escalating wait until the folders are back.
    ///
    /// Returns `false` if cancelled while waiting.
    pub async fn validate_with_backoff(&self, token: &CancellationToken) -> bool {
        let mut attempt = 0u32;
        loop {
            match self.validate() {
                Ok(()) => {
                    if attempt > 0 {
                        tracing::info!(attempts = attempt, "Folders validated");
                    }
                    return true;
                }
                Err(e) => {
                    let delay = validation_delay(attempt);
                    tracing::warn!(
                        attempt,
                        "{e}; validating again in {} seconds",
                        delay.as_secs()
                    );
                    if sleep_or_cancel(token, delay).await {
                        return false;
                    }
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// Observe a slot, reporting each distinct anomaly once.
    fn observe(&mut self, slot: Slot) -> Result<Option<String>, ConveyorError> {
        let state = slot::observe(self.paths.slot_dir(slot))
            .map_err(|source| ConveyorError::Scan { slot, source })?;

        match state {
            SlotState::Empty => {
                self.reported.remove(&slot);
                Ok(None)
            }
            SlotState::Occupied(name) => {
                self.reported.remove(&slot);
                Ok(Some(name))
            }
            SlotState::Anomaly(files) => {
                if self.reported.get(&slot) != Some(&files) {
                    tracing::warn!(
                        %slot,
                        ?files,
                        "More than one plate in the {slot} folder, remove the extra files"
                    );
                    self.reported.insert(slot, files.clone());
                }
                Err(ConveyorError::Anomaly { slot, files })
            }
        }
    }

    /// Move the intake plate into an empty processing folder.
    pub async fn intake_to_processing(&mut self) -> Result<Transition, ConveyorError> {
        let Some(name) = self.observe(Slot::Intake)? else {
            return Ok(Transition::Idle);
        };
        if self.observe(Slot::Processing)?.is_some() {
            return Ok(Transition::Idle);
        }

        sleep(self.settle_delay).await;
        let from = self.paths.intake.join(&name);
        let to = self.paths.processing.join(&name);
        retry_io(&self.retry, "Move to processing", || transfer::move_file(&from, &to))
            .await
            .map_err(|source| ConveyorError::Io {
                action: format!("Moving {name} to processing"),
                source,
            })?;

        tracing::info!(file = %name, "Moved to processing");
        Ok(Transition::Moved(name))
    }

    /// Hand the processing plate to an empty delivery folder through a
    /// temporary name.
    pub async fn processing_to_delivery(&mut self) -> Result<Transition, ConveyorError> {
        let Some(name) = self.observe(Slot::Processing)? else {
            return Ok(Transition::Idle);
        };
        if self.observe(Slot::Delivery)?.is_some() {
            return Ok(Transition::Idle);
        }

        sleep(self.settle_delay).await;
        let from = self.paths.processing.join(&name);
        let temp = self.paths.delivery.join(format!("{name}{TEMP_SUFFIX}"));
        let to = self.paths.delivery.join(&name);

        retry_io(&self.retry, "Move to delivery", || transfer::move_file(&from, &temp))
            .await
            .map_err(|source| ConveyorError::Io {
                action: format!("Moving {name} to delivery"),
                source,
            })?;
        retry_io(&self.retry, "Rename in delivery", || std::fs::rename(&temp, &to))
            .await
            .map_err(|source| ConveyorError::Io {
                action: format!("Renaming {name} in delivery"),
                source,
            })?;

        tracing::info!(file = %name, "Moved to delivery");
        Ok(Transition::Moved(name))
    }

    /// Finish delivery renames cut short by a stop.
    ///
    /// An orphaned `<plate>.tmp` gets its plate name back when the delivery
    /// folder holds no plate. Otherwise it is left for the operator. Returns
    /// the recovered plate names.
    pub async fn recover_delivery(&self) -> Result<Vec<String>, ConveyorError> {
        let scan = |source: io::Error| ConveyorError::Scan {
            slot: Slot::Delivery,
            source,
        };

        let mut orphans = Vec::new();
        for entry in std::fs::read_dir(&self.paths.delivery).map_err(scan)? {
            let entry = entry.map_err(scan)?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(TEMP_SUFFIX)) else {
                continue;
            };
            if slot::is_plate_file(Path::new(name)) {
                orphans.push(name.to_string());
            }
        }
        orphans.sort();

        let mut recovered = Vec::new();
        for name in orphans {
            let temp = self.paths.delivery.join(format!("{name}{TEMP_SUFFIX}"));
            if slot::observe(&self.paths.delivery).map_err(scan)? != SlotState::Empty {
                tracing::warn!(
                    file = %temp.display(),
                    "Interrupted delivery left in place, the delivery folder already holds a plate"
                );
                continue;
            }

            let to = self.paths.delivery.join(&name);
            retry_io(&self.retry, "Rename in delivery", || std::fs::rename(&temp, &to))
                .await
                .map_err(|source| ConveyorError::Io {
                    action: format!("Renaming {name} in delivery"),
                    source,
                })?;
            tracing::info!(file = %name, "Finished interrupted delivery");
            recovered.push(name);
        }
        Ok(recovered)
    }

    /// Move a plate out of processing into the reject folder.
    pub async fn reject(&self, name: &str) -> Result<PathBuf, ConveyorError> {
        std::fs::create_dir_all(&self.paths.reject).map_err(|source| ConveyorError::Io {
            action: format!("Creating reject folder {}", self.paths.reject.display()),
            source,
        })?;

        let from = self.paths.processing.join(name);
        let to = self.paths.reject.join(name);
        retry_io(&self.retry, "Move to reject", || transfer::move_file(&from, &to))
            .await
            .map_err(|source| ConveyorError::Io {
                action: format!("Rejecting {name}"),
                source,
            })?;

        tracing::warn!(file = %name, folder = %self.paths.reject.display(), "Plate rejected");
        Ok(to)
    }
}
