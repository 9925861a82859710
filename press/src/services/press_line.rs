//! One conveyor iteration: advance, compensate, deliver.

use fanout::GeometrySource;

use crate::conveyor::{Conveyor, Transition};
use crate::error::{PressError, Severity};
use crate::services::pipeline::PlatePipeline;

/// The conveyor plus the plate pipeline that runs between its folders.
pub struct PressLine<G> {
    conveyor: Conveyor,
    pipeline: PlatePipeline<G>,
    /// Plate moved into processing whose compensation has not succeeded yet.
    pending: Option<String>,
}

impl<G: GeometrySource> PressLine<G> {
    pub fn new(conveyor: Conveyor, pipeline: PlatePipeline<G>) -> Self {
        Self {
            conveyor,
            pipeline,
            pending: None,
        }
    }

    pub fn conveyor(&self) -> &Conveyor {
        &self.conveyor
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Run one pass over the three folders.
    ///
    /// Plates that fail validation are moved to the reject folder and do not
    /// fail the iteration. Any other error is returned with the unprocessed
    /// plate still held back from delivery.
    pub async fn run_iteration(&mut self) -> Result<(), PressError> {
        if let Transition::Moved(name) = self.conveyor.intake_to_processing().await? {
            self.pending = Some(name);
        }

        if let Some(name) = self.pending.clone() {
            self.compensate(&name).await?;
        }

        if self.pending.is_none() {
            self.conveyor.processing_to_delivery().await?;
        }
        Ok(())
    }

    async fn compensate(&mut self, name: &str) -> Result<(), PressError> {
        let path = self.conveyor.processing_path(name);
        if !path.exists() {
            tracing::warn!(file = name, "Plate left the processing folder before compensation");
            self.pending = None;
            return Ok(());
        }

        match self.pipeline.process(&path) {
            Ok(report) => {
                tracing::info!(file = name, "{report}");
                self.pending = None;
                Ok(())
            }
            Err(e) if e.severity() == Severity::Validation => {
                tracing::error!(file = name, "Plate cannot be compensated: {e}");
                self.conveyor.reject(name).await?;
                self.pending = None;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
