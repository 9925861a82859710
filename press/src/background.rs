//! Polling loop driving the press line until shutdown.

use std::time::Duration;

use fanout::GeometrySource;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::error::{PressError, Severity};
use crate::services::PressLine;

/// Sleep for `duration` unless cancelled first. Returns `true` if cancelled.
pub async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Poll the conveyor every `poll_interval` until cancelled.
///
/// Returns an error only for failures the service cannot continue after.
pub async fn press_loop<G: GeometrySource>(
    mut line: PressLine<G>,
    poll_interval: Duration,
    token: CancellationToken,
) -> Result<(), PressError> {
    let mut recovered = false;
    loop {
        if !line.conveyor().validate_with_backoff(&token).await {
            break;
        }

        if !recovered {
            match line.conveyor().recover_delivery().await {
                Ok(_) => recovered = true,
                Err(e) if e.severity() == Severity::Fatal => {
                    tracing::error!("Press line stopped: {e}");
                    return Err(e.into());
                }
                Err(e) => tracing::warn!(severity = %e.severity(), "{e}"),
            }
        }

        if let Err(e) = line.run_iteration().await {
            match e.severity() {
                Severity::Fatal => {
                    tracing::error!("Press line stopped: {e}");
                    return Err(e);
                }
                // Warned once when first seen.
                Severity::OperatorAction => tracing::debug!("{e}"),
                Severity::Transient | Severity::Validation => {
                    tracing::warn!(severity = %e.severity(), "{e}");
                }
            }
        }

        if sleep_or_cancel(&token, poll_interval).await {
            break;
        }
    }

    tracing::info!("Press loop stopped (shutdown)");
    Ok(())
}
