use tokio_util::sync::CancellationToken;

use fanout_press_lib::background;
use fanout_press_lib::bootstrap;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Steps 1-2: Settings, logged to the console until the log folder is known
    let config = tracing::subscriber::with_default(
        bootstrap::console_subscriber(),
        fanout_press_lib::init_foundation,
    );
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            fanout_press_lib::init_tracing(None);
            tracing::error!("Startup failed: {e:#}");
            return Err(e);
        }
    };

    // Step 3: Tracing with daily log files
    fanout_press_lib::init_tracing(Some(&config.log_dir));
    tracing::info!("Starting fan-out press (version {})", env!("CARGO_PKG_VERSION"));

    // Step 4: Conveyor and plate pipeline
    let line = fanout_press_lib::build_press_line(&config).inspect_err(|e| {
        tracing::error!("Startup failed: {e:#}");
    })?;

    // Step 5: Shutdown on Ctrl+C
    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            return;
        }
        tracing::info!("Shutting down...");
        shutdown.cancel();
    });

    tracing::info!(
        poll_ms = config.poll_interval.as_millis() as u64,
        "Press loop running. Press Ctrl+C to stop."
    );
    background::press_loop(line, config.poll_interval, token).await?;
    Ok(())
}
