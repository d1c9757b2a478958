//! EdgeWarp daemon entry point.
//!
//! Wires the X11 adapters to the route-motion use case and runs the event pump
//! on a single-threaded Tokio runtime until Ctrl-C or the event stream ends.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- thresholds + log level
//!  └─ X11Display::open()       -- enumeration, query, warp connection
//!  └─ refresh_registry()       -- initial layout
//!  └─ X11EventSource::start()  -- reader thread (raw motion + RandR)
//!  └─ pump_events()            -- until Ctrl-C
//! ```

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use warp_daemon::infrastructure::storage::config::{self, AppConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let (cfg, config_error) = match config::load_config() {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&cfg.daemon.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Some(e) = config_error {
        warn!("{e}; using default configuration");
    }

    info!("EdgeWarp daemon starting");

    if let Err(e) = run(cfg).await {
        error!("{e:#}");
        return Err(e);
    }

    info!("EdgeWarp daemon stopped");
    Ok(())
}

#[cfg(target_os = "linux")]
async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;
    use warp_core::{EdgeTransitionEngine, MonitorRegistry};
    use warp_daemon::application::route_motion::{pump_events, RouteMotionUseCase};
    use warp_daemon::infrastructure::display::{EventSource, X11Display, X11EventSource};

    let display = Arc::new(X11Display::open().context("failed to connect to the X server")?);
    let registry = Arc::new(MonitorRegistry::new());
    let engine = EdgeTransitionEngine::new(cfg.to_thresholds());

    let mut use_case =
        RouteMotionUseCase::new(registry, engine, display.clone(), display.clone());
    use_case.refresh_layout();

    let source = X11EventSource::new();
    let events = source
        .start()
        .context("failed to subscribe to display events")?;

    info!(
        edge_px = engine.thresholds().edge_px,
        min_motion = engine.thresholds().min_motion,
        "EdgeWarp ready.  Press Ctrl-C to exit."
    );

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // Without a signal handler the pump runs until the stream closes.
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    };

    let stats = pump_events(events, &mut use_case, shutdown).await;
    source.stop();

    info!(
        events = stats.events,
        warps = stats.warps,
        rebuilds = stats.rebuilds,
        "event pump finished"
    );
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn run(_cfg: AppConfig) -> anyhow::Result<()> {
    use warp_daemon::infrastructure::display::DisplayError;

    Err(DisplayError::UnsupportedPlatform(std::env::consts::OS.to_string()).into())
}
