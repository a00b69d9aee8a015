//! Application entry point for the `ktw-its` service.
//!
//! This binary orchestrates the full startup sequence of the ITS Katowice
//! caching layer, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the HTTP Fetch Port and the in-process event bus
//! - Performing the initial load of every domain (failure aborts startup)
//! - Polling `fetch_data` on a fixed interval
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `ITS_API_URL` (optional) – API base URL (default: https://its.katowice.eu)
//! - `POLL_INTERVAL_SECS` (optional) – scheduler period (default: 60)
//! - `HTTP_TIMEOUT_SECS` (optional) – request timeout (default: 30)
//! - `LISTEN_PORT` (optional) – HTTP port (default: 8080)
//! - `TRACKED_ENTITIES` (optional) – comma-separated ids for zone tracking
//! - `ITS_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `ITS_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use ktw_its::{config, routes, BroadcastPublisher, Context, HttpFetcher, ItsApi};

/// Buffered zone events per subscriber before the slowest one lags.
const EVENT_BUS_CAPACITY: usize = 64;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let fetcher = HttpFetcher::new(Duration::from_secs(u64::from(cfg.http_timeout_secs)))
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
    let ctx = Context::with_system_clock(Arc::new(fetcher), &cfg.api_url);

    let bus = BroadcastPublisher::new(EVENT_BUS_CAPACITY);
    spawn_event_logger(&bus);

    let api = Arc::new(ItsApi::new(
        ctx,
        Arc::new(bus.clone()),
        cfg.tracked_entities.clone(),
    ));

    tracing::info!("Performing initial load from {}", cfg.api_url);
    let entities = api
        .fetch_data()
        .await
        .map_err(|e| anyhow::anyhow!("Initial load from '{}' failed: {}", cfg.api_url, e))?;
    tracing::info!("Initial load complete: {} entities", entities.len());

    spawn_scheduler(api.clone(), Duration::from_secs(u64::from(cfg.poll_interval_secs)));

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(api);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Call `fetch_data` every `period`. A failed cycle is logged and the
/// next tick tries again.
fn spawn_scheduler(api: Arc<ItsApi>, period: Duration) {
    // ---
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately and the initial load already ran.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match api.fetch_data().await {
                Ok(entities) => tracing::debug!("Poll cycle done: {} entities", entities.len()),
                Err(e) => tracing::error!("Poll cycle failed: {}", e),
            }
        }
    });
}

/// Log every zone event published on the bus.
fn spawn_event_logger(bus: &BroadcastPublisher) {
    // ---
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok((event_type, event)) => tracing::info!(
                    "{}: {} zone {} at {} [{}]",
                    event_type,
                    event.entity_id,
                    event.zone_code,
                    event.occurred_at,
                    event.id
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event logger lagged, {} events skipped", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `ITS_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `ITS_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("ITS_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to ITS_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("ITS_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
