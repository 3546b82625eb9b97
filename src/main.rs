use std::sync::Arc;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

use url_status_checker::config::Args;
use url_status_checker::history::HistoryBuffer;
use url_status_checker::metrics::MetricsAggregator;
use url_status_checker::probe::Prober;
use url_status_checker::scheduler::Scheduler;
use url_status_checker::sweep::Monitor;
use url_status_checker::targets::TargetRegistry;
use url_status_checker::{server, AppState, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!("Starting URL Status Checker");

    // ── 1. Build the probe pipeline ──────────────────────────────
    let registry = Arc::new(TargetRegistry::builtin()?);
    let monitor = Arc::new(Monitor::new(
        registry.clone(),
        Prober::new(args.probe_timeout())?,
        Arc::new(MetricsAggregator::new()?),
        Arc::new(HistoryBuffer::default()),
        args.max_concurrent_probes,
    ));
    info!(
        targets = registry.len(),
        timeout_secs = args.probe_timeout().as_secs(),
        max_concurrent_probes = args.max_concurrent_probes,
        "probe pipeline ready"
    );

    // ── 2. Bind before anything runs in the background ───────────
    let addr = args.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // ── 3. Arm the periodic sweep ────────────────────────────────
    let scheduler = Scheduler::new(monitor.clone(), args.check_interval());
    scheduler.start()?;
    info!(
        interval_secs = args.check_interval().as_secs(),
        "background checks scheduled"
    );

    // ── 4. Build Axum router ─────────────────────────────────────
    let state = Arc::new(AppState { monitor });
    let app = server::create_router(state, &args.static_dir);

    // ── 5. Serve until a shutdown signal ─────────────────────────
    info!("Dashboard   → http://{addr}");
    info!("API         → http://{addr}/api");
    info!("Metrics     → http://{addr}/api/metrics");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // ── 6. Orderly shutdown ──────────────────────────────────────
    scheduler.stop().await?;
    served?;
    info!("URL Status Checker shutdown complete");
    Ok(())
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = ["hyper=warn", "reqwest=warn", "tower_http=warn"]
        .iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(
            EnvFilter::from_default_env().add_directive(level.into()),
            |filter, directive| filter.add_directive(directive),
        );

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
