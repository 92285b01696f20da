use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fileforge_core::{
    create_history_system, load_config_or_default, validate_config, BackendKind,
    BatchOrchestrator, ConversionRouter, FfmpegBackend, FormatRegistry, HistorySink, JobStore,
    MemoryHistory, RetentionControl, RetentionSweeper,
};
use fileforge_server::{create_router, AppState, WsBroadcaster};

/// Environment variable naming the config file
const CONFIG_ENV: &str = "FILEFORGE_CONFIG";

/// How long shutdown waits for in-flight jobs to release the history writer
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        "Retention: enabled={}, window={}min",
        config.retention.enabled, config.retention.window_minutes
    );

    // History
    let history_store = Arc::new(MemoryHistory::new(config.history.capacity));
    let history_sink: Arc<dyn HistorySink> = history_store.clone();
    let (history_handle, history_writer) =
        create_history_system(Arc::clone(&history_sink), config.history.buffer_size);
    let writer_handle = tokio::spawn(history_writer.run());

    // Backends
    let mut router = ConversionRouter::new(FormatRegistry::new());
    let mut ffmpeg_engine = None;
    if config.ffmpeg.enabled {
        let ffmpeg = Arc::new(FfmpegBackend::new(config.ffmpeg.clone()));
        ffmpeg_engine = Some(ffmpeg.engine());
        router.register(BackendKind::Audio, ffmpeg.clone());
        router.register(BackendKind::Video, ffmpeg);
        info!("FFmpeg backend installed ({:?})", config.ffmpeg.ffmpeg_path);
    } else {
        info!("FFmpeg backend disabled in config");
    }
    let installed = router.installed_backends();
    if installed.is_empty() {
        warn!("No conversion backends installed, every job will fail");
    } else {
        info!("Installed backends: {:?}", installed);
    }

    // Jobs and orchestration
    let store = JobStore::new();
    let orchestrator = Arc::new(BatchOrchestrator::new(
        config.orchestrator(),
        store.clone(),
        router,
        Some(history_handle),
    ));

    let retention = RetentionControl::new(config.retention_settings());
    let sweeper = RetentionSweeper::new(
        store.clone(),
        retention.clone(),
        config.retention.sweep_interval(),
    );
    sweeper.start();

    // Live updates
    let ws_broadcaster = WsBroadcaster::default();
    let forwarder = ws_broadcaster.forward_job_events(store.events());

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        retention,
        history_sink,
        ws_broadcaster,
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    sweeper.stop();
    forwarder.abort();
    if let Some(engine) = ffmpeg_engine {
        let torn_down = engine.teardown();
        info!(torn_down, "FFmpeg engine released");
    }

    // The orchestrator and any background job tasks hold the remaining
    // HistoryHandle clones. Once they are gone the writer drains and exits.
    drop(orchestrator);
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_handle).await {
        Ok(Ok(())) => info!(records = history_store.len(), "History writer stopped"),
        Ok(Err(e)) => warn!("History writer task failed: {}", e),
        Err(_) => warn!("History writer still busy after {:?}, exiting", WRITER_DRAIN_TIMEOUT),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
