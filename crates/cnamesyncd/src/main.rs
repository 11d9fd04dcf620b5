// # cnamesyncd - reference-name A record synchronizer
//
// Thin integration layer: reads the environment, wires the Cloud DNS
// provider and the system resolver into the engine, and serves the
// trigger endpoint. All reconciliation logic lives in cnamesync-core.
//
// ## Configuration
//
// - `PROJECT_ID`: Cloud DNS project (required)
// - `CREDENTIALS_JSON`: Google credential file contents (required)
// - `CNAME`: reference hostname (required)
// - `DOMAINS`: whitespace-separated managed hostnames, `*.` allowed (required)
// - `PORT`: listen port (default 8080)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `RESOLVE_MAX_ATTEMPTS`: lookups per name (default 32)
// - `RESOLVE_RETRY_DELAY_MS`: pause between lookups (default 200)
// - `RECONCILE_TIMEOUT_SECS`: deadline for one pass (default 120)
// - `DNS_MODE`: `live` or `dry-run` (default live)
//
// Variables may also come from a `.env` file in the working directory.
// Values already set in the process environment win over the file; a
// missing or unreadable file is reported and otherwise ignored.
//
// ## Example
//
// ```bash
// export PROJECT_ID=my-project
// export CREDENTIALS_JSON="$(cat service-account.json)"
// export CNAME=edge.example.net
// export DOMAINS="www.example.com *.example.org"
//
// cnamesyncd
// curl -X POST localhost:8080/check-and-refresh-entries
// ```

mod config;
mod server;

use anyhow::Result;
use cnamesync_core::{SyncEngine, SystemLookup};
use cnamesync_provider_clouddns::CloudDnsProvider;
use config::Config;
use server::AppState;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting cnamesyncd");
    info!(
        "Configuration loaded: reference {}, {} domain(s), project {}",
        config.cname,
        config.domains.len(),
        config.project_id
    );
    if config.dry_run {
        warn!("DNS_MODE=dry-run: changes will be logged, not submitted");
    }

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let sync = engine.config();
    info!(
        "Lookups: {} attempt(s), {:?} apart; pass deadline {:?}",
        sync.retry.max_attempts, sync.retry.delay, sync.pass_timeout
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config.port, engine).await {
            error!("Daemon error: {}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Wire the provider and resolver into the engine
fn build_engine(config: &Config) -> Result<SyncEngine> {
    let provider = CloudDnsProvider::from_credentials_json(
        &config.project_id,
        &config.credentials_json,
        config.dry_run,
    )?;

    let engine = SyncEngine::new(
        Box::new(SystemLookup),
        Box::new(provider),
        config.sync_config(),
    )?;
    Ok(engine)
}

/// Serve the trigger endpoint until a shutdown signal arrives
async fn run_daemon(port: u16, engine: SyncEngine) -> Result<()> {
    let state = Arc::new(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind port {}: {}", port, e))?;

    info!("Starting server on port :{}", port);

    axum::serve(listener, server::build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Resolve once SIGTERM or SIGINT is received
#[cfg(unix)]
async fn shutdown_signal() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to set up signal handlers: {}", e);
            std::future::pending::<()>().await;
            return;
        }
    };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", received);
}

/// Resolve once CTRL-C is received
#[cfg(not(unix))]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
