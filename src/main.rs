use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use tokio::time::{self, Duration as TokioDuration};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torwaechter::state::AppState;
use torwaechter::{config, middleware, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging (stdout + tägliche Datei-Rotation unter ./logs)
    std::fs::create_dir_all("logs").ok();
    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::daily("logs", "torwaechter.log");
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stdout_nb))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .init();
    // Guards am Leben halten (nicht fallen lassen), damit Non-Blocking Writer korrekt flushen
    let _log_guards = (stdout_guard, file_guard);

    // Load configuration (embedded defaults -> torwaechter.toml -> env/.env)
    let app_cfg = config::load()?;

    // App state (guard, pre-authenticator, tenant config, metrics)
    let state = AppState::new(app_cfg.clone())?;

    // Periodic sweep of expired rate counters to bound memory; correctness
    // comes from the lazy staleness check on access.
    {
        let guard = state.guard.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(TokioDuration::from_secs(30));
            loop {
                ticker.tick().await;
                guard.sweep();
            }
        });
    }

    // Router: gated routes plus transport-level layers
    let app = routes::router(state)
        // Globales Body-Limit (1 MB) – das Gateway verarbeitet nur kleine Requests
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::security_headers::security_headers_middleware));

    // Server listen addr (from config)
    let port: u16 = app_cfg.server.port;
    let host: String = app_cfg.server.host.clone();
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen addr {}:{} - {}", host, port, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Torwaechter listening on http://{}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
