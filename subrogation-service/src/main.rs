use anyhow::Context;
use subrogation_service::{AppState, Settings, build_router};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "subrogation_service=debug,recovery_flow=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Periodically drops sessions whose browser tab went away without closing them.
fn spawn_session_sweeper(app_state: AppState) {
    let runner = app_state.runner;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(runner.session_ttl());
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = runner.evict_idle_sessions().await {
                error!(error = %e, "Session sweep failed");
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = Settings::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    let app_state = AppState::from_settings(&settings)
        .inspect_err(|e| error!(error = %e, "Failed to initialise agent backend"))?;
    spawn_session_sweeper(app_state.clone());
    let app = build_router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    let addr = listener.local_addr()?;

    info!(
        %addr,
        backend = ?settings.backend,
        liability_source = ?settings.liability_source,
        "Subrogation recovery desk listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
