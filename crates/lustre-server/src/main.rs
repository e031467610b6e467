mod api;
mod middleware;

use std::sync::Arc;

use lustre_copywriter::CopywriterClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limits, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(lustre_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = lustre_db::PoolConfig::from_app_config(&config);
    let pool = lustre_db::connect_pool(config.database_url()?, pool_config).await?;
    let applied = lustre_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations complete");

    let copywriter = match config.llm_api_key.as_deref() {
        Some(key) => Some(Arc::new(CopywriterClient::with_base_url(
            key,
            &config.llm_model,
            config.llm_timeout_secs,
            &config.llm_base_url,
        )?)),
        None => {
            tracing::warn!("LUSTRE_LLM_API_KEY not set; description drafting disabled");
            None
        }
    };

    let auth = AuthState::from_env(&config)?;
    let bind_addr = config.bind_addr;
    let app = build_app(
        AppState {
            pool,
            config,
            copywriter,
            auth,
        },
        default_rate_limits(),
    );

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "lustre-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
