mod config;

use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing::info;

use rendezvous_api::state::AppStateInner;

use crate::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rendezvous=debug,tower_http=debug".into()),
        )
        .init();

    let settings = Settings::from_env()?;
    let cors = settings.cors.layer()?;

    // Init database
    let db = rendezvous_db::Database::open(&settings.db_path)?;

    let app = rendezvous_api::router(AppStateInner::new(db))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    info!("Rendezvous server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
