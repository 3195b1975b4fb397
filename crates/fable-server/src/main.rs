use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use fable_api::routes::router;
use fable_api::state::AppStateInner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fable=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let session_secret =
        std::env::var("FABLE_SESSION_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("FABLE_DB_PATH").unwrap_or_else(|_| "fable.db".into());
    let host = std::env::var("FABLE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FABLE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let api_key = std::env::var("GEMINI_API_KEY").ok();
    let ai_endpoint = std::env::var("FABLE_AI_ENDPOINT").ok();

    if api_key.is_none() {
        warn!("GEMINI_API_KEY not set; AI endpoints will fall back or error");
    }

    // Init database and AI gateway
    let db = fable_db::Database::open(&PathBuf::from(&db_path))?;
    let ai = fable_ai::AiClient::new(api_key, ai_endpoint)?;

    // Shared state
    let state = Arc::new(AppStateInner::new(db, ai, session_secret)?);

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Fable server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
