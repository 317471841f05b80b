mod db;
mod error;
mod llm;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");
    let store = Arc::new(services::store::PgStore::new(pool));

    // Provider keys come per request; only endpoints and timeouts are configured here.
    let providers = llm::config::LlmConfig::from_env()
        .and_then(llm::ProviderRegistry::from_config)
        .expect("invalid LLM provider config");

    let state = state::AppState::new(store, Arc::new(providers), state::AppConfig::from_env());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "doubt-solver listening");
    axum::serve(listener, app).await.expect("server failed");
}
