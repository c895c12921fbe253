use std::sync::Arc;

use hushline::{
    auth::RemoteAuth, config::Settings, presence::Presence, service::ChatService, store::SqliteStore,
    AppState,
};
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::new(&settings.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(&settings.database_url)
        .await?;
    let store = SqliteStore::new(db_pool);
    store.init().await?;
    tracing::info!(database = %settings.database_url, "connected to database");

    let auth = RemoteAuth::new(&settings.auth_address, settings.auth_timeout)?;
    let app_state = AppState {
        service: ChatService::new(Arc::new(store), Presence::new()),
        auth: Arc::new(auth),
    };

    let listener = tokio::net::TcpListener::bind(&settings.http_address).await?;
    tracing::info!(address = %settings.http_address, "server is running");
    axum::serve(listener, hushline::app(app_state)).await?;

    Ok(())
}
