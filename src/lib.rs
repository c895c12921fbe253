pub mod appresult;
pub mod auth;
pub mod chats;
pub mod config;
pub mod delivery;
pub mod model;
pub mod presence;
pub mod service;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{extract::FromRef, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};

use auth::Authenticator;
use service::ChatService;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub service: ChatService,
    pub auth: Arc<dyn Authenticator>,
}

pub fn app(app_state: AppState) -> Router {
    Router::new()
        .merge(chats::router())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
