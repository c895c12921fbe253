mod msg;
mod new;
mod ws;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(new::new_chat))
        .route("/ws", get(ws::chat_ws))
}
