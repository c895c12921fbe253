use std::sync::Arc;

use axum::{debug_handler, extract::{rejection::JsonRejection, State}, http::{HeaderMap, StatusCode}, Json};

use crate::{
    auth::{bearer_token, Authenticator},
    model::{Chat, ChatIn},
    service::ChatService,
    AppError, AppResult, AppState,
};

#[debug_handler(state = AppState)]
pub(crate) async fn new_chat(
    State(service): State<ChatService>,
    State(auth): State<Arc<dyn Authenticator>>,
    headers: HeaderMap,

    body: Result<Json<ChatIn>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Chat>)> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let creator = auth.verify(token).await?;

    let Json(chat_in) = body.map_err(|err| AppError::BadRequest(err.body_text()))?;
    if chat_in.members.is_empty() {
        return Err(AppError::BadRequest("members is required".to_owned()));
    }

    let chat = service.create_chat(creator, chat_in).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}
