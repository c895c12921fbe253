use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{rejection::QueryRejection, ws::{Message as WsMessage, WebSocket}, Query, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{stream::{SplitSink, SplitStream}, SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{bearer_token, Authenticator},
    chats::msg,
    model::{Outbound, Status},
    service::ChatService,
    session::{OnlineSession, Outbox},
    AppError, AppState,
};

#[derive(Deserialize)]
pub(crate) struct WsQuery {
    token: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn chat_ws(
    query: Result<Query<WsQuery>, QueryRejection>,
    State(service): State<ChatService>,
    State(auth): State<Arc<dyn Authenticator>>,
    headers: HeaderMap,

    ws: WebSocketUpgrade,
) -> Response {
    // an unreadable query string carries no usable token
    let token = query.ok().and_then(|Query(WsQuery { token })| token);
    let token = token
        .as_deref()
        .filter(|token| !token.is_empty())
        .or_else(|| bearer_token(&headers));

    let verified = match token {
        Some(token) => auth.verify(token).await,
        None => Err(AppError::Unauthorized),
    };
    let account_id = match verified {
        Ok(account_id) => account_id,
        Err(AppError::Unauthorized) => {
            tracing::warn!("websocket refused: invalid token");
            return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
        }
        Err(err) => return err.into_response(),
    };

    ws.on_upgrade(move |socket| run_connection(socket, account_id, service))
}

/// Lives as long as the connection. Either loop ending tears down the other.
async fn run_connection(socket: WebSocket, account_id: Uuid, service: ChatService) {
    let (session, outbox) = OnlineSession::open(account_id);
    let (sink, stream) = socket.split();

    service.presence().register(session.clone());
    tracing::info!(%account_id, connection_id = %session.connection_id(), "connected");

    let mut writer = tokio::spawn(write_loop(sink, outbox));
    let mut reader = tokio::spawn(read_loop(stream, session.clone(), service.clone()));

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    };

    service.presence().unregister(&session);
    tracing::info!(%account_id, connection_id = %session.connection_id(), "disconnected");
}

async fn write_loop(mut sink: SplitSink<WebSocket, WsMessage>, mut outbox: Outbox) {
    while let Some(item) = outbox.recv().await {
        let text = match serde_json::to_string(&item) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "outbound encode failed");
                continue;
            }
        };

        if let Err(err) = sink.send(WsMessage::Text(text.into())).await {
            tracing::debug!(error = %err, "write failed");
            break;
        }
    }
}

async fn read_loop(mut stream: SplitStream<WebSocket>, session: OnlineSession, service: ChatService) {
    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                tracing::debug!(error = %err, "read failed");
                break;
            }
        };

        let decoded = match frame {
            WsMessage::Text(text) => msg::decode(text.as_str().as_bytes()),
            WsMessage::Binary(data) => msg::decode(&data),
            WsMessage::Close(_) => break,
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
        };

        let reply = match decoded {
            Ok(msg) => service.deliver(session.account_id(), msg).await,
            Err(err) => Err(err),
        };

        let status = match reply {
            Ok(_) => Status::sended(),
            Err(err) => {
                tracing::warn!(account_id = %session.account_id(), error = %err, "message rejected");
                err.status()
            }
        };

        if !session.push(Outbound::Status(status)) {
            break;
        }
    }
}
