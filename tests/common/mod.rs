#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hushline::{
    app, auth::StaticAuth, model::Chat, presence::Presence, service::ChatService,
    store::MemoryStore, AppState,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub service: ChatService,
    pub accounts: Vec<Uuid>,
}

/// Boots the router on an ephemeral port with `count` known accounts.
pub async fn spawn_server(count: usize) -> TestServer {
    let accounts: Vec<Uuid> = (0..count).map(|_| Uuid::now_v7()).collect();
    let service = ChatService::new(Arc::new(MemoryStore::new()), Presence::new());
    let app_state = AppState {
        service: service.clone(),
        auth: Arc::new(StaticAuth::new(accounts.clone())),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(app_state)).await.unwrap();
    });

    TestServer { addr, service, accounts }
}

impl TestServer {
    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/ws?token={token}", self.addr)
    }

    /// Connects as `account` and waits until the connection is registered.
    pub async fn connect(&self, account: Uuid) -> WsClient {
        let before = self.service.presence().lookup(account).map(|s| s.connection_id());
        let (ws, _) = connect_async(self.ws_url(&account.to_string())).await.unwrap();

        for _ in 0..200 {
            let now = self.service.presence().lookup(account).map(|s| s.connection_id());
            if now.is_some() && now != before {
                return ws;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("{account} never came online");
    }

    pub async fn create_chat(&self, creator: Uuid, members: &[Uuid], is_private: bool) -> Chat {
        let response = self
            .post_chat(Some(creator), serde_json::json!({ "members": members, "is_private": is_private }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.unwrap()
    }

    pub async fn post_chat(&self, creator: Option<Uuid>, body: Value) -> reqwest::Response {
        let mut request = reqwest::Client::new()
            .post(format!("http://{}/chat", self.addr))
            .json(&body);
        if let Some(creator) = creator {
            request = request.header("Authorization", format!("Bearer {creator}"));
        }
        request.send().await.unwrap()
    }
}

pub async fn send_json(ws: &mut WsClient, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

/// Next text frame decoded as `T`, failing after a few seconds of silence.
pub async fn next_json<T: DeserializeOwned>(ws: &mut WsClient) -> T {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .unwrap();

        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// True when nothing arrives within a short window.
pub async fn stays_silent(ws: &mut WsClient) -> bool {
    tokio::time::timeout(Duration::from_millis(200), ws.next()).await.is_err()
}
