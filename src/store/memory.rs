use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{model::{Chat, Message}, AppError, AppResult};

use super::ChatStore;

/// In-process store for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chats: RwLock<HashMap<Uuid, Chat>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn insert_chat(&self, mut chat: Chat) -> AppResult<Chat> {
        let mut chats = self.chats.write().await;

        let members = chat.member_set();
        if chats.values().any(|existing| existing.member_set() == members) {
            return Err(AppError::Conflict);
        }

        if chat.id.is_nil() {
            chat.id = Uuid::now_v7();
        }
        chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn get_chat(&self, chat_id: Uuid) -> AppResult<Chat> {
        self.chats
            .read()
            .await
            .get(&chat_id)
            .cloned()
            .ok_or(AppError::NotFound("chat"))
    }

    async fn get_members(&self, chat_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.chats
            .read()
            .await
            .get(&chat_id)
            .map(|chat| chat.members.clone())
            .ok_or(AppError::NotFound("chat"))
    }

    async fn append_message(&self, chat_id: Uuid, message: &Message) -> AppResult<()> {
        let mut chats = self.chats.write().await;
        let chat = chats.get_mut(&chat_id).ok_or(AppError::NotFound("chat"))?;
        chat.messages.push(message.clone());
        Ok(())
    }
}
