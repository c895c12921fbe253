use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    delivery,
    model::{Chat, ChatIn, Message, MessageIn},
    presence::Presence,
    store::ChatStore,
    AppError, AppResult,
};

type ChatLock = Arc<tokio::sync::Mutex<()>>;

/// Creates conversations and delivers messages into them.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    presence: Presence,
    chat_locks: Arc<Mutex<HashMap<Uuid, ChatLock>>>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>, presence: Presence) -> ChatService {
        ChatService {
            store,
            presence,
            chat_locks: Arc::default(),
        }
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    /// `members` is kept in the order given, with the creator appended if missing.
    pub async fn create_chat(&self, creator: Uuid, ChatIn { mut members, is_private }: ChatIn) -> AppResult<Chat> {
        if !members.contains(&creator) {
            members.push(creator);
        }

        let chat = self.store.insert_chat(Chat::new(members, is_private)).await?;
        tracing::info!(chat_id = %chat.id, %creator, members = chat.members.len(), "chat created");
        Ok(chat)
    }

    /// Persists `msg` and queues it for the other online members.
    ///
    /// Returns once the message is stored. The work runs on its own task, so
    /// dropping this future does not abandon a half-done delivery.
    pub async fn deliver(&self, sender: Uuid, msg: MessageIn) -> AppResult<Message> {
        msg.validate()?;

        let this = self.clone();
        tokio::spawn(async move { this.persist_and_fan_out(sender, msg).await }).await?
    }

    async fn persist_and_fan_out(&self, sender: Uuid, MessageIn { chat_id, reply_to, text }: MessageIn) -> AppResult<Message> {
        let members = self.store.get_members(chat_id).await?;
        if !members.contains(&sender) {
            return Err(AppError::Forbidden);
        }

        // append and fan-out under one lock so each recipient sees store order
        let lock = self.chat_lock(chat_id);
        let delivered = {
            let _guard = lock.lock().await;

            let message = Message::new(sender, reply_to, text);
            match self.store.append_message(chat_id, &message).await {
                Ok(()) => {
                    delivery::fan_out(&self.presence, chat_id, &members, &message);
                    Ok(message)
                }
                Err(err) => Err(err),
            }
        };
        self.release_chat_lock(chat_id, &lock);

        delivered
    }

    fn chat_lock(&self, chat_id: Uuid) -> ChatLock {
        self.chat_locks.lock().entry(chat_id).or_default().clone()
    }

    /// Drops the table entry once no other delivery holds or waits on it.
    fn release_chat_lock(&self, chat_id: Uuid, lock: &ChatLock) {
        let mut chat_locks = self.chat_locks.lock();
        // one reference in the table, one held by the caller
        if Arc::strong_count(lock) == 2 {
            chat_locks.remove(&chat_id);
        }
    }
}
