mod memory;
mod sqlite;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{model::{Chat, Message}, AppResult};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable home of conversations and their messages.
///
/// Membership is not checked here; callers are trusted.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Stores a new chat, assigning an id when it is nil.
    /// Fails with `Conflict` when a chat with the same member set exists.
    async fn insert_chat(&self, chat: Chat) -> AppResult<Chat>;

    /// Fails with `NotFound("chat")` when absent.
    async fn get_chat(&self, chat_id: Uuid) -> AppResult<Chat>;

    /// Member list in stored order, without loading any messages.
    /// Fails with `NotFound("chat")` when absent.
    async fn get_members(&self, chat_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Appends atomically. Fails with `NotFound("chat")` when absent.
    async fn append_message(&self, chat_id: Uuid, message: &Message) -> AppResult<()>;
}
