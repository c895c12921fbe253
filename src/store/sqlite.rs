use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{model::{Chat, Message}, AppError, AppResult};

use super::ChatStore;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_pool: SqlitePool,
}

/// Canonical form of a member set: sorted, de-duplicated, comma separated.
fn member_key(members: &[Uuid]) -> String {
    members
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl SqliteStore {
    pub fn new(db_pool: SqlitePool) -> SqliteStore {
        SqliteStore { db_pool }
    }

    pub async fn init(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY NOT NULL,
                members TEXT NOT NULL,
                member_key TEXT NOT NULL UNIQUE,
                is_private INTEGER NOT NULL
            )",
        )
        .execute(&self.db_pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id TEXT NOT NULL REFERENCES chats(id),
                from_account_id TEXT NOT NULL,
                reply_to TEXT,
                text TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.db_pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS messages_chat_id ON messages (chat_id, seq)")
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }

    async fn insert_message(
        tx: &mut Transaction<'_, Sqlite>,
        chat_id: Uuid,
        message: &Message,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO messages (chat_id,from_account_id,reply_to,text,created_at)
             SELECT ?,?,?,?,? WHERE EXISTS (SELECT 1 FROM chats WHERE id=?)",
        )
        .bind(chat_id.to_string())
        .bind(message.from_account_id.to_string())
        .bind(message.reply_to.as_ref().map(Uuid::to_string))
        .bind(&message.text)
        .bind(message.created_at.unix_timestamp())
        .bind(chat_id.to_string())
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ChatStore for SqliteStore {
    async fn insert_chat(&self, mut chat: Chat) -> AppResult<Chat> {
        if chat.id.is_nil() {
            chat.id = Uuid::now_v7();
        }

        let mut tx = self.db_pool.begin().await?;
        let inserted = sqlx::query("INSERT INTO chats (id,members,member_key,is_private) VALUES (?,?,?,?)")
            .bind(chat.id.to_string())
            .bind(serde_json::to_string(&chat.members)?)
            .bind(member_key(&chat.members))
            .bind(chat.is_private)
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(AppError::Conflict);
            }
            Err(err) => return Err(err.into()),
        }

        for message in &chat.messages {
            Self::insert_message(&mut tx, chat.id, message).await?;
        }
        tx.commit().await?;

        Ok(chat)
    }

    async fn get_chat(&self, chat_id: Uuid) -> AppResult<Chat> {
        let Some((members, is_private)): Option<(String, bool)> =
            sqlx::query_as("SELECT members,is_private FROM chats WHERE id=?")
                .bind(chat_id.to_string())
                .fetch_optional(&self.db_pool)
                .await?
        else {
            return Err(AppError::NotFound("chat"));
        };

        let rows: Vec<(String, Option<String>, String, i64)> = sqlx::query_as(
            "SELECT from_account_id,reply_to,text,created_at FROM messages WHERE chat_id=? ORDER BY seq",
        )
        .bind(chat_id.to_string())
        .fetch_all(&self.db_pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for (from_account_id, reply_to, text, created_at) in rows {
            messages.push(Message {
                from_account_id: Uuid::parse_str(&from_account_id)?,
                reply_to: match reply_to {
                    Some(x) => Some(Uuid::parse_str(&x)?),
                    None => None,
                },
                text,
                created_at: OffsetDateTime::from_unix_timestamp(created_at)?,
            });
        }

        Ok(Chat {
            id: chat_id,
            members: serde_json::from_str(&members)?,
            messages,
            is_private,
        })
    }

    async fn get_members(&self, chat_id: Uuid) -> AppResult<Vec<Uuid>> {
        let Some((members,)): Option<(String,)> = sqlx::query_as("SELECT members FROM chats WHERE id=?")
            .bind(chat_id.to_string())
            .fetch_optional(&self.db_pool)
            .await?
        else {
            return Err(AppError::NotFound("chat"));
        };

        Ok(serde_json::from_str(&members)?)
    }

    async fn append_message(&self, chat_id: Uuid, message: &Message) -> AppResult<()> {
        let mut tx = self.db_pool.begin().await?;
        let appended = Self::insert_message(&mut tx, chat_id, message).await?;
        tx.commit().await?;

        if appended == 0 {
            return Err(AppError::NotFound("chat"));
        }
        Ok(())
    }
}
