use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{AppError, AppResult};

/// A conversation: fixed member list plus an append-only message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub members: Vec<Uuid>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub is_private: bool,

    // unique: id
    // unique: set(members)
}

impl Chat {
    pub fn new(members: Vec<Uuid>, is_private: bool) -> Chat {
        Chat {
            id: Uuid::now_v7(),
            members,
            messages: Vec::new(),
            is_private,
        }
    }

    pub fn is_member(&self, account_id: Uuid) -> bool {
        self.members.contains(&account_id)
    }

    /// Order-independent view of the members, used for duplicate detection.
    pub fn member_set(&self) -> BTreeSet<Uuid> {
        self.members.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatIn {
    #[serde(default)]
    pub members: Vec<Uuid>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "from")]
    pub from_account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Uuid>,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Message {
    pub fn new(from_account_id: Uuid, reply_to: Option<Uuid>, text: String) -> Message {
        Message {
            from_account_id,
            reply_to,
            text,
            created_at: now_utc_seconds(),
        }
    }
}

/// Current UTC time rounded to the nearest second.
pub fn now_utc_seconds() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let nanos = now.nanosecond();
    let truncated = now - Duration::nanoseconds(i64::from(nanos));
    if nanos >= 500_000_000 {
        truncated + Duration::SECOND
    } else {
        truncated
    }
}

/// Inbound chat frame as sent by a client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageIn {
    pub chat_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Uuid>,
    #[serde(default)]
    pub text: String,
}

impl MessageIn {
    pub fn validate(&self) -> AppResult<()> {
        if self.chat_id.is_nil() || self.text.is_empty() {
            return Err(AppError::invalid_message());
        }
        Ok(())
    }
}

/// A persisted message on its way to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivered {
    pub chat_id: Uuid,
    #[serde(flatten)]
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub message: String,
}

impl Status {
    pub fn new(message: impl Into<String>) -> Status {
        Status { message: message.into() }
    }

    pub fn sended() -> Status {
        Status::new("sended")
    }
}

/// Anything written to a client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outbound {
    Message(Delivered),
    Status(Status),
}
