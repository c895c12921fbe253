use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::model::Outbound;

pub type Outbox = UnboundedReceiver<Outbound>;

/// Live handle for one authenticated connection.
///
/// Cloning shares the same outbound queue. Two handles refer to the same
/// connection only when their `connection_id`s match, so a superseded
/// connection can be told apart from a newer one for the same account.
#[derive(Debug, Clone)]
pub struct OnlineSession {
    account_id: Uuid,
    connection_id: Uuid,
    tx: UnboundedSender<Outbound>,
}

impl OnlineSession {
    /// Opens a session and returns the receiving end of its queue, which the
    /// connection's writer task drains.
    pub fn open(account_id: Uuid) -> (OnlineSession, Outbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = OnlineSession {
            account_id,
            connection_id: Uuid::now_v7(),
            tx,
        };
        (session, rx)
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn is_same(&self, other: &OnlineSession) -> bool {
        self.connection_id == other.connection_id
    }

    /// Queues an item without waiting. Returns false once the writer is gone.
    pub fn push(&self, item: Outbound) -> bool {
        self.tx.send(item).is_ok()
    }
}
