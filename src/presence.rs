use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::session::OnlineSession;

/// Which accounts are connected right now, and through which connection.
///
/// Owned by the service and dropped with it; nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct Presence {
    sessions: Arc<Mutex<HashMap<Uuid, OnlineSession>>>,
}

impl Presence {
    pub fn new() -> Presence {
        Presence::default()
    }

    /// Last registration wins.
    pub fn register(&self, session: OnlineSession) {
        let account_id = session.account_id();
        if let Some(old) = self.sessions.lock().insert(account_id, session) {
            tracing::debug!(%account_id, superseded = %old.connection_id(), "session replaced");
        }
    }

    /// Removes the mapping only if `session` is still the registered one.
    pub fn unregister(&self, session: &OnlineSession) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.get(&session.account_id()) {
            Some(current) if current.is_same(session) => {
                sessions.remove(&session.account_id());
                true
            }
            _ => false,
        }
    }

    pub fn lookup(&self, account_id: Uuid) -> Option<OnlineSession> {
        self.sessions.lock().get(&account_id).cloned()
    }

    pub fn online_count(&self) -> usize {
        self.sessions.lock().len()
    }
}
