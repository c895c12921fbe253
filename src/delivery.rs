use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    model::{Delivered, Message, Outbound},
    presence::Presence,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: usize,
    pub offline: usize,
}

/// Queues `message` for every online member of a chat except its sender.
///
/// Never waits on a recipient. Offline members, and members whose connection
/// is already tearing down, are skipped.
pub fn fan_out(presence: &Presence, chat_id: Uuid, members: &[Uuid], message: &Message) -> FanOut {
    let sender = message.from_account_id;
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(members.len());
    let mut report = FanOut::default();

    for &member in members {
        if member == sender || !seen.insert(member) {
            continue;
        }

        let Some(session) = presence.lookup(member) else {
            report.offline += 1;
            continue;
        };

        let item = Outbound::Message(Delivered {
            chat_id,
            message: message.clone(),
        });
        if session.push(item) {
            report.delivered += 1;
        } else {
            report.offline += 1;
        }
    }

    tracing::debug!(
        %chat_id,
        delivered = report.delivered,
        offline = report.offline,
        "fan-out"
    );
    report
}
