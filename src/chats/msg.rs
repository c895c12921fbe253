use crate::{model::MessageIn, AppError, AppResult};

/// Decodes and validates one inbound chat frame.
pub(crate) fn decode(frame: &[u8]) -> AppResult<MessageIn> {
    let msg: MessageIn = serde_json::from_slice(frame).map_err(|err| {
        tracing::debug!(error = %err, "undecodable frame");
        AppError::invalid_message()
    })?;
    msg.validate()?;
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn rejected(frame: &str) -> bool {
        matches!(decode(frame.as_bytes()), Err(AppError::BadRequest(m)) if m == "invalid message received")
    }

    #[test]
    fn accepts_well_formed_frame() {
        let chat_id = Uuid::now_v7();
        let reply_to = Uuid::now_v7();
        let frame = format!(r#"{{"chat_id":"{chat_id}","reply_to":"{reply_to}","text":"hi"}}"#);

        let msg = decode(frame.as_bytes()).unwrap();
        assert_eq!(msg.chat_id, chat_id);
        assert_eq!(msg.reply_to, Some(reply_to));
        assert_eq!(msg.text, "hi");
    }

    #[test]
    fn rejects_bad_frames() {
        assert!(rejected("not json"));
        assert!(rejected(r#"{"text":"no chat"}"#));
        assert!(rejected(r#"{"to":"invalid uuid","text":"test message"}"#));
        assert!(rejected(r#"{"chat_id":"invalid uuid","text":"x"}"#));
        assert!(rejected(&format!(r#"{{"chat_id":"{}","text":""}}"#, Uuid::now_v7())));
        assert!(rejected(&format!(r#"{{"chat_id":"{}"}}"#, Uuid::now_v7())));
    }
}
