use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;

use crate::common::{ConversationKey, Message};
use crate::error::ChatError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSender {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A transcript record as stored by the server. Only the populated sender
/// and the text are read; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChatMessage {
    #[serde(default)]
    pub sender_id: Option<RawSender>,
    #[serde(default)]
    pub text: String,
}

impl From<RawChatMessage> for Message {
    fn from(record: RawChatMessage) -> Self {
        let sender = record.sender_id.unwrap_or_default();
        Message::new(
            sender.first_name.unwrap_or_default(),
            sender.last_name.unwrap_or_default(),
            record.text,
        )
    }
}

/// One-shot read of a persisted transcript, keyed by peer.
pub trait HistorySource: Send + Sync + 'static {
    fn fetch_transcript(
        &self,
        peer_id: &str,
    ) -> impl Future<Output = Result<Vec<RawChatMessage>, ChatError>> + Send;
}

pub struct HistoryLoader<S> {
    source: Arc<S>,
}

impl<S> Clone for HistoryLoader<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<S: HistorySource> HistoryLoader<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Fetch and normalize the transcript in server order.
    ///
    /// An incomplete key is not an error: nothing is fetched and the
    /// transcript is empty.
    pub async fn load(&self, key: &ConversationKey) -> Result<Vec<Message>, ChatError> {
        if !key.is_complete() {
            return Ok(Vec::new());
        }

        let records = self.source.fetch_transcript(&key.peer_id).await?;
        log::debug!(
            "Loaded {} history records for {}",
            records.len(),
            key.peer_id
        );
        Ok(records.into_iter().map(Message::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{GatedHistory, raw};

    #[test]
    fn raw_records_keep_only_display_fields() {
        let record: RawChatMessage = serde_json::from_str(
            r#"{
                "_id": "m1",
                "senderId": {"_id": "u1", "firstName": "Alice", "lastName": "Anders", "photoUrl": "x"},
                "text": "hi",
                "createdAt": "2024-05-01T10:00:00.000Z"
            }"#,
        )
        .unwrap();

        assert_eq!(Message::from(record), Message::new("Alice", "Anders", "hi"));
    }

    #[test]
    fn missing_sender_becomes_blank_name() {
        let record: RawChatMessage = serde_json::from_str(r#"{"text": "orphan"}"#).unwrap();
        assert_eq!(Message::from(record), Message::new("", "", "orphan"));
    }

    #[tokio::test]
    async fn incomplete_key_skips_the_fetch() {
        let source = GatedHistory::new();
        let loader = HistoryLoader::new(source.clone());

        let messages = loader.load(&ConversationKey::new("", "bob")).await.unwrap();

        assert!(messages.is_empty());
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn load_preserves_server_order() {
        let source = GatedHistory::new();
        let gate = source.gate("bob");
        gate.send(Ok(vec![
            raw("Alice", "Anders", "first"),
            raw("Bob", "Builder", "second"),
        ]))
        .unwrap();

        let loader = HistoryLoader::new(source);
        let messages = loader
            .load(&ConversationKey::new("alice", "bob"))
            .await
            .unwrap();

        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[tokio::test]
    async fn transport_failure_is_returned_not_raised() {
        let source = GatedHistory::new();
        source
            .gate("bob")
            .send(Err(ChatError::Transport("503".to_string())))
            .unwrap();

        let loader = HistoryLoader::new(source);
        let result = loader.load(&ConversationKey::new("alice", "bob")).await;

        assert_eq!(result, Err(ChatError::Transport("503".to_string())));
    }
}
