use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::{ConversationKey, Message, SessionUser};
use crate::error::ChatError;

use super::channel::{ChannelBinding, ChannelEvent, ChannelManager, ChannelStatus, ChannelTransport};
use super::history::{HistoryLoader, HistorySource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    /// History and channel requested, at least one still pending.
    Loading,
    /// History settled and the channel finished connecting.
    Active,
    Closed,
}

/// Transcript for the active conversation.
///
/// Live messages are appended in arrival order. The history batch is placed
/// once, as a block in front of everything that arrived live.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<Message>,
    history_merged: bool,
}

impl MessageLog {
    pub fn push_live(&mut self, message: Message) {
        self.entries.push(message);
    }

    /// Returns `false` if a history block was already merged.
    pub fn merge_history(&mut self, history: Vec<Message>) -> bool {
        if self.history_merged {
            return false;
        }
        self.entries.splice(0..0, history);
        self.history_merged = true;
        true
    }

    pub fn has_history(&self) -> bool {
        self.history_merged
    }

    pub fn messages(&self) -> &[Message] {
        &self.entries
    }
}

enum SessionEvent {
    History {
        generation: u64,
        result: Result<Vec<Message>, ChatError>,
    },
    Channel {
        generation: u64,
        event: ChannelEvent,
    },
}

/// Merges the persisted transcript with live channel traffic for one
/// conversation at a time.
///
/// Background work reports back through a private queue; results are
/// tagged with the generation they were started for and anything from an
/// older generation is discarded.
pub struct ConversationViewModel<S, T> {
    history: HistoryLoader<S>,
    channels: ChannelManager<T>,
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    generation: u64,
    key: Option<ConversationKey>,
    user: Option<SessionUser>,
    state: ConversationState,
    log: MessageLog,
    binding: Option<ChannelBinding>,
    history_task: Option<JoinHandle<()>>,
    error: Option<ChatError>,
    draft: String,
}

impl<S: HistorySource, T: ChannelTransport> ConversationViewModel<S, T> {
    pub fn new(history: Arc<S>, transport: Arc<T>, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            history: HistoryLoader::new(history),
            channels: ChannelManager::new(transport, runtime.clone()),
            runtime,
            events_tx,
            events_rx,
            generation: 0,
            key: None,
            user: None,
            state: ConversationState::Idle,
            log: MessageLog::default(),
            binding: None,
            history_task: None,
            error: None,
            draft: String::new(),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    #[cfg(test)]
    pub fn key(&self) -> Option<&ConversationKey> {
        self.key.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.history_task.is_some()
    }

    pub fn error(&self) -> Option<&ChatError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn channel_status(&self) -> Option<ChannelStatus> {
        self.binding.as_ref().map(ChannelBinding::status)
    }

    pub fn can_send(&self) -> bool {
        self.binding.as_ref().is_some_and(ChannelBinding::is_open)
    }

    #[cfg(test)]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    /// Point the view model at `(user, peer)`.
    ///
    /// Re-selecting the current conversation is a no-op. Anything else tears
    /// the current conversation down first; an incomplete key ends in `Idle`.
    pub fn set_conversation(&mut self, user: Option<&SessionUser>, peer_id: Option<&str>) {
        let key = match (user, peer_id) {
            (Some(user), Some(peer_id)) => {
                Some(ConversationKey::new(user.id.as_str(), peer_id)).filter(ConversationKey::is_complete)
            }
            _ => None,
        };

        if key.is_some() && key == self.key {
            return;
        }

        if self.key.is_some() {
            self.teardown();
        }

        match (key, user) {
            (Some(key), Some(user)) => self.enter(key, user.clone()),
            _ => self.state = ConversationState::Idle,
        }
    }

    pub fn close(&mut self) {
        self.teardown();
    }

    fn enter(&mut self, key: ConversationKey, user: SessionUser) {
        log::info!(
            "Entering conversation {} -> {} (generation {})",
            key.self_id,
            key.peer_id,
            self.generation
        );
        self.state = ConversationState::Loading;
        self.key = Some(key.clone());
        self.user = Some(user.clone());

        self.start_history(key.clone());

        let tx = self.events_tx.clone();
        let generation = self.generation;
        match self.channels.open(&key, &user, move |event| {
            let _ = tx.send(SessionEvent::Channel { generation, event });
        }) {
            Ok(binding) => self.binding = Some(binding),
            Err(err) => {
                log::warn!("Could not open chat channel: {err}");
                self.error = Some(err);
            }
        }
    }

    fn start_history(&mut self, key: ConversationKey) {
        if let Some(task) = self.history_task.take() {
            task.abort();
        }

        let loader = self.history.clone();
        let tx = self.events_tx.clone();
        let generation = self.generation;
        self.history_task = Some(self.runtime.spawn(async move {
            let result = loader.load(&key).await;
            let _ = tx.send(SessionEvent::History { generation, result });
        }));
    }

    /// History settled without a transcript, whatever the error slot says.
    pub fn can_retry_history(&self) -> bool {
        self.key.is_some() && self.history_task.is_none() && !self.log.has_history()
    }

    /// Returns `false` when there is nothing to retry.
    pub fn retry_history(&mut self) -> bool {
        if !self.can_retry_history() {
            return false;
        }
        let Some(key) = self.key.clone() else {
            return false;
        };

        self.error = None;
        self.state = ConversationState::Loading;
        self.start_history(key);
        true
    }

    fn teardown(&mut self) {
        if let Some(task) = self.history_task.take() {
            task.abort();
        }
        if let Some(mut binding) = self.binding.take() {
            self.channels.close(&mut binding);
        }
        if let Some(key) = self.key.take() {
            log::info!("Leaving conversation {} -> {}", key.self_id, key.peer_id);
        }

        // results still queued for the old conversation become stale
        self.generation += 1;
        self.user = None;
        self.log = MessageLog::default();
        self.error = None;
        self.draft.clear();
        self.state = ConversationState::Closed;
    }

    /// Publish `text` on the live channel.
    ///
    /// Echo-only: the sender's own copy is appended when the server
    /// broadcasts it back, never here.
    pub fn submit(&mut self, text: &str) -> Result<(), ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let result = match self.binding.as_ref() {
            Some(binding) => self.channels.send(binding, text),
            None => Err(ChatError::ChannelUnavailable(
                "no conversation selected".to_string(),
            )),
        };

        if let Err(err) = &result {
            log::warn!("Message not sent: {err}");
            self.error = Some(err.clone());
        }
        result
    }

    pub fn submit_draft(&mut self) -> Result<(), ChatError> {
        let text = self.draft.clone();
        self.submit(&text)?;
        self.draft.clear();
        Ok(())
    }

    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    #[cfg(test)]
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::History { generation, result } => {
                if generation != self.generation {
                    log::debug!("Discarding history from generation {generation}");
                    return;
                }
                self.history_task = None;
                match result {
                    Ok(history) => {
                        self.log.merge_history(history);
                    }
                    Err(err) => {
                        log::warn!("History load failed: {err}");
                        self.error = Some(err);
                    }
                }
            }
            SessionEvent::Channel { generation, event } => {
                if generation != self.generation {
                    log::debug!("Discarding channel event from generation {generation}");
                    return;
                }
                match event {
                    ChannelEvent::Connected => log::debug!("Chat channel open"),
                    ChannelEvent::Message(message) => self.log.push_live(message),
                    ChannelEvent::Unavailable(reason) => {
                        self.error = Some(ChatError::ChannelUnavailable(reason));
                    }
                }
            }
        }
        self.refresh_state();
    }

    fn refresh_state(&mut self) {
        let channel_settled = self
            .channel_status()
            .is_none_or(|status| status != ChannelStatus::Connecting);
        if self.state == ConversationState::Loading && !self.is_loading() && channel_settled {
            self.state = ConversationState::Active;
        }
    }
}

impl<S, T> Drop for ConversationViewModel<S, T> {
    fn drop(&mut self) {
        if let Some(task) = self.history_task.take() {
            task.abort();
        }
        // the binding releases itself when dropped
    }
}
