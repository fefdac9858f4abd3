//! Real-time one-to-one chat: transcript loading, the live channel and the
//! view model that reconciles the two.

pub mod channel;
pub mod conversation;
pub mod history;

#[cfg(test)]
pub(crate) mod testing;

pub use conversation::{ConversationState, ConversationViewModel};
pub use history::{HistorySource, RawChatMessage};
