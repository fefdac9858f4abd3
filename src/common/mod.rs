pub mod commands;
pub mod events;
pub mod types;
pub mod validation;

pub use commands::ApiCommand;
pub use events::ApiEvent;
pub use types::{
    ConnectionRequest, ConversationKey, Message, ProfileUpdate, RequestStatus, SessionUser, User,
};
