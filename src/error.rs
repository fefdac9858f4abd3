use thiserror::Error;

/// Failures scoped to the current conversation. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The transcript could not be fetched. Recoverable via manual retry.
    #[error("Failed to load messages: {0}")]
    Transport(String),
    #[error("Chat channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("Conversation requires both a user and a peer")]
    InvalidKey,
    #[error("A live channel is already bound to user {0}")]
    AlreadyBound(String),
    #[error("Message text is empty")]
    EmptyMessage,
    #[error("Malformed `{event}` event: {reason}")]
    MalformedEvent { event: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Session expired, please log in again")]
    Unauthorized,
    #[error("Server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected response shape: {0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
}

impl From<ApiError> for ChatError {
    fn from(err: ApiError) -> Self {
        ChatError::Transport(err.to_string())
    }
}
