use super::types::{ConnectionRequest, User};

#[derive(Debug, Clone)]
pub enum ApiEvent {
    LoggedIn(User),
    LoggedOut,
    ProfileLoaded(User),
    ProfileSaved(User),
    /// The session cookie was rejected; the UI returns to the login view.
    SessionExpired,
    FeedLoaded(Vec<User>),
    RequestSent { user_id: String },
    ConnectionsLoaded(Vec<User>),
    RequestsLoaded(Vec<ConnectionRequest>),
    RequestReviewed { request_id: String },
    Failed { action: &'static str, message: String },
}
