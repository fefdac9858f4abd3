use super::types::{ProfileUpdate, RequestStatus};

#[derive(Debug, Clone)]
pub enum ApiCommand {
    Login {
        email: String,
        password: String,
    },
    Signup {
        first_name: String,
        last_name: String,
        email: String,
        password: String,
    },
    Logout,
    /// Restore the session from the cookie jar, if any.
    LoadProfile,
    EditProfile(ProfileUpdate),
    LoadFeed,
    /// Decide on a feed card: `Interested` or `Ignored`.
    SendRequest {
        status: RequestStatus,
        user_id: String,
    },
    LoadConnections,
    LoadRequests,
    /// Answer a received request: `Accepted` or `Rejected`.
    ReviewRequest {
        status: RequestStatus,
        request_id: String,
    },
}

impl ApiCommand {
    pub fn action(&self) -> &'static str {
        match self {
            ApiCommand::Login { .. } => "login",
            ApiCommand::Signup { .. } => "signup",
            ApiCommand::Logout => "logout",
            ApiCommand::LoadProfile => "load profile",
            ApiCommand::EditProfile(_) => "edit profile",
            ApiCommand::LoadFeed => "load feed",
            ApiCommand::SendRequest { .. } => "send request",
            ApiCommand::LoadConnections => "load connections",
            ApiCommand::LoadRequests => "load requests",
            ApiCommand::ReviewRequest { .. } => "review request",
        }
    }
}
