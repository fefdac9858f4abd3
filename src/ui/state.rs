use crate::common::validation::build_profile_update;
use crate::common::{ApiCommand, ApiEvent, ProfileUpdate, User};
use crate::error::ApiError;
use crate::store::AppStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Login,
    Feed,
    Connections,
    Requests,
    Profile,
    Chat { peer_id: String, peer_name: String },
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub is_signup: bool,
}

impl LoginForm {
    pub fn to_command(&self) -> ApiCommand {
        if self.is_signup {
            ApiCommand::Signup {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                email: self.email.clone(),
                password: self.password.clone(),
            }
        } else {
            ApiCommand::Login {
                email: self.email.clone(),
                password: self.password.clone(),
            }
        }
    }

    pub fn toggle_mode(&mut self) {
        *self = Self {
            is_signup: !self.is_signup,
            ..Self::default()
        };
    }
}

#[derive(Debug, Default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub photo_url: String,
    pub age: String,
    pub gender: String,
    pub about: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            photo_url: user.photo_url.clone().unwrap_or_default(),
            age: user.age.map(|age| age.to_string()).unwrap_or_default(),
            gender: user.gender.clone().unwrap_or_default(),
            about: user.about.clone().unwrap_or_default(),
        }
    }

    pub fn to_update(&self) -> Result<ProfileUpdate, ApiError> {
        build_profile_update(
            &self.first_name,
            &self.last_name,
            &self.photo_url,
            &self.age,
            &self.gender,
            &self.about,
        )
    }
}

pub struct AppState {
    pub view: View,
    pub login: LoginForm,
    pub profile: ProfileForm,
    /// Dismissible banner for failures and confirmations.
    pub notice: Option<String>,
    pub busy: Option<&'static str>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: View::Login,
            login: LoginForm::default(),
            profile: ProfileForm::default(),
            notice: None,
            busy: None,
        }
    }

    pub fn chat_peer(&self) -> Option<&str> {
        match &self.view {
            View::Chat { peer_id, .. } => Some(peer_id.as_str()),
            _ => None,
        }
    }

    pub fn navigate(&mut self, view: View, store: &AppStore) -> Option<ApiCommand> {
        self.notice = None;
        self.view = view;
        match &self.view {
            View::Feed if store.feed.get().is_empty() => Some(ApiCommand::LoadFeed),
            View::Connections => Some(ApiCommand::LoadConnections),
            View::Requests => Some(ApiCommand::LoadRequests),
            View::Profile => {
                if let Some(user) = store.user.get() {
                    self.profile = ProfileForm::from_user(&user);
                }
                None
            }
            _ => None,
        }
    }

    pub fn start(&mut self, command: &ApiCommand) {
        self.busy = Some(command.action());
    }

    /// Fold an API result into the store and local state. Returns follow-up
    /// commands to send.
    pub fn apply_event(&mut self, store: &AppStore, event: ApiEvent) -> Vec<ApiCommand> {
        self.busy = None;

        match event {
            ApiEvent::LoggedIn(user) | ApiEvent::ProfileLoaded(user) => {
                store.set_user(user);
                self.login = LoginForm::default();
                if self.view == View::Login {
                    return self.navigate(View::Feed, store).into_iter().collect();
                }
            }
            ApiEvent::ProfileSaved(user) => {
                self.profile = ProfileForm::from_user(&user);
                store.set_user(user);
                self.notice = Some("Profile saved successfully".to_string());
            }
            ApiEvent::LoggedOut => {
                store.clear_user();
                self.view = View::Login;
            }
            ApiEvent::SessionExpired => {
                store.clear_user();
                self.view = View::Login;
                self.notice = Some("Please log in to continue".to_string());
            }
            ApiEvent::FeedLoaded(users) => store.add_feed(users),
            ApiEvent::RequestSent { user_id } => {
                store.remove_user_from_feed(&user_id);
                if store.feed.get().is_empty() {
                    return vec![ApiCommand::LoadFeed];
                }
            }
            ApiEvent::ConnectionsLoaded(users) => store.add_connections(users),
            ApiEvent::RequestsLoaded(requests) => store.add_requests(requests),
            ApiEvent::RequestReviewed { request_id } => store.remove_request(&request_id),
            ApiEvent::Failed { action, message } => {
                log::warn!("{action} failed: {message}");
                self.notice = Some(message);
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            photo_url: None,
            age: Some(36),
            gender: None,
            about: None,
            skills: Vec::new(),
        }
    }

    #[test]
    fn login_moves_to_feed_and_loads_it() {
        let store = AppStore::new();
        let mut state = AppState::new();

        let follow_ups = state.apply_event(&store, ApiEvent::LoggedIn(user("me")));

        assert_eq!(state.view, View::Feed);
        assert_eq!(store.session_user().unwrap().id, "me");
        assert!(matches!(follow_ups.as_slice(), [ApiCommand::LoadFeed]));
    }

    #[test]
    fn session_expiry_returns_to_login() {
        let store = AppStore::new();
        store.set_user(user("me"));
        let mut state = AppState::new();
        state.view = View::Chat {
            peer_id: "bob".to_string(),
            peer_name: "Bob".to_string(),
        };

        state.apply_event(&store, ApiEvent::SessionExpired);

        assert_eq!(state.view, View::Login);
        assert!(state.chat_peer().is_none());
        assert!(store.session_user().is_none());
        assert!(state.notice.is_some());
    }

    #[test]
    fn last_feed_decision_refetches_feed() {
        let store = AppStore::new();
        store.add_feed(vec![user("a")]);
        let mut state = AppState::new();

        let follow_ups = state.apply_event(
            &store,
            ApiEvent::RequestSent {
                user_id: "a".to_string(),
            },
        );

        assert!(store.feed.get().is_empty());
        assert!(matches!(follow_ups.as_slice(), [ApiCommand::LoadFeed]));
    }

    #[test]
    fn failures_surface_as_notice_and_clear_busy() {
        let store = AppStore::new();
        let mut state = AppState::new();
        state.start(&ApiCommand::LoadConnections);
        assert_eq!(state.busy, Some("load connections"));

        state.apply_event(
            &store,
            ApiEvent::Failed {
                action: "load connections",
                message: "Server responded with status 500".to_string(),
            },
        );

        assert_eq!(state.busy, None);
        assert_eq!(
            state.notice.as_deref(),
            Some("Server responded with status 500")
        );
    }

    #[test]
    fn navigation_requests_view_data() {
        let store = AppStore::new();
        store.set_user(user("me"));
        let mut state = AppState::new();

        assert!(matches!(
            state.navigate(View::Requests, &store),
            Some(ApiCommand::LoadRequests)
        ));
        assert!(state.navigate(View::Profile, &store).is_none());
        assert_eq!(state.profile.age, "36");

        let chat = View::Chat {
            peer_id: "bob".to_string(),
            peer_name: "Bob".to_string(),
        };
        assert!(state.navigate(chat, &store).is_none());
        assert_eq!(state.chat_peer(), Some("bob"));
    }

    #[test]
    fn login_form_builds_matching_command() {
        let mut form = LoginForm {
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            ..LoginForm::default()
        };
        assert!(matches!(form.to_command(), ApiCommand::Login { .. }));

        form.toggle_mode();
        assert!(form.is_signup);
        assert!(form.email.is_empty());
        assert!(matches!(form.to_command(), ApiCommand::Signup { .. }));
    }
}
