use tokio::sync::watch;

use crate::common::{ConnectionRequest, SessionUser, User};

/// One observable piece of application state.
pub struct Slice<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> Slice<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.sender.send_modify(modify);
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

pub struct AppStore {
    pub user: Slice<Option<User>>,
    pub feed: Slice<Vec<User>>,
    pub connections: Slice<Vec<User>>,
    pub requests: Slice<Vec<ConnectionRequest>>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        Self {
            user: Slice::new(None),
            feed: Slice::new(Vec::new()),
            connections: Slice::new(Vec::new()),
            requests: Slice::new(Vec::new()),
        }
    }

    /// Identity the chat core consumes. `None` keeps it idle.
    pub fn session_user(&self) -> Option<SessionUser> {
        self.user.sender.borrow().as_ref().map(SessionUser::from)
    }

    pub fn set_user(&self, user: User) {
        self.user.set(Some(user));
    }

    /// Logging out also drops everything fetched on behalf of the old user.
    pub fn clear_user(&self) {
        self.user.set(None);
        self.feed.set(Vec::new());
        self.connections.set(Vec::new());
        self.requests.set(Vec::new());
    }

    pub fn add_feed(&self, users: Vec<User>) {
        self.feed.set(users);
    }

    pub fn remove_user_from_feed(&self, user_id: &str) {
        self.feed.update(|feed| feed.retain(|user| user.id != user_id));
    }

    pub fn add_connections(&self, users: Vec<User>) {
        self.connections.set(users);
    }

    pub fn add_requests(&self, requests: Vec<ConnectionRequest>) {
        self.requests.set(requests);
    }

    pub fn remove_request(&self, request_id: &str) {
        self.requests
            .update(|requests| requests.retain(|request| request.id != request_id));
    }
}
