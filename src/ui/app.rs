use std::time::Duration;

use eframe::egui;
use tokio::sync::{mpsc, watch};

use crate::chat::ConversationViewModel;
use crate::common::{ApiCommand, ApiEvent, User};
use crate::network::{ApiClient, SocketIoTransport};
use crate::store::AppStore;

use super::components::chat_area::{self, ChatArea};
use super::components::{connections, feed_card, input_bar, login_form, profile_form, requests, sidebar};
use super::state::{AppState, View};

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub type ChatViewModel = ConversationViewModel<ApiClient, SocketIoTransport>;

pub struct DevConnectApp {
    state: AppState,
    store: AppStore,
    chat: ChatViewModel,
    session: watch::Receiver<Option<User>>,
    command_sender: mpsc::Sender<ApiCommand>,
    event_receiver: mpsc::Receiver<ApiEvent>,
}

impl DevConnectApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        store: AppStore,
        chat: ChatViewModel,
        command_sender: mpsc::Sender<ApiCommand>,
        event_receiver: mpsc::Receiver<ApiEvent>,
    ) -> Self {
        let session = store.user.subscribe();
        Self {
            state: AppState::new(),
            store,
            chat,
            session,
            command_sender,
            event_receiver,
        }
    }

    fn handle_api_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            for command in self.state.apply_event(&self.store, event) {
                self.send_command(command);
            }
        }
    }

    fn send_command(&mut self, command: ApiCommand) {
        self.state.start(&command);
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to API worker: {err}");
            self.state.busy = None;
        }
    }

    fn navigate(&mut self, view: View) {
        if let Some(command) = self.state.navigate(view, &self.store) {
            self.send_command(command);
        }
    }

    fn watch_session(&mut self) {
        if !self.session.has_changed().unwrap_or(false) {
            return;
        }
        if self.session.borrow_and_update().is_none() {
            log::info!("Session ended, closing chat");
            self.chat.close();
        }
    }

    fn sync_conversation(&mut self) {
        let user = self.store.session_user();
        self.chat
            .set_conversation(user.as_ref(), self.state.chat_peer());
    }

    fn render_notice(&mut self, ui: &mut egui::Ui) {
        let Some(notice) = &self.state.notice else {
            return;
        };
        let mut dismiss = false;
        ui.horizontal(|ui| {
            ui.colored_label(egui::Color32::YELLOW, notice.as_str());
            if ui.small_button("Dismiss").clicked() {
                dismiss = true;
            }
        });
        ui.separator();
        if dismiss {
            self.state.notice = None;
        }
    }

    fn render_feed(&mut self, ui: &mut egui::Ui) {
        ui.heading("Feed");
        ui.separator();

        let feed = self.store.feed.get();
        let busy = self.state.busy.is_some();
        if let Some((status, user_id)) = feed_card::render(ui, feed.first(), busy) {
            self.send_command(ApiCommand::SendRequest { status, user_id });
        }
    }

    fn render_chat(&mut self, ui: &mut egui::Ui, peer_name: &str) {
        let user = self.store.session_user();
        let action = chat_area::render(
            ui,
            ChatArea {
                peer_name,
                messages: self.chat.messages(),
                user: user.as_ref(),
                state: self.chat.state(),
                loading: self.chat.is_loading(),
                can_retry: self.chat.can_retry_history(),
                error: self.chat.error(),
                connected: self.chat.can_send(),
            },
        );
        if action.retry {
            self.chat.retry_history();
        }
        if action.dismiss {
            self.chat.dismiss_error();
        }

        ui.separator();
        let enabled = self.chat.can_send();
        if input_bar::render(ui, self.chat.draft_mut(), enabled) {
            if let Err(err) = self.chat.submit_draft() {
                log::debug!("Draft kept: {err}");
            }
        }
    }
}

impl eframe::App for DevConnectApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_api_events();
        self.watch_session();
        self.sync_conversation();
        self.chat.poll_events();

        let Some(user) = self.store.user.get() else {
            egui::CentralPanel::default().show(ctx, |ui| {
                self.render_notice(ui);
                let busy = self.state.busy.is_some();
                if let Some(command) = login_form::render(ui, &mut self.state.login, busy) {
                    self.send_command(command);
                }
            });
            ctx.request_repaint_after(REPAINT_INTERVAL);
            return;
        };

        let action = egui::SidePanel::left("nav_sidebar")
            .show(ctx, |ui| sidebar::render(ui, &user, &self.state.view))
            .inner;
        if let Some(view) = action.navigate {
            self.navigate(view);
        }
        if action.logout {
            self.send_command(ApiCommand::Logout);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_notice(ui);
            let busy = self.state.busy.is_some();

            match self.state.view.clone() {
                View::Login | View::Feed => self.render_feed(ui),
                View::Connections => {
                    if let Some(view) = connections::render(ui, &self.store.connections.get()) {
                        self.navigate(view);
                    }
                }
                View::Requests => {
                    let pending = self.store.requests.get();
                    if let Some((status, request_id)) = requests::render(ui, &pending, busy) {
                        self.send_command(ApiCommand::ReviewRequest { status, request_id });
                    }
                }
                View::Profile => {
                    if profile_form::render(ui, &mut self.state.profile, busy) {
                        match self.state.profile.to_update() {
                            Ok(update) => self.send_command(ApiCommand::EditProfile(update)),
                            Err(err) => self.state.notice = Some(err.to_string()),
                        }
                    }
                }
                View::Chat { peer_name, .. } => self.render_chat(ui, &peer_name),
            }
        });

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
