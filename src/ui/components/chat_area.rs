use eframe::egui;

use crate::chat::ConversationState;
use crate::common::{Message, SessionUser};
use crate::error::ChatError;

#[derive(Default)]
pub struct ChatAreaAction {
    pub retry: bool,
    pub dismiss: bool,
}

pub struct ChatArea<'a> {
    pub peer_name: &'a str,
    pub messages: &'a [Message],
    pub user: Option<&'a SessionUser>,
    pub state: ConversationState,
    pub loading: bool,
    pub can_retry: bool,
    pub error: Option<&'a ChatError>,
    pub connected: bool,
}

pub fn render(ui: &mut egui::Ui, area: ChatArea<'_>) -> ChatAreaAction {
    let mut action = ChatAreaAction::default();

    ui.horizontal(|ui| {
        ui.heading(format!("Chat with {}", area.peer_name));
        if area.state == ConversationState::Loading {
            ui.spinner();
        }
        let (color, label) = if area.connected {
            (egui::Color32::GREEN, "connected")
        } else {
            (egui::Color32::GRAY, "offline")
        };
        ui.colored_label(color, "●");
        ui.label(egui::RichText::new(label).weak());
    });
    ui.separator();

    if let Some(err) = area.error {
        ui.horizontal(|ui| {
            ui.colored_label(egui::Color32::RED, err.to_string());
            if ui.small_button("Dismiss").clicked() {
                action.dismiss = true;
            }
        });
    }
    if area.can_retry {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Earlier messages could not be loaded").weak());
            if ui.button("Retry").clicked() {
                action.retry = true;
            }
        });
    }
    if area.error.is_some() || area.can_retry {
        ui.separator();
    }

    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .max_height(ui.available_height() - 40.0)
        .show(ui, |ui| {
            if area.messages.is_empty() && !area.loading {
                ui.label(egui::RichText::new("No messages yet").weak());
            }
            for message in area.messages {
                let own = area.user.is_some_and(|user| message.is_from(user));
                let layout = if own {
                    egui::Layout::right_to_left(egui::Align::TOP)
                } else {
                    egui::Layout::left_to_right(egui::Align::TOP)
                };
                ui.with_layout(layout, |ui| {
                    ui.label(egui::RichText::new(&message.text));
                    let name = format!("{} {}", message.first_name, message.last_name);
                    ui.label(egui::RichText::new(name.trim()).weak());
                });
            }
        });

    action
}
