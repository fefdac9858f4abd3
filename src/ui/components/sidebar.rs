use eframe::egui;

use crate::common::User;
use crate::ui::state::View;

#[derive(Default)]
pub struct SidebarAction {
    pub navigate: Option<View>,
    pub logout: bool,
}

pub fn render(ui: &mut egui::Ui, user: &User, current: &View) -> SidebarAction {
    let mut action = SidebarAction::default();

    ui.heading("DevConnect");
    ui.label(egui::RichText::new(format!("Welcome, {}", user.first_name)).weak());
    ui.separator();

    let entries = [
        (View::Feed, "Feed"),
        (View::Connections, "Connections"),
        (View::Requests, "Requests"),
        (View::Profile, "Profile"),
    ];
    for (view, label) in entries {
        if ui.selectable_label(*current == view, label).clicked() && *current != view {
            action.navigate = Some(view);
        }
    }

    if let View::Chat { peer_name, .. } = current {
        ui.horizontal(|ui| {
            ui.colored_label(egui::Color32::GREEN, "●");
            ui.label(format!("Chat with {peer_name}"));
        });
    }

    ui.separator();
    if ui.button("Logout").clicked() {
        action.logout = true;
    }

    action
}
