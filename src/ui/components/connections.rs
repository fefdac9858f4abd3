use eframe::egui;

use crate::common::User;
use crate::ui::state::View;

pub fn render(ui: &mut egui::Ui, connections: &[User]) -> Option<View> {
    ui.heading("Connections");
    ui.separator();

    if connections.is_empty() {
        ui.label("No connections found");
        return None;
    }

    let mut open = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for user in connections {
            ui.horizontal(|ui| {
                ui.strong(user.display_name());
                if let Some(about) = &user.about {
                    ui.label(egui::RichText::new(about.as_str()).weak());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Chat").clicked() {
                        open = Some(View::Chat {
                            peer_id: user.id.clone(),
                            peer_name: user.display_name(),
                        });
                    }
                });
            });
            ui.separator();
        }
    });

    open
}
