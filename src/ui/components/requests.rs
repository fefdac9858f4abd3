use eframe::egui;

use crate::common::{ConnectionRequest, RequestStatus};

pub fn render(
    ui: &mut egui::Ui,
    requests: &[ConnectionRequest],
    busy: bool,
) -> Option<(RequestStatus, String)> {
    ui.heading("Connection Requests");
    ui.separator();

    if requests.is_empty() {
        ui.label("No requests found");
        return None;
    }

    let mut review = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for request in requests {
            ui.horizontal(|ui| {
                ui.strong(request.from_user_id.display_name());
                if let Some(created_at) = request.created_at {
                    ui.label(egui::RichText::new(created_at.format("%Y-%m-%d").to_string()).weak());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add_enabled(!busy, egui::Button::new("Accept")).clicked() {
                        review = Some((RequestStatus::Accepted, request.id.clone()));
                    }
                    if ui.add_enabled(!busy, egui::Button::new("Reject")).clicked() {
                        review = Some((RequestStatus::Rejected, request.id.clone()));
                    }
                });
            });
            ui.separator();
        }
    });

    review
}
