use eframe::egui;

use crate::common::{RequestStatus, User};

pub fn render(ui: &mut egui::Ui, user: Option<&User>, busy: bool) -> Option<(RequestStatus, String)> {
    let Some(user) = user else {
        ui.label("No new users found!");
        return None;
    };

    let mut decision = None;
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading(user.display_name());
        if let Some(age) = user.age {
            let gender = user.gender.as_deref().unwrap_or_default();
            ui.label(format!("{age} {gender}").trim().to_string());
        }
        if let Some(about) = &user.about {
            ui.label(about.as_str());
        }
        if !user.skills.is_empty() {
            ui.label(egui::RichText::new(user.skills.join(", ")).weak());
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Ignore")).clicked() {
                decision = Some((RequestStatus::Ignored, user.id.clone()));
            }
            if ui.add_enabled(!busy, egui::Button::new("Interested")).clicked() {
                decision = Some((RequestStatus::Interested, user.id.clone()));
            }
        });
    });

    decision
}
