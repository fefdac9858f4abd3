use eframe::egui;

pub fn render(ui: &mut egui::Ui, draft: &mut String, enabled: bool) -> bool {
    let mut send = false;
    ui.add_enabled_ui(enabled, |ui| {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(draft)
                    .hint_text("Type a message...")
                    .desired_width(ui.available_width() - 60.0),
            );
            if ui.button("Send").clicked() {
                send = true;
            }

            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                send = true;
                response.request_focus();
            }
        });
    });

    send && enabled && !draft.trim().is_empty()
}
