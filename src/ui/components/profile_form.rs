use eframe::egui;

use crate::ui::state::ProfileForm;

pub fn render(ui: &mut egui::Ui, form: &mut ProfileForm, busy: bool) -> bool {
    ui.heading("Edit Profile");
    ui.separator();

    egui::Grid::new("profile_form").num_columns(2).show(ui, |ui| {
        let fields = [
            ("First Name", &mut form.first_name),
            ("Last Name", &mut form.last_name),
            ("Photo URL", &mut form.photo_url),
            ("Age", &mut form.age),
            ("Gender", &mut form.gender),
        ];
        for (label, value) in fields {
            ui.label(label);
            ui.text_edit_singleline(value);
            ui.end_row();
        }

        ui.label("About");
        ui.text_edit_multiline(&mut form.about);
        ui.end_row();
    });

    ui.add_enabled(!busy, egui::Button::new("Save Profile"))
        .clicked()
}
