use eframe::egui;

use crate::common::ApiCommand;
use crate::ui::state::LoginForm;

pub fn render(ui: &mut egui::Ui, form: &mut LoginForm, busy: bool) -> Option<ApiCommand> {
    let mut submit = false;

    ui.heading(if form.is_signup { "Sign Up" } else { "Login" });
    ui.separator();

    egui::Grid::new("login_form").num_columns(2).show(ui, |ui| {
        if form.is_signup {
            ui.label("First Name");
            ui.text_edit_singleline(&mut form.first_name);
            ui.end_row();

            ui.label("Last Name");
            ui.text_edit_singleline(&mut form.last_name);
            ui.end_row();
        }

        ui.label("Email");
        ui.text_edit_singleline(&mut form.email);
        ui.end_row();

        ui.label("Password");
        let response = ui.add(egui::TextEdit::singleline(&mut form.password).password(true));
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }
        ui.end_row();
    });

    ui.horizontal(|ui| {
        let label = if form.is_signup { "Sign Up" } else { "Login" };
        if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
            submit = true;
        }
        if busy {
            ui.spinner();
        }
    });

    let toggle = if form.is_signup {
        "Existing user? Login here"
    } else {
        "New user? Sign up here"
    };
    if ui.link(toggle).clicked() {
        form.toggle_mode();
        return None;
    }

    (submit && !busy).then(|| form.to_command())
}
