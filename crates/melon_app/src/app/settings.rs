//! Settings panel rendering for language, server address and timeout.

use super::{Panel, UiApp};
use eframe::egui;
use melon_core::{Language, LanguagePreference};

impl UiApp {
    /// Renders the settings screen.
    pub(super) fn render_settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading(self.tr("Pengaturan", "Settings"));
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label(self.tr("Bahasa", "Language"));
            let mut selected = self.settings.language;
            let language = self.session.language();
            let option_label = |pref: LanguagePreference| match (language, pref) {
                (Language::Indonesian, LanguagePreference::System) => "Sistem (otomatis)",
                (Language::English, LanguagePreference::System) => "System (auto)",
                (Language::Indonesian, LanguagePreference::Indonesian) => "Bahasa Indonesia",
                (Language::English, LanguagePreference::Indonesian) => "Indonesian",
                (Language::Indonesian, LanguagePreference::English) => "Bahasa Inggris",
                (Language::English, LanguagePreference::English) => "English",
            };
            egui::ComboBox::from_id_salt("language-select")
                .selected_text(option_label(selected))
                .show_ui(ui, |ui| {
                    for pref in [
                        LanguagePreference::System,
                        LanguagePreference::Indonesian,
                        LanguagePreference::English,
                    ] {
                        ui.selectable_value(&mut selected, pref, option_label(pref));
                    }
                });
            if selected != self.settings.language {
                self.update_language_preference(selected);
                self.status = self.tr("Bahasa diubah.", "Language updated.").to_string();
            }
        });

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            ui.label(self.tr("Alamat server", "Server address"));
            ui.text_edit_singleline(&mut self.server_url_input);
        });
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label(self.tr("Batas waktu (detik, 0 = tanpa batas)", "Timeout (seconds, 0 = none)"));
            ui.add(
                egui::DragValue::new(&mut self.timeout_input)
                    .range(0..=600)
                    .speed(1),
            );
        });
        ui.add_space(6.0);
        if ui.button(self.tr("Simpan", "Save")).clicked() {
            self.apply_connection_settings();
        }
        ui.label(self.tr(
            "Gambar dikirim ke endpoint /predict pada alamat ini.",
            "Images are sent to the /predict endpoint at this address.",
        ));

        ui.add_space(16.0);
        ui.separator();
        ui.add_space(6.0);
        ui.label(format!(
            "{}: {}",
            self.tr("Versi aplikasi", "App version"),
            self.app_version
        ));
    }

    fn apply_connection_settings(&mut self) {
        self.settings.server_url = self.server_url_input.trim().to_string();
        self.settings.request_timeout_secs = (self.timeout_input > 0).then_some(self.timeout_input);
        self.status.clear();
        self.rebuild_classifier();
        if self.classifier.is_some() {
            self.persist_settings();
            if self.status.is_empty() {
                self.status = self.tr("Pengaturan disimpan.", "Settings saved.").to_string();
            }
            self.panel = Panel::Analyze;
        }
    }
}
