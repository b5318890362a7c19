//! Analysis screen: file picker, preview, submit button and result section.

use super::UiApp;
use eframe::egui;
use melon_core::{SelectedFile, SubmitState};
use rfd::FileDialog;
use std::path::PathBuf;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const PREVIEW_MAX: egui::Vec2 = egui::vec2(480.0, 320.0);

impl UiApp {
    pub(super) fn render_analyze_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading(self.tr("Analisis Kematangan Semangka", "Watermelon Ripeness Analysis"));
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            if ui.button(self.tr("Pilih gambar...", "Choose image...")).clicked()
                && let Some(path) = FileDialog::new()
                    .add_filter(self.tr("Gambar", "Images"), IMAGE_EXTENSIONS)
                    .add_filter(self.tr("Semua file", "All files"), &["*"])
                    .pick_file()
            {
                self.on_file_picked(path);
            }

            if let Some(file) = self.session.selected() {
                ui.label(&file.name);
            }
        });
        ui.add_space(8.0);

        if let Some(tex) = self.preview_texture(ui.ctx()) {
            ui.add(egui::Image::from_texture(&tex).max_size(PREVIEW_MAX));
            ui.add_space(8.0);
        } else if let Some(preview) = self.session.preview() {
            let lang = self.session.language();
            ui.weak(format!(
                "{} ({})",
                lang.tr("Pratinjau tidak tersedia", "Preview not available"),
                preview.file_name
            ));
            ui.add_space(8.0);
        }

        ui.horizontal(|ui| {
            let control = self.session.submit();
            if ui
                .add_enabled(control.enabled, egui::Button::new(control.label))
                .clicked()
            {
                self.on_submit();
            }
            if self.session.state() == SubmitState::Submitting {
                ui.spinner();
            }
        });

        ui.add_space(12.0);
        self.render_result_section(ui);
    }

    fn render_result_section(&mut self, ui: &mut egui::Ui) {
        let tex = self.result_texture(ui.ctx());
        let Some(result) = self.session.result() else {
            return;
        };
        let lang = self.session.language();

        ui.group(|ui| {
            ui.heading(lang.tr("Hasil Analisis", "Analysis Result"));
            egui::Grid::new("result-grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label(lang.tr("Kondisi", "Condition"));
                    ui.strong(&result.label);
                    ui.end_row();

                    ui.label(lang.tr("Tingkat keyakinan", "Confidence"));
                    ui.label(&result.confidence_text);
                    ui.end_row();

                    ui.label(lang.tr("Detail", "Details"));
                    ui.label(&result.details);
                    ui.end_row();
                });
            ui.add_space(8.0);
            match tex {
                Some(tex) => {
                    ui.add(egui::Image::from_texture(&tex).max_size(PREVIEW_MAX));
                }
                None => {
                    ui.weak(&result.image_path);
                }
            }
        });
    }

    fn on_file_picked(&mut self, path: PathBuf) {
        let file = SelectedFile::from_path(path);
        if let Ok(generation) = self.session.select_file(file.clone()) {
            self.workers.spawn_preview(generation, file);
        }
    }

    fn on_submit(&mut self) {
        let Some(classifier) = self.classifier.clone() else {
            self.status = self
                .tr(
                    "Atur alamat server yang valid di Pengaturan",
                    "Configure a valid server address in Settings",
                )
                .to_string();
            return;
        };
        if let Some(file) = self.session.begin_submit() {
            self.workers.spawn_predict(classifier, file);
        }
    }
}
