mod analyze;
mod settings;

use crate::paths;
use anyhow::{Context, Result};
use eframe::{App, Frame, egui};
use melon_core::{
    Classifier, DecodedImage, HttpClassifier, Language, LanguagePreference, Session, Settings,
    WorkerEvent, Workers,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Analyze,
    Settings,
}

pub struct UiApp {
    session: Session,
    workers: Workers,
    /// `None` while the configured server URL is unusable.
    classifier: Option<Arc<dyn Classifier>>,
    settings: Settings,
    settings_path: Option<PathBuf>,
    panel: Panel,
    status: String,
    preview_tex: Option<egui::TextureHandle>,
    result_tex: Option<egui::TextureHandle>,
    server_url_input: String,
    timeout_input: u64,
    app_version: &'static str,
}

impl UiApp {
    pub fn new(ctx: &egui::Context) -> Self {
        let (settings, settings_path) = paths::load_settings();
        let language = resolve_language(settings.language);
        let repaint = ctx.clone();
        let workers = Workers::new(move || repaint.request_repaint());

        let mut app = Self {
            session: Session::new(language),
            workers,
            classifier: None,
            server_url_input: settings.server_url.clone(),
            timeout_input: settings.request_timeout_secs.unwrap_or(0),
            settings,
            settings_path,
            panel: Panel::Analyze,
            status: String::new(),
            preview_tex: None,
            result_tex: None,
            app_version: env!("MELON_VERSION"),
        };
        app.rebuild_classifier();
        tracing::info!(server = %app.settings.server_url, "MelonCheck started");
        app
    }

    fn tr(&self, id: &'static str, en: &'static str) -> &'static str {
        self.session.language().tr(id, en)
    }

    fn rebuild_classifier(&mut self) {
        match build_classifier(&self.settings) {
            Ok(classifier) => self.classifier = Some(classifier),
            Err(e) => {
                tracing::warn!("{e:#}");
                self.classifier = None;
                self.status = format!(
                    "{}: {e:#}",
                    self.tr("Alamat server tidak valid", "Invalid server address")
                );
            }
        }
    }

    fn persist_settings(&mut self) {
        let Some(path) = self.settings_path.as_ref() else {
            return;
        };
        if let Err(e) = self.settings.save_to(path) {
            tracing::warn!("failed to save settings: {e}");
            self.status = format!(
                "{}: {e}",
                self.tr("Gagal menyimpan pengaturan", "Failed to save settings")
            );
        }
    }

    fn update_language_preference(&mut self, preference: LanguagePreference) {
        self.settings.language = preference;
        self.session.set_language(resolve_language(preference));
        self.persist_settings();
    }

    /// Applies finished background work to the session.
    fn pump_events(&mut self) {
        while let Some(event) = self.workers.try_recv() {
            let preview_changed = matches!(event, WorkerEvent::PreviewReady { .. });
            if let Some(request) = self.session.handle(event)
                && let Some(classifier) = self.classifier.clone()
            {
                self.workers.spawn_result_image(classifier, request);
            }
            let (preview, result) =
                stale_textures(preview_changed, self.session.result().is_some());
            if preview {
                self.preview_tex = None;
            }
            if result {
                self.result_tex = None;
            }
        }
    }

    fn preview_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        if self.preview_tex.is_none() {
            let image = self.session.preview()?.image.as_ref()?;
            self.preview_tex = Some(load_texture(ctx, "preview", image));
        }
        self.preview_tex.clone()
    }

    fn result_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        if self.result_tex.is_none() {
            let image = self.session.result()?.image.as_ref()?;
            self.result_tex = Some(load_texture(ctx, "result", image));
        }
        self.result_tex.clone()
    }

    fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.session.current_alert().map(str::to_owned) else {
            return;
        };
        let response = egui::Modal::new(egui::Id::new("alert")).show(ctx, |ui| {
            ui.set_width(340.0);
            ui.label(message);
            ui.add_space(8.0);
            ui.button("OK").clicked()
        });
        if response.inner || response.should_close() {
            self.session.dismiss_alert();
        }
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.pump_events();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let analyze = self.tr("Analisis", "Analysis");
                let settings = self.tr("Pengaturan", "Settings");
                ui.selectable_value(&mut self.panel, Panel::Analyze, analyze);
                ui.selectable_value(&mut self.panel, Panel::Settings, settings);
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.panel {
            Panel::Analyze => self.render_analyze_panel(ui),
            Panel::Settings => self.render_settings_panel(ui),
        });

        self.render_alert(ctx);
    }
}

fn resolve_language(preference: LanguagePreference) -> Language {
    preference.resolve(sys_locale::get_locale().as_deref())
}

fn build_classifier(settings: &Settings) -> Result<Arc<dyn Classifier>> {
    let classifier = HttpClassifier::new(&settings.server_url, settings.request_timeout())
        .with_context(|| format!("cannot use server {}", settings.server_url))?;
    Ok(Arc::new(classifier))
}

fn load_texture(ctx: &egui::Context, name: &str, image: &DecodedImage) -> egui::TextureHandle {
    let size = [image.width as usize, image.height as usize];
    let color = egui::ColorImage::from_rgba_unmultiplied(size, &image.rgba);
    ctx.load_texture(name, color, egui::TextureOptions::LINEAR)
}

/// Which cached textures (preview, result) an applied event invalidates.
/// A new preview hides the result section, so the result texture only
/// survives a preview event while a result is still shown.
fn stale_textures(preview_event: bool, result_visible: bool) -> (bool, bool) {
    if preview_event {
        (true, !result_visible)
    } else {
        (false, true)
    }
}
