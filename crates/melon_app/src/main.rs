mod app;
mod paths;

use app::UiApp;
use eframe::{NativeOptions, egui};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("MelonCheck")
            .with_inner_size([760.0, 720.0]),
        ..Default::default()
    };
    if let Err(e) = eframe::run_native(
        "MelonCheck",
        options,
        Box::new(|cc| {
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(UiApp::new(&cc.egui_ctx)))
        }),
    ) {
        eprintln!("Aplikasi berhenti dengan error: {e}");
    }
}
