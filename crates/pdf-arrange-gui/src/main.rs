#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::anyhow;
use eframe::egui;

mod app;
mod handlers;
mod logger;
mod renderer;
mod worker;

/// Entries kept in the activity panel
const MAX_LOG_ENTRIES: usize = 500;

fn main() -> anyhow::Result<()> {
    let activity = logger::ActivityLog::new(MAX_LOG_ENTRIES);
    if let Err(e) = activity.clone().init() {
        eprintln!("Failed to install logger: {}", e);
    }

    // Worker runtime lives as long as the window
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("PDF Arrange"),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Arrange",
        options,
        Box::new(move |cc| Ok(Box::new(app::PdfArrangeApp::new(cc, handle, activity)))),
    )
    .map_err(|e| anyhow!("{e}"))?;

    drop(runtime);
    Ok(())
}
