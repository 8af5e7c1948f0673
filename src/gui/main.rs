// GUI entry point for captionkit-review
// Browse image/caption pairs and edit the captions in place

use eframe::egui;

mod app;
use app::CaptionReviewApp;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1800.0, 1200.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Caption Editor",
        options,
        Box::new(|cc| Ok(Box::new(CaptionReviewApp::new(cc)))),
    )
}
