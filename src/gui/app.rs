use captionkit::review::{
    load_thumbnail, LoadOutcome, ReviewSession, SaveOutcome, EMPTY_CAPTION_MESSAGE,
    NO_PAIRS_MESSAGE, SAVED_MESSAGE,
};
use captionkit::utils::display_name;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const EDITOR_ID: &str = "caption_editor";

/// Settings remembered between runs
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewPrefs {
    last_directory: Option<PathBuf>,
}

impl ReviewPrefs {
    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("captionkit").join("review.json"))
    }

    fn load() -> Self {
        Self::path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default()
    }

    fn save(&self) -> anyhow::Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("No config directory available"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn show_dialog(level: rfd::MessageLevel, title: &str, description: &str) {
    let _ = rfd::MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

pub struct CaptionReviewApp {
    session: ReviewSession,
    prefs: ReviewPrefs,

    // Current pair display
    caption_text: String,
    texture: Option<egui::TextureHandle>,

    // Status line
    status_message: String,
    error_message: String,
}

impl CaptionReviewApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            session: ReviewSession::new(),
            prefs: ReviewPrefs::load(),
            caption_text: String::new(),
            texture: None,
            status_message: "Load a directory to start reviewing captions".to_string(),
            error_message: String::new(),
        }
    }

    fn pick_directory(&mut self, ctx: &egui::Context) {
        let mut dialog = rfd::FileDialog::new();
        if let Some(last) = self.prefs.last_directory.as_deref().filter(|p| p.is_dir()) {
            dialog = dialog.set_directory(last);
        }

        if let Some(path) = dialog.pick_folder() {
            self.load_directory(ctx, &path);
        }
    }

    fn load_directory(&mut self, ctx: &egui::Context, path: &Path) {
        self.error_message.clear();

        match self.session.load(path) {
            Ok(LoadOutcome::Loaded(count)) => {
                self.status_message = format!("Loaded {} captioned images from {}", count, path.display());
                self.show_current(ctx);
            }
            Ok(LoadOutcome::NoPairs) => {
                self.clear_display();
                self.status_message = NO_PAIRS_MESSAGE.to_string();
                show_dialog(rfd::MessageLevel::Warning, "No images", NO_PAIRS_MESSAGE);
            }
            Err(e) => {
                self.error_message = format!("{:#}", e);
                show_dialog(rfd::MessageLevel::Error, "Error", &self.error_message);
                return;
            }
        }

        self.prefs.last_directory = Some(path.to_path_buf());
        if let Err(e) = self.prefs.save() {
            self.error_message = format!("Failed to remember directory: {:#}", e);
        }
    }

    fn clear_display(&mut self) {
        self.caption_text.clear();
        self.texture = None;
    }

    /// Load image and caption of the current pair, discarding unsaved edits
    fn show_current(&mut self, ctx: &egui::Context) {
        self.clear_display();

        let Some(pair) = self.session.current().cloned() else {
            return;
        };

        match load_thumbnail(&pair.image_path) {
            Ok(rgba) => {
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                self.texture =
                    Some(ctx.load_texture("current_image", color_image, egui::TextureOptions::LINEAR));
            }
            Err(e) => self.error_message = format!("{:#}", e),
        }

        match self.session.read_caption() {
            Ok(Some(text)) => self.caption_text = text,
            Ok(None) => {}
            Err(e) => self.error_message = format!("{:#}", e),
        }

        self.status_message = format!(
            "{}  {}",
            self.session.position_label().unwrap_or_default(),
            display_name(&pair.image_path)
        );
    }

    fn save_current(&mut self) {
        match self.session.save_caption(&self.caption_text) {
            Ok(SaveOutcome::Saved(_)) => {
                self.caption_text = self.caption_text.trim().to_string();
                show_dialog(rfd::MessageLevel::Info, "Saved", SAVED_MESSAGE);
            }
            Ok(SaveOutcome::RejectedEmpty) => {
                show_dialog(rfd::MessageLevel::Warning, "Empty Caption", EMPTY_CAPTION_MESSAGE);
            }
            Ok(SaveOutcome::NoSelection) => {}
            Err(e) => {
                self.error_message = format!("{:#}", e);
                show_dialog(rfd::MessageLevel::Error, "Error", &self.error_message);
            }
        }
    }

    fn navigate(&mut self, ctx: &egui::Context, forward: bool) {
        let moved = if forward {
            self.session.next()
        } else {
            self.session.previous()
        };

        if moved {
            self.error_message.clear();
            self.show_current(ctx);
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let editor_focused = ctx.memory(|mem| mem.has_focus(egui::Id::new(EDITOR_ID)));
        if editor_focused {
            return;
        }

        let (up, down) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowDown),
            )
        });

        if up {
            self.navigate(ctx, false);
        } else if down {
            self.navigate(ctx, true);
        }
    }

    fn render_toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Load Directory").clicked() {
                self.pick_directory(ctx);
            }

            let has_pair = self.session.current().is_some();
            if ui.add_enabled(has_pair, egui::Button::new("Save Caption")).clicked() {
                self.save_current();
            }

            ui.separator();

            if ui.add_enabled(has_pair, egui::Button::new("Previous")).clicked() {
                self.navigate(ctx, false);
            }
            if ui.add_enabled(has_pair, egui::Button::new("Next")).clicked() {
                self.navigate(ctx, true);
            }

            if let Some(root) = self.session.root() {
                ui.separator();
                ui.label(root.display().to_string());
            }
        });
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.status_message);
            if !self.error_message.is_empty() {
                ui.colored_label(egui::Color32::RED, &self.error_message);
            }
        });
    }

    fn render_caption_editor(&mut self, ui: &mut egui::Ui) {
        ui.heading("Caption");
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.add_sized(
                ui.available_size(),
                egui::TextEdit::multiline(&mut self.caption_text)
                    .id(egui::Id::new(EDITOR_ID))
                    .desired_width(f32::INFINITY),
            );
        });
    }

    fn render_image(&self, ui: &mut egui::Ui) {
        match &self.texture {
            Some(texture) => {
                ui.centered_and_justified(|ui| {
                    ui.add(
                        egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                            .shrink_to_fit(),
                    );
                });
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label("No image loaded");
                });
            }
        }
    }
}

impl eframe::App for CaptionReviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_toolbar(ctx, ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.render_status(ui);
        });

        egui::SidePanel::right("caption_panel")
            .default_width(700.0)
            .resizable(true)
            .show(ctx, |ui| {
                self.render_caption_editor(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_image(ui);
        });
    }
}
