use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use eframe::egui;

use crate::platform::Platform;
use crate::settings::Settings;

pub const EMPTY_URL_WARNING: &str = "URL cannot be empty.";

/// What the user picked in the start dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSelection {
    pub platform: Platform,
    pub url: String,
}

/// Form state of the start dialog, kept apart from egui so it can be tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartDialogState {
    pub platform: Platform,
    /// Replace the URL field with the saved URL when the platform changes.
    pub use_saved: bool,
    pub save_to_config: bool,
    pub url: String,
    warning: Option<String>,
}

impl StartDialogState {
    pub fn new(settings: &Settings) -> Self {
        let mut state = Self {
            platform: Platform::Bili,
            use_saved: true,
            save_to_config: false,
            url: String::new(),
            warning: None,
        };
        state.update_preview(settings);
        state
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn select_platform(&mut self, platform: Platform, settings: &Settings) {
        if self.platform != platform {
            self.platform = platform;
            self.update_preview(settings);
        }
    }

    /// Show the saved URL of the selected platform while `use_saved` is on.
    pub fn update_preview(&mut self, settings: &Settings) {
        if self.use_saved {
            self.url = settings
                .saved_url(self.platform)
                .unwrap_or_default()
                .to_string();
        }
    }

    /// Validate the form. Returns `None` and sets the warning when the URL is
    /// empty; otherwise saves the URL if requested and returns the selection.
    pub fn accept(
        &mut self,
        settings: &mut Settings,
        config_path: &Path,
    ) -> anyhow::Result<Option<StartSelection>> {
        let url = self.url.trim();
        if url.is_empty() {
            self.warning = Some(EMPTY_URL_WARNING.into());
            return Ok(None);
        }
        self.warning = None;

        if self.save_to_config {
            settings.set_saved_url(self.platform, url);
            settings.save(config_path)?;
            tracing::info!(platform = %self.platform, key = self.platform.url_key(), "saved live URL");
        }
        Ok(Some(StartSelection {
            platform: self.platform,
            url: url.to_string(),
        }))
    }
}

#[derive(Default)]
struct DialogOutcome {
    selection: Option<StartSelection>,
    settings: Option<Settings>,
    error: Option<anyhow::Error>,
}

struct StartDialogApp {
    state: StartDialogState,
    settings: Settings,
    config_path: PathBuf,
    outcome: Arc<Mutex<DialogOutcome>>,
}

impl StartDialogApp {
    fn finish(&mut self, ctx: &egui::Context, selection: Option<StartSelection>) {
        if let Ok(mut outcome) = self.outcome.lock() {
            outcome.selection = selection;
            outcome.settings = Some(self.settings.clone());
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

impl eframe::App for StartDialogApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let frame = egui::Frame::window(&ctx.style()).rounding(12.0);
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            let drag_strip = ui.interact(
                ui.max_rect(),
                ui.id().with("drag"),
                egui::Sense::drag(),
            );
            if drag_strip.drag_started() {
                ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
            }

            ui.heading("Choose live platform");
            ui.horizontal(|ui| {
                for platform in Platform::ALL {
                    if ui
                        .radio(self.state.platform == platform, platform.to_string())
                        .clicked()
                    {
                        self.state.select_platform(platform, &self.settings);
                    }
                }
            });
            if ui
                .checkbox(&mut self.state.use_saved, "Use the URL saved in config.json (if any)")
                .changed()
            {
                self.state.update_preview(&self.settings);
            }
            ui.checkbox(
                &mut self.state.save_to_config,
                "Save this URL to config.json",
            );
            ui.add(
                egui::TextEdit::singleline(&mut self.state.url)
                    .hint_text("Enter a live URL if not using the saved one")
                    .desired_width(f32::INFINITY),
            );
            if let Some(warning) = self.state.warning() {
                ui.colored_label(egui::Color32::YELLOW, warning);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("OK").clicked() {
                    match self.state.accept(&mut self.settings, &self.config_path) {
                        Ok(Some(selection)) => self.finish(ctx, Some(selection)),
                        Ok(None) => {}
                        Err(err) => {
                            tracing::error!(?err, "failed to save config");
                            if let Ok(mut outcome) = self.outcome.lock() {
                                outcome.error = Some(err);
                            }
                            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    }
                }
                if ui.button("Cancel").clicked() {
                    self.finish(ctx, None);
                }
            });
        });
    }
}

/// Show the start dialog and block until it closes. `Ok(None)` means the user
/// cancelled. `settings` receives any URL the user chose to save.
pub fn run_start_dialog(
    settings: &mut Settings,
    config_path: &Path,
) -> anyhow::Result<Option<StartSelection>> {
    let outcome = Arc::new(Mutex::new(DialogOutcome::default()));
    let app = StartDialogApp {
        state: StartDialogState::new(settings),
        settings: settings.clone(),
        config_path: config_path.to_path_buf(),
        outcome: Arc::clone(&outcome),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 260.0])
            .with_resizable(false)
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top(),
        centered: true,
        ..Default::default()
    };
    eframe::run_native(
        "Live overlay",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|err| anyhow!("start dialog failed: {err}"))?;

    let mut outcome = outcome
        .lock()
        .map_err(|_| anyhow!("start dialog state poisoned"))?;
    if let Some(err) = outcome.error.take() {
        return Err(err);
    }
    if let Some(updated) = outcome.settings.take() {
        *settings = updated;
    }
    Ok(outcome.selection.take())
}
