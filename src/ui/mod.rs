//! The main form — mode selector, language picker, text area, status line.
//!
//! All session state lives here on the UI thread. The worker reports back
//! over an mpsc channel drained once per frame; while its receiver slot is
//! occupied, activation is a no-op.

pub mod theme;

use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::worker::{self, Engines, Mode, WorkerEvent};

// ── Option tables for combo boxes ──────────────────────────────────────────

/// Language choices offered for recognition.
const LANGUAGES: &[(&str, &str)] = &[
    ("en-IN", "English (India)"),
    ("hi-IN", "Hindi"),
];

fn lookup_label(options: &'static [(&str, &str)], value: &str) -> &'static str {
    options
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, label)| *label)
        .unwrap_or("Unknown")
}

// ── App state ──────────────────────────────────────────────────────────────

pub struct App {
    mode: Mode,
    language: String,
    dark_mode: bool,
    text: String,
    status: String,
    engines: Arc<Engines>,
    /// Some while a worker is in flight; the single activation slot.
    worker_rx: Option<Receiver<WorkerEvent>>,
    theme_applied: Option<bool>,
}

impl App {
    pub fn new(cfg: &Config, engines: Arc<Engines>) -> Self {
        let mode = Mode::Speak;
        Self {
            mode,
            language: cfg.ui.language.clone(),
            dark_mode: cfg.ui.dark_mode,
            text: String::new(),
            status: mode.description().to_string(),
            engines,
            worker_rx: None,
            theme_applied: None,
        }
    }

    fn busy(&self) -> bool {
        self.worker_rx.is_some()
    }

    /// Start the action for the current mode. No-op while a worker is
    /// already in flight, so the microphone is never acquired twice.
    fn activate(&mut self) {
        if self.busy() {
            log::debug!("Ignoring activation — worker already running");
            return;
        }
        self.status = worker::STATUS_PROCESSING.to_string();
        let (tx, rx) = channel();
        worker::spawn(
            self.mode,
            self.text.clone(),
            self.language.clone(),
            self.engines.clone(),
            tx,
        );
        self.worker_rx = Some(rx);
    }

    /// Apply whatever the worker sent since the last frame.
    fn drain_worker_events(&mut self) {
        let Some(rx) = &self.worker_rx else { return };
        let mut finished = false;
        for event in rx.try_iter() {
            match event {
                WorkerEvent::Status(s) => self.status = s,
                WorkerEvent::Transcript(t) => self.text = t,
                WorkerEvent::Finished => finished = true,
            }
        }
        if finished {
            self.worker_rx = None;
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_worker_events();

        if self.theme_applied != Some(self.dark_mode) {
            ctx.set_visuals(theme::visuals(self.dark_mode));
            self.theme_applied = Some(self.dark_mode);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Text & Speech Converter");
            });
            ui.add_space(8.0);

            // Mode selector
            ui.horizontal(|ui| {
                let before = self.mode;
                ui.radio_value(&mut self.mode, Mode::Speak, "Text to speech");
                ui.radio_value(&mut self.mode, Mode::Transcribe, "Speech to text");
                if self.mode != before {
                    self.status = self.mode.description().to_string();
                }
            });

            // Language selector
            ui.horizontal(|ui| {
                ui.label("Language:");
                egui::ComboBox::from_id_salt("language")
                    .selected_text(lookup_label(LANGUAGES, &self.language))
                    .show_ui(ui, |ui| {
                        for &(code, label) in LANGUAGES {
                            ui.selectable_value(&mut self.language, code.into(), label);
                        }
                    });
            });

            ui.add_space(8.0);

            // Text area
            let text_height = (ui.available_height() - 90.0).max(120.0);
            ui.add_sized(
                [ui.available_width(), text_height],
                egui::TextEdit::multiline(&mut self.text)
                    .hint_text("Type here, or dictate in speech-to-text mode"),
            );

            ui.add_space(4.0);

            // Status line + action button
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(&self.status).italics());
                ui.add_space(6.0);
                let button = egui::Button::new(self.mode.action_label());
                if ui.add_enabled(!self.busy(), button).clicked() {
                    self.activate();
                }
            });

            // Dark mode toggle, bottom right
            ui.with_layout(egui::Layout::bottom_up(egui::Align::RIGHT), |ui| {
                ui.checkbox(&mut self.dark_mode, "Dark mode");
            });
        });

        // Poll while a worker is running so its events show up promptly.
        if self.busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

/// Open the main window and run until it is closed.
pub fn run(cfg: Config, engines: Arc<Engines>) -> anyhow::Result<()> {
    let app = App::new(&cfg, engines);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 550.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title("Text & Speech Converter"),
        ..Default::default()
    };

    eframe::run_native(
        "vaani",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("Window error: {e}"))
}
