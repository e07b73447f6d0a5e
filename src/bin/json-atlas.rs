//! JSON Atlas app shell
//!
//! Owns the window, the JSON input panel, and the search bar; all graph
//! behavior lives in the library's `JsonGraphWidget`.
//!
//! Usage:
//!   cargo run --bin json-atlas

use eframe::egui;
use json_atlas::JsonGraphWidget;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SAMPLE_JSON: &str = r#"{
  "fruits": [
    {"name": "apple", "color": "red"},
    {"name": "pear", "color": "green"}
  ],
  "vegetable": {"name": "carrot"},
  "count": 3
}"#;

struct JsonAtlasApp {
    widget: JsonGraphWidget,
    input: String,
    search_query: String,
    last_search: String,
}

impl JsonAtlasApp {
    fn new() -> Self {
        let mut app = Self {
            widget: JsonGraphWidget::new(),
            input: SAMPLE_JSON.to_string(),
            search_query: String::new(),
            last_search: String::new(),
        };
        // Errors surface inside the widget chrome
        let _ = app.widget.set_text(&app.input);
        app
    }

    fn render_input_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("JSON");
        egui::ScrollArea::vertical()
            .max_height(ui.available_height() - 60.0)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.input)
                        .code_editor()
                        .desired_width(f32::INFINITY)
                        .desired_rows(24),
                );
            });

        ui.horizontal(|ui| {
            if ui.button("Render").clicked() {
                match self.widget.set_text(&self.input) {
                    Ok(()) => info!("graph rendered"),
                    Err(e) => error!("parse failed: {e}"),
                }
            }
            if ui.button("Clear").clicked() {
                self.widget.clear();
            }
        });
    }

    fn render_search_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Search:");
            let response = ui.text_edit_singleline(&mut self.search_query);
            let run = (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)))
                || (response.changed() && self.search_query.is_empty());
            if run && self.search_query != self.last_search {
                self.last_search = self.search_query.clone();
                if self.search_query.is_empty() {
                    self.widget.clear_search();
                } else if let Err(e) = self.widget.search(&self.search_query) {
                    error!("search failed: {e}");
                }
            }

            let count = self.widget.match_count();
            ui.add_enabled_ui(count > 0, |ui| {
                if ui.button("◀").clicked() {
                    self.widget.prev_match();
                }
                if ui.button("▶").clicked() {
                    self.widget.next_match();
                }
            });
            if count > 0 {
                ui.label(format!(
                    "{}/{count}",
                    self.widget.current_match_index() + 1
                ));
            }

            ui.separator();
            if ui.button("Fit").clicked() {
                let rect = ui.ctx().screen_rect();
                self.widget.fit_to_content(rect);
            }
        });
    }
}

impl eframe::App for JsonAtlasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.render_search_bar(ui);
        });

        egui::SidePanel::left("input_panel")
            .min_width(260.0)
            .default_width(360.0)
            .resizable(true)
            .show(ctx, |ui| {
                self.render_input_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.widget.ui(ui);
        });
    }
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("json_atlas=info")),
        )
        .with_target(false)
        .init();

    info!("starting JSON Atlas");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("JSON Atlas")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "JSON Atlas",
        native_options,
        Box::new(|cc| {
            cc.egui_ctx.set_theme(egui::Theme::Dark);
            Ok(Box::new(JsonAtlasApp::new()))
        }),
    )
}
