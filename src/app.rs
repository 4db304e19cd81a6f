use eframe::egui;

use crate::data::service::{DataService, LocalDataService};
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PlotDeckApp {
    pub state: AppState,
    service: LocalDataService,
}

impl Default for PlotDeckApp {
    fn default() -> Self {
        let service = LocalDataService::default();
        let mut state = AppState::default();
        match service.list_templates() {
            Ok(templates) => state.templates = templates,
            Err(e) => log::warn!("Failed to load templates: {e}"),
        }
        Self { state, service }
    }
}

impl eframe::App for PlotDeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_screenshots(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, &mut self.service);
        });

        // ---- Left side panel: suggestions, filters, configuration ----
        egui::SidePanel::left("config_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot tabs + chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            self.tab_strip(ui);
            plot::plot_panel(ui, &self.state.compiled);
        });
    }
}

impl PlotDeckApp {
    fn tab_strip(&mut self, ui: &mut egui::Ui) {
        if self.state.dataset.is_none() {
            return;
        }
        let mut activate = None;
        let mut add = false;
        ui.horizontal(|ui| {
            for tab in &self.state.tabs {
                let active = self.state.active_tab == Some(tab.id);
                if ui.selectable_label(active, &tab.name).clicked() && !active {
                    activate = Some(tab.id);
                }
            }
            if ui.button("+").clicked() {
                add = true;
            }
        });
        ui.separator();

        if let Some(id) = activate {
            self.state.activate_tab(id);
        }
        if add {
            self.state.add_tab(None);
        }
    }

    /// Save a requested viewport screenshot as a PNG export of the plot.
    fn handle_screenshots(&mut self, ctx: &egui::Context) {
        let image = ctx.input(|i| {
            i.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(image) = image else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .set_title("Export plot image")
            .set_file_name("plot_export.png")
            .add_filter("PNG", &["png"])
            .save_file()
        else {
            return;
        };

        let [w, h] = image.size;
        match image::save_buffer(
            &path,
            image.as_raw(),
            w as u32,
            h as u32,
            image::ExtendedColorType::Rgba8,
        ) {
            Ok(()) => {
                log::info!("Exported plot image to {}", path.display());
                self.state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export image: {e}");
                self.state.status_message = Some(format!("Export failed: {e}"));
            }
        }
    }
}
