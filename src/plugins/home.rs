use anyhow::Result;
use eframe::egui;
use egui_phosphor::regular;
use egui_plot::{Line, Plot, PlotPoints};

use super::{BodyRegion, DashboardPlugin, HeaderRegion, SharedConfig, TabHandle, make_header, make_tab};
use crate::dashboard::{ServerStatus, SharedStatus};

pub struct HomePlugin {
    status: SharedStatus,
    config: SharedConfig,
}

impl HomePlugin {
    pub fn new(status: SharedStatus, config: SharedConfig) -> Self {
        Self { status, config }
    }
}

impl DashboardPlugin for HomePlugin {
    fn name(&self) -> &str {
        "home"
    }

    fn title(&self) -> &str {
        "Home"
    }

    fn initialize_tab(&self) -> TabHandle {
        make_tab(self.name(), "Home", regular::HOUSE)
    }

    fn initialize_header(&self) -> HeaderRegion {
        make_header(self.title())
    }

    fn initialize_body(&self) -> BodyRegion {
        BodyRegion::for_plugin(self.name())
    }

    fn activated(&mut self) -> Result<()> {
        Ok(())
    }

    fn deactivated(&mut self) -> Result<()> {
        Ok(())
    }

    fn show_body(&mut self, ui: &mut egui::Ui) {
        let status = self.status.borrow();
        let url = self.config.borrow().server.websocket_url();

        ui.horizontal(|ui| {
            ui.label("Proxy server:");
            ui.monospace(url);
        });

        ui.horizontal(|ui| {
            let (text, color) = match status.server() {
                ServerStatus::Success { .. } => ("reachable", egui::Color32::GREEN),
                ServerStatus::Danger => ("unreachable", egui::Color32::RED),
                ServerStatus::Unknown => ("connecting…", egui::Color32::GRAY),
            };
            ui.label("Status:");
            ui.colored_label(color, text);
            ui.small(status.summary_text());
        });

        ui.separator();

        let history = status.latency_history();
        if history.is_empty() {
            ui.label("Waiting for the first ping reply…");
            return;
        }

        let points: PlotPoints = history
            .iter()
            .enumerate()
            .map(|(i, &ms)| [i as f64, ms])
            .collect();

        Plot::new("ping_latency_plot")
            .height(120.0)
            .show_axes([false, true])
            .allow_zoom(false)
            .allow_drag(false)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new("Ping ms", points).color(egui::Color32::from_rgb(100, 150, 255)),
                );
            });
    }
}
