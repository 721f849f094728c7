use anyhow::{Result, bail};
use eframe::egui;
use egui_phosphor::regular;

use super::{BodyRegion, DashboardPlugin, HeaderRegion, SharedConfig, TabHandle, make_header, make_tab};
use crate::config::ServerSettings;

const MIN_INTERVAL_MS: u64 = 100;
const MIN_EVENT_QUEUE: usize = 64;

pub fn validate_server_settings(settings: &ServerSettings) -> Result<()> {
    if settings.host.trim().is_empty() {
        bail!("host is required");
    }
    if settings.port == 0 {
        bail!("port must be between 1 and 65535");
    }
    if settings.ping_interval_ms < MIN_INTERVAL_MS || settings.reconnect_delay_ms < MIN_INTERVAL_MS {
        bail!("intervals must be at least {} ms", MIN_INTERVAL_MS);
    }
    if settings.event_queue_capacity < MIN_EVENT_QUEUE {
        bail!("event queue must hold at least {} messages", MIN_EVENT_QUEUE);
    }
    Ok(())
}

/// 设置页：激活时拷贝一份草稿，保存才写回共享配置
pub struct SettingsPlugin {
    config: SharedConfig,
    draft: Option<ServerSettings>,
    message: Option<(bool, String)>,
}

impl SettingsPlugin {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            draft: None,
            message: None,
        }
    }

    fn apply_draft(&mut self) -> Result<()> {
        let Some(draft) = self.draft.as_ref() else {
            return Ok(());
        };
        validate_server_settings(draft)?;

        let mut draft = draft.clone();
        draft.host = draft.host.trim().to_string();
        self.config.borrow_mut().server = draft;
        Ok(())
    }
}

impl DashboardPlugin for SettingsPlugin {
    fn name(&self) -> &str {
        "settings"
    }

    fn title(&self) -> &str {
        "Settings"
    }

    fn initialize_tab(&self) -> TabHandle {
        make_tab(self.name(), "Settings", regular::GEAR)
    }

    fn initialize_header(&self) -> HeaderRegion {
        make_header(self.title())
    }

    fn initialize_body(&self) -> BodyRegion {
        BodyRegion::for_plugin(self.name())
    }

    fn activated(&mut self) -> Result<()> {
        self.draft = Some(self.config.borrow().server.clone());
        self.message = None;
        Ok(())
    }

    fn deactivated(&mut self) -> Result<()> {
        self.draft = None;
        self.message = None;
        Ok(())
    }

    fn show_body(&mut self, ui: &mut egui::Ui) {
        let Some(draft) = self.draft.as_mut() else {
            return;
        };

        egui::Grid::new("server_settings_grid")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.label("Host");
                ui.text_edit_singleline(&mut draft.host);
                ui.end_row();

                ui.label("Port");
                ui.add(egui::DragValue::new(&mut draft.port).range(1..=65535));
                ui.end_row();

                ui.label("Dashboard path");
                ui.text_edit_singleline(&mut draft.dashboard_path);
                ui.end_row();

                ui.label("Ping interval (ms)");
                ui.add(egui::DragValue::new(&mut draft.ping_interval_ms).range(MIN_INTERVAL_MS..=60_000));
                ui.end_row();

                ui.label("Reconnect delay (ms)");
                ui.add(egui::DragValue::new(&mut draft.reconnect_delay_ms).range(MIN_INTERVAL_MS..=60_000));
                ui.end_row();

                ui.label("Event queue");
                ui.add(egui::DragValue::new(&mut draft.event_queue_capacity).range(MIN_EVENT_QUEUE..=100_000));
                ui.end_row();
            });

        ui.separator();

        let mut save = false;
        let mut revert = false;
        ui.horizontal(|ui| {
            if ui
                .button(egui::RichText::new(format!("{} Save", regular::FLOPPY_DISK)))
                .clicked()
            {
                save = true;
            }
            if ui
                .button(egui::RichText::new(format!("{} Revert", regular::ARROW_COUNTER_CLOCKWISE)))
                .clicked()
            {
                revert = true;
            }
        });

        if save {
            self.message = Some(match self.apply_draft().and_then(|_| self.config.borrow().save()) {
                Ok(()) => {
                    crate::app_log!(info, "Settings", "server settings saved");
                    (true, "Saved".to_string())
                }
                Err(e) => {
                    crate::app_log!(warn, "Settings", "failed to save settings: {}", e);
                    (false, e.to_string())
                }
            });
        }
        if revert {
            self.draft = Some(self.config.borrow().server.clone());
            self.message = None;
        }

        if let Some((ok, text)) = &self.message {
            let color = if *ok { egui::Color32::GREEN } else { egui::Color32::RED };
            ui.colored_label(color, text);
        }
    }
}
