use anyhow::{Result, bail};
use eframe::egui;
use egui_phosphor::regular;

use super::{BodyRegion, DashboardPlugin, HeaderRegion, SharedConfig, TabHandle, make_header, make_tab};

fn normalize_host(host: &str) -> String {
    let host = host.trim().to_lowercase();
    let host = host
        .strip_prefix("http://")
        .or_else(|| host.strip_prefix("https://"))
        .unwrap_or(&host);
    host.trim_end_matches('/').to_string()
}

pub fn add_blocked_host(hosts: &mut Vec<String>, host: &str) -> Result<()> {
    let host = normalize_host(host);
    if host.is_empty() {
        bail!("host is required");
    }
    if host.contains(|c: char| c.is_whitespace() || c == '/') {
        bail!("`{}` is not a valid host", host);
    }
    if hosts.iter().any(|h| *h == host) {
        bail!("`{}` is already blocked", host);
    }
    hosts.push(host);
    Ok(())
}

/// 与上游过滤插件一致：按 host 精确匹配
pub fn is_blocked(hosts: &[String], host: &str) -> bool {
    let host = normalize_host(host);
    hosts.iter().any(|h| *h == host)
}

pub struct TrafficControlPlugin {
    config: SharedConfig,
    new_host: String,
    probe_host: String,
    last_error: Option<String>,
}

impl TrafficControlPlugin {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            new_host: String::new(),
            probe_host: String::new(),
            last_error: None,
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.config.borrow().save() {
            crate::app_log!(error, "TrafficControl", "failed to save config: {}", e);
            self.last_error = Some(format!("save failed: {}", e));
        }
    }
}

impl DashboardPlugin for TrafficControlPlugin {
    fn name(&self) -> &str {
        "traffic_control"
    }

    fn title(&self) -> &str {
        "Traffic Control"
    }

    fn initialize_tab(&self) -> TabHandle {
        make_tab(self.name(), "Traffic Controls", regular::LOCK)
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
        self.new_host.clear();
        self.last_error = None;
        Ok(())
    }

    fn show_body(&mut self, ui: &mut egui::Ui) {
        let mut to_remove: Option<usize> = None;
        let mut to_add = false;

        ui.horizontal(|ui| {
            ui.label("Block upstream host");
            ui.text_edit_singleline(&mut self.new_host);
            if ui
                .button(egui::RichText::new(format!("{} Block", regular::PROHIBIT)))
                .clicked()
            {
                to_add = true;
            }
        });

        if let Some(error) = &self.last_error {
            ui.colored_label(egui::Color32::RED, error);
        }

        ui.separator();

        for (i, host) in self.config.borrow().traffic_control.blocked_hosts.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.monospace(host);
                if ui.small_button(regular::TRASH).clicked() {
                    to_remove = Some(i);
                }
            });
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Check host");
            ui.text_edit_singleline(&mut self.probe_host);
            if !self.probe_host.trim().is_empty() {
                if is_blocked(&self.config.borrow().traffic_control.blocked_hosts, &self.probe_host) {
                    ui.colored_label(egui::Color32::RED, "blocked");
                } else {
                    ui.colored_label(egui::Color32::GREEN, "allowed");
                }
            }
        });

        if to_add {
            let result = add_blocked_host(
                &mut self.config.borrow_mut().traffic_control.blocked_hosts,
                &self.new_host,
            );
            match result {
                Ok(()) => {
                    crate::app_log!(info, "TrafficControl", "blocked {}", self.new_host.trim());
                    self.new_host.clear();
                    self.last_error = None;
                    self.persist();
                }
                Err(e) => self.last_error = Some(e.to_string()),
            }
        }

        if let Some(index) = to_remove {
            let removed = self
                .config
                .borrow_mut()
                .traffic_control
                .blocked_hosts
                .remove(index);
            crate::app_log!(info, "TrafficControl", "unblocked {}", removed);
            self.persist();
        }
    }
}
