use anyhow::{Result, bail};
use eframe::egui;
use egui_phosphor::regular;
use std::collections::BTreeMap;

use super::{BodyRegion, DashboardPlugin, HeaderRegion, SharedConfig, TabHandle, make_header, make_tab};

/// 校验并加入一条短链接，名称只能是单个 host 段
pub fn add_short_link(links: &mut BTreeMap<String, String>, name: &str, target: &str) -> Result<()> {
    let name = name.trim().to_lowercase();
    let target = target.trim();

    if name.is_empty() || target.is_empty() {
        bail!("short link name and target are required");
    }
    if name.contains(|c: char| c.is_whitespace() || c == '/' || c == ':' || c == '.') {
        bail!("`{}` is not a valid short link name", name);
    }
    if links.contains_key(&name) {
        bail!("short link `{}` already exists", name);
    }

    links.insert(name, target.to_string());
    Ok(())
}

pub struct ShortLinksPlugin {
    config: SharedConfig,
    new_name: String,
    new_target: String,
    last_error: Option<String>,
}

impl ShortLinksPlugin {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            new_name: String::new(),
            new_target: String::new(),
            last_error: None,
        }
    }

    fn reset_draft(&mut self) {
        self.new_name.clear();
        self.new_target.clear();
        self.last_error = None;
    }

    fn persist(&mut self) {
        if let Err(e) = self.config.borrow().save() {
            crate::app_log!(error, "ShortLinks", "failed to save config: {}", e);
            self.last_error = Some(format!("save failed: {}", e));
        }
    }
}

impl DashboardPlugin for ShortLinksPlugin {
    fn name(&self) -> &str {
        "short_links"
    }

    fn title(&self) -> &str {
        "Short Links"
    }

    fn initialize_tab(&self) -> TabHandle {
        make_tab(self.name(), "Short Links", regular::LIGHTNING)
    }

    fn initialize_header(&self) -> HeaderRegion {
        make_header(self.title())
    }

    fn initialize_body(&self) -> BodyRegion {
        BodyRegion::for_plugin(self.name())
    }

    fn activated(&mut self) -> Result<()> {
        self.reset_draft();
        Ok(())
    }

    fn deactivated(&mut self) -> Result<()> {
        self.reset_draft();
        Ok(())
    }

    fn show_body(&mut self, ui: &mut egui::Ui) {
        let mut to_remove: Option<String> = None;
        let mut to_add = false;

        ui.horizontal(|ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut self.new_name);
            ui.label("Target");
            ui.text_edit_singleline(&mut self.new_target);
            if ui
                .button(egui::RichText::new(format!("{} Add", regular::PLUS)))
                .clicked()
            {
                to_add = true;
            }
        });

        if let Some(error) = &self.last_error {
            ui.colored_label(egui::Color32::RED, error);
        }

        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (name, target) in self.config.borrow().short_links.iter() {
                ui.horizontal(|ui| {
                    ui.monospace(format!("http://{}/", name));
                    ui.label(regular::ARROW_RIGHT);
                    ui.monospace(format!("http://{}/", target));
                    if ui.small_button(regular::TRASH).clicked() {
                        to_remove = Some(name.clone());
                    }
                });
            }
        });

        if to_add {
            let result = add_short_link(
                &mut self.config.borrow_mut().short_links,
                &self.new_name,
                &self.new_target,
            );
            match result {
                Ok(()) => {
                    crate::app_log!(info, "ShortLinks", "added short link {}", self.new_name.trim());
                    self.reset_draft();
                    self.persist();
                }
                Err(e) => self.last_error = Some(e.to_string()),
            }
        }

        if let Some(name) = to_remove {
            self.config.borrow_mut().short_links.remove(&name);
            crate::app_log!(info, "ShortLinks", "removed short link {}", name);
            self.persist();
        }
    }
}
