use anyhow::Result;
use eframe::egui;
use egui_phosphor::regular;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::{AppConfig, ServerSettings};
use crate::dashboard::{Dashboard, DashboardBuilder, ServerStatus, StatusIndicator, Transition};
use crate::plugins::{PluginFactory, SharedConfig};
use crate::stream::{DashboardSocket, EventStream, WebsocketEventStream};

/// 代理服务器控制面板
///
/// 构建顺序：配置 → tokio 运行时 → dashboard socket → 插件 → 协调器 → 默认插件。
pub struct DashboardApp {
    config: SharedConfig,
    dashboard: Dashboard,
    event_stream: Rc<WebsocketEventStream>,
    // socket 当前使用的服务器设置，设置页保存后据此判断是否需要重连
    connected_settings: ServerSettings,
    runtime: tokio::runtime::Runtime,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;

        let config = AppConfig::load().unwrap_or_else(|e| {
            crate::app_log!(warn, "App", "failed to load config, using defaults: {}", e);
            AppConfig::default()
        });
        let connected_settings = config.server.clone();
        let default_plugin = config.dashboard.default_plugin.clone();
        let config: SharedConfig = Rc::new(RefCell::new(config));

        let status = StatusIndicator::shared();
        let socket = DashboardSocket::spawn(runtime.handle(), &connected_settings);
        let event_stream = Rc::new(WebsocketEventStream::new(socket, Rc::clone(&status)));

        let mut builder = DashboardBuilder::new(Rc::clone(&status));
        let shared_stream: Rc<dyn EventStream> = event_stream.clone();
        for plugin in PluginFactory::create_all(&config, &status, shared_stream) {
            builder = builder.register(plugin)?;
        }
        let mut dashboard = builder.build();

        if let Err(e) = dashboard.activate_default(default_plugin.as_deref()) {
            crate::app_log!(warn, "App", "{}", e);
            status.borrow_mut().report_error(e.to_string());
        }

        Ok(Self {
            config,
            dashboard,
            event_stream,
            connected_settings,
            runtime,
        })
    }

    fn sync_server_settings(&mut self) {
        let current = self.config.borrow().server.clone();
        if current != self.connected_settings {
            self.event_stream.reconnect(self.runtime.handle(), &current);
            self.connected_settings = current;
        }
    }

    fn render_nav(&mut self, ui: &mut egui::Ui) {
        // 先收集点击，绘制结束后再切换
        let mut clicked: Option<String> = None;

        ui.horizontal(|ui| {
            for slot in self.dashboard.slots() {
                let tab = slot.tab();
                let response = ui
                    .selectable_label(tab.selected, tab.caption())
                    .on_hover_text(slot.header().title.as_str());
                if response.clicked() {
                    clicked = Some(tab.id.clone());
                }
            }
        });

        if let Some(tab_id) = clicked {
            if let Transition::Switched { failures, .. } = self.dashboard.click_tab(&tab_id) {
                if !failures.is_empty() {
                    log::debug!("tab switch completed with {} hook failures", failures.len());
                }
            }
        }
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        let mut dismiss = false;
        {
            let status = self.dashboard.status().borrow();
            ui.horizontal(|ui| {
                let (icon, color, text) = match status.server() {
                    ServerStatus::Success { .. } => (regular::PLUGS_CONNECTED, egui::Color32::GREEN, "Connected"),
                    ServerStatus::Danger => (regular::PLUGS, egui::Color32::RED, "Disconnected"),
                    ServerStatus::Unknown => (regular::PLUGS, egui::Color32::GRAY, "Connecting"),
                };
                ui.colored_label(color, format!("{} {}", icon, text));
                ui.small(status.summary_text());

                if status.error_count() > 0 {
                    ui.separator();
                    if let Some(latest) = status.errors().last() {
                        ui.colored_label(
                            egui::Color32::RED,
                            format!("{} [{}] {}", regular::WARNING, latest.at, latest.message),
                        );
                    }
                    if ui.small_button(format!("{} dismiss", regular::X)).clicked() {
                        dismiss = true;
                    }
                }
            });
        }
        if dismiss {
            self.dashboard.status().borrow_mut().dismiss_errors();
        }
    }

    fn render_active(&mut self, ui: &mut egui::Ui) {
        match self.dashboard.visible_mut() {
            Some((header, plugin)) => {
                ui.heading(&header.title);
                ui.separator();
                plugin.show_body(ui);
            }
            None => {
                ui.label("Select a tab to get started");
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.event_stream.pump();
        self.sync_server_settings();

        egui::TopBottomPanel::top("proxy_top_nav").show(ctx, |ui| {
            self.render_nav(ui);
        });

        egui::TopBottomPanel::bottom("proxy_server_status").show(ctx, |ui| {
            self.render_status(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_active(ui);
        });

        // socket 事件在后台到达，定期重绘以便 pump
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        if let Err(e) = self.config.borrow().save() {
            crate::app_log!(error, "App", "failed to save config: {}", e);
        }
    }
}
