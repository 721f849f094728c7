//! Dashboard 协调器
//!
//! 持有全部插件、tab 到插件的绑定以及唯一的"当前激活插件"槽位。
//! 构建顺序固定：先 [`DashboardBuilder::register`] 所有插件，再
//! [`DashboardBuilder::build`] 建立绑定，最后由调用方决定是否
//! [`Dashboard::activate_default`]。

pub mod error;
pub mod status;

use std::collections::HashMap;

use crate::plugins::{BodyRegion, DashboardPlugin, HeaderRegion, TabHandle};

pub use error::{DashboardError, LifecycleHook};
pub use status::{ServerStatus, SharedStatus, StatusIndicator};

/// 单个插件及其可视区域
pub struct PluginSlot {
    plugin: Box<dyn DashboardPlugin>,
    tab: TabHandle,
    header: HeaderRegion,
    body: BodyRegion,
}

impl PluginSlot {
    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn tab(&self) -> &TabHandle {
        &self.tab
    }

    pub fn header(&self) -> &HeaderRegion {
        &self.header
    }

    pub fn body(&self) -> &BodyRegion {
        &self.body
    }
}

/// 一次 tab 点击的结果
#[derive(Debug, PartialEq)]
pub enum Transition {
    /// tab 标识无法解析，不做任何事
    Ignored,
    /// 点击的是已激活的 tab
    AlreadyActive,
    Switched {
        from: Option<String>,
        to: String,
        /// 生命周期钩子失败，切换仍然完成
        failures: Vec<DashboardError>,
    },
}

pub struct DashboardBuilder {
    slots: Vec<PluginSlot>,
    status: SharedStatus,
}

impl DashboardBuilder {
    pub fn new(status: SharedStatus) -> Self {
        Self {
            slots: Vec::new(),
            status,
        }
    }

    /// 注册插件并生成它的 tab/header/body；名称或 tab 标识冲突直接拒绝
    pub fn register(mut self, plugin: Box<dyn DashboardPlugin>) -> Result<Self, DashboardError> {
        let name = plugin.name().to_string();
        if name.is_empty() {
            return Err(DashboardError::EmptyPluginName);
        }
        if self.slots.iter().any(|slot| slot.name() == name) {
            return Err(DashboardError::DuplicatePluginName(name));
        }

        let mut tab = plugin.initialize_tab();
        if tab.plugin_name != name {
            return Err(DashboardError::UntaggedTab {
                tab_id: tab.id,
                plugin: name,
                tagged: tab.plugin_name,
            });
        }
        if let Some(existing) = self.slots.iter().find(|slot| slot.tab.id == tab.id) {
            return Err(DashboardError::DuplicateTabId {
                tab_id: tab.id,
                plugin: name,
                bound_to: existing.name().to_string(),
            });
        }
        tab.selected = false;

        let header = plugin.initialize_header();
        let mut body = plugin.initialize_body();
        body.visible = false;

        crate::app_log!(debug, "Dashboard", "registered plugin {} (tab {})", name, tab.id);
        self.slots.push(PluginSlot {
            plugin,
            tab,
            header,
            body,
        });
        Ok(self)
    }

    pub fn build(self) -> Dashboard {
        let bindings: HashMap<String, String> = self
            .slots
            .iter()
            .map(|slot| (slot.tab.id.clone(), slot.name().to_string()))
            .collect();
        let positions: HashMap<String, usize> = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.name().to_string(), i))
            .collect();

        crate::app_log!(info, "Dashboard", "dashboard ready with {} plugins", self.slots.len());
        Dashboard {
            slots: self.slots,
            bindings,
            positions,
            active: None,
            status: self.status,
        }
    }
}

pub struct Dashboard {
    slots: Vec<PluginSlot>,
    bindings: HashMap<String, String>,
    positions: HashMap<String, usize>,
    active: Option<String>,
    status: SharedStatus,
}

impl Dashboard {
    pub fn slots(&self) -> &[PluginSlot] {
        &self.slots
    }

    pub fn active_plugin(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.as_deref() == Some(name)
    }

    pub fn plugin_for_tab(&self, tab_id: &str) -> Option<&str> {
        self.bindings.get(tab_id).map(String::as_str)
    }

    pub fn status(&self) -> &SharedStatus {
        &self.status
    }

    /// 当前可见的插件（header + 插件本身），用于绘制内容区
    pub fn visible_mut(&mut self) -> Option<(&HeaderRegion, &mut (dyn DashboardPlugin + 'static))> {
        self.slots
            .iter_mut()
            .find(|slot| slot.body.visible)
            .map(|slot| (&slot.header, slot.plugin.as_mut()))
    }

    /// tab 点击入口
    pub fn click_tab(&mut self, tab_id: &str) -> Transition {
        let Some(target) = self
            .plugin_for_tab(tab_id)
            .and_then(|name| self.positions.get(name))
            .copied()
        else {
            crate::app_log!(debug, "Dashboard", "ignoring click on unbound tab {}", tab_id);
            return Transition::Ignored;
        };
        self.switch_to(target)
    }

    /// 按插件名激活，启动时的默认插件走这里
    pub fn activate(&mut self, name: &str) -> Result<Transition, DashboardError> {
        let target = self
            .positions
            .get(name)
            .copied()
            .ok_or_else(|| DashboardError::UnknownPlugin(name.to_string()))?;
        Ok(self.switch_to(target))
    }

    pub fn activate_default(&mut self, default_plugin: Option<&str>) -> Result<Transition, DashboardError> {
        match default_plugin {
            Some(name) => self.activate(name),
            None => Ok(Transition::Ignored),
        }
    }

    fn switch_to(&mut self, target: usize) -> Transition {
        let target_name = self.slots[target].name().to_string();
        if self.is_active(&target_name) {
            return Transition::AlreadyActive;
        }

        let mut failures = Vec::new();

        // 先完整停用旧插件，再碰新插件的任何状态
        let from = self.active.take();
        if let Some(previous) = from.as_deref() {
            if let Some(&index) = self.positions.get(previous) {
                let slot = &mut self.slots[index];
                if let Err(e) = slot.plugin.deactivated() {
                    failures.push(DashboardError::lifecycle(previous, LifecycleHook::Deactivated, &e));
                }
                slot.body.visible = false;
                slot.tab.selected = false;
            }
        }

        let slot = &mut self.slots[target];
        slot.tab.selected = true;
        slot.body.visible = true;
        self.active = Some(target_name.clone());
        if let Err(e) = slot.plugin.activated() {
            failures.push(DashboardError::lifecycle(&target_name, LifecycleHook::Activated, &e));
        }

        for failure in &failures {
            crate::app_log!(error, "Dashboard", "{}", failure);
            self.status.borrow_mut().report_error(failure.to_string());
        }

        crate::app_log!(
            info,
            "Dashboard",
            "switched {} -> {}",
            from.as_deref().unwrap_or("<none>"),
            target_name
        );
        Transition::Switched {
            from,
            to: target_name,
            failures,
        }
    }
}
