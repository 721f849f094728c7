pub mod home;
pub mod inspect_traffic;
pub mod settings;
pub mod short_links;
pub mod traffic_control;

use anyhow::Result;
use eframe::egui;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dashboard::SharedStatus;
use crate::stream::EventStream;

pub use home::HomePlugin;
pub use inspect_traffic::InspectTrafficPlugin;
pub use settings::SettingsPlugin;
pub use short_links::ShortLinksPlugin;
pub use traffic_control::TrafficControlPlugin;

pub type SharedConfig = Rc<RefCell<AppConfig>>;

/// 导航栏上的可点击 tab，`plugin_name` 用于把点击映射回插件
#[derive(Debug, Clone, PartialEq)]
pub struct TabHandle {
    pub id: String,
    pub plugin_name: String,
    pub label: String,
    pub icon: &'static str,
    pub selected: bool,
}

impl TabHandle {
    pub fn new(id: impl Into<String>, plugin_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugin_name: plugin_name.into(),
            label: label.into(),
            icon: "",
            selected: false,
        }
    }

    pub fn caption(&self) -> String {
        if self.icon.is_empty() {
            self.label.clone()
        } else {
            format!("{} {}", self.icon, self.label)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRegion {
    pub title: String,
}

/// 插件内容区域，初始隐藏
#[derive(Debug, Clone, PartialEq)]
pub struct BodyRegion {
    pub id: String,
    pub visible: bool,
}

impl BodyRegion {
    pub fn for_plugin(plugin_name: &str) -> Self {
        Self {
            id: format!("{}-body", plugin_name),
            visible: false,
        }
    }
}

/// Dashboard 插件契约
///
/// 每个插件在 dashboard 构建时创建一次，由协调器独占持有。
/// `activated`/`deactivated` 成对调用：`deactivated` 必须撤销对应
/// `activated` 启动的所有副作用，并且在从未激活时也可安全调用。
pub trait DashboardPlugin {
    fn name(&self) -> &str;
    fn title(&self) -> &str;
    fn initialize_tab(&self) -> TabHandle;
    fn initialize_header(&self) -> HeaderRegion;
    fn initialize_body(&self) -> BodyRegion;
    fn activated(&mut self) -> Result<()>;
    fn deactivated(&mut self) -> Result<()>;

    /// 内容区域可见时每帧调用
    fn show_body(&mut self, _ui: &mut egui::Ui) {}
}

/// 生成带插件名标记的 tab
pub fn make_tab(plugin_name: &str, label: &str, icon: &'static str) -> TabHandle {
    TabHandle {
        icon,
        ..TabHandle::new(format!("proxy-tab-{}", Uuid::new_v4()), plugin_name, label)
    }
}

pub fn make_header(title: &str) -> HeaderRegion {
    HeaderRegion {
        title: title.to_string(),
    }
}

/// 插件工厂 - 按导航栏顺序创建全部内置插件
pub struct PluginFactory;

impl PluginFactory {
    pub fn create_all(
        config: &SharedConfig,
        status: &SharedStatus,
        event_stream: Rc<dyn EventStream>,
    ) -> Vec<Box<dyn DashboardPlugin>> {
        let max_events = config.borrow().dashboard.max_inspected_events;
        vec![
            Box::new(HomePlugin::new(Rc::clone(status), Rc::clone(config))),
            Box::new(InspectTrafficPlugin::new(event_stream, max_events)),
            Box::new(ShortLinksPlugin::new(Rc::clone(config))),
            Box::new(TrafficControlPlugin::new(Rc::clone(config))),
            Box::new(SettingsPlugin::new(Rc::clone(config))),
        ]
    }
}
