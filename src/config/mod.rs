use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub dashboard: DashboardSettings,
    pub short_links: BTreeMap<String, String>,
    pub traffic_control: TrafficControlSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            dashboard: DashboardSettings::default(),
            short_links: default_short_links(),
            traffic_control: TrafficControlSettings::default(),
        }
    }
}

/// 代理服务器 dashboard websocket 端点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub dashboard_path: String,
    pub ping_interval_ms: u64,
    pub reconnect_delay_ms: u64,
    /// 等待 UI 处理的推送消息上限，超出的消息被丢弃
    pub event_queue_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8899,
            dashboard_path: "/dashboard".to_string(),
            ping_interval_ms: 2000,
            reconnect_delay_ms: 3000,
            event_queue_capacity: 4096,
        }
    }
}

impl ServerSettings {
    pub fn websocket_url(&self) -> String {
        let path = if self.dashboard_path.starts_with('/') {
            self.dashboard_path.clone()
        } else {
            format!("/{}", self.dashboard_path)
        };
        format!("ws://{}:{}{}", self.host, self.port, path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// 启动后自动激活的插件，`None` 表示等待第一次点击
    pub default_plugin: Option<String>,
    pub max_inspected_events: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            default_plugin: Some("home".to_string()),
            max_inspected_events: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficControlSettings {
    pub blocked_hosts: Vec<String>,
}

impl Default for TrafficControlSettings {
    fn default() -> Self {
        Self {
            blocked_hosts: vec!["google.com".to_string(), "www.google.com".to_string()],
        }
    }
}

pub fn default_short_links() -> BTreeMap<String, String> {
    [
        ("fb", "facebook.com"),
        ("google", "google.com"),
        ("yt", "youtube.com"),
        ("proxy", "localhost:8899"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        Ok(config_dir.join("proxy-dashboard").join("config.json"))
    }
}
