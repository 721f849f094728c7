use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Debug => write!(f, "DEBUG"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub module: String,
    pub message: String,
}

impl LogEntry {
    pub fn format_line(&self) -> String {
        format!(
            "[{}] [{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.module,
            self.message
        )
    }
}

/// 应用日志：转发到 `log` 门面，同时追加写入配置目录下的 dashboard.log
pub struct Logger {
    pub log_file_path: Option<PathBuf>,
    file_enabled: bool,
    min_level: LogLevel,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new() -> Self {
        let log_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("proxy-dashboard");

        if !log_dir.exists() {
            let _ = std::fs::create_dir_all(&log_dir);
        }

        Self {
            log_file_path: Some(log_dir.join("dashboard.log")),
            file_enabled: true,
            min_level: LogLevel::Info,
        }
    }

    /// 不落盘的日志实例，单元测试使用
    pub fn console_only() -> Self {
        Self {
            log_file_path: None,
            file_enabled: false,
            min_level: LogLevel::Debug,
        }
    }

    pub fn set_min_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    fn should_log(&self, level: LogLevel) -> bool {
        // Error < Warn < Info < Debug
        level <= self.min_level
    }

    pub fn log(&self, level: LogLevel, module: &str, message: &str) {
        if !self.should_log(level) {
            return;
        }

        match level {
            LogLevel::Error => log::error!("[{}] {}", module, message),
            LogLevel::Warn => log::warn!("[{}] {}", module, message),
            LogLevel::Info => log::info!("[{}] {}", module, message),
            LogLevel::Debug => log::debug!("[{}] {}", module, message),
        }

        if self.file_enabled {
            if let Some(ref log_path) = self.log_file_path {
                let entry = LogEntry {
                    timestamp: Local::now(),
                    level,
                    module: module.to_string(),
                    message: message.to_string(),
                };
                if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
                    writeln!(file, "{}", entry.format_line()).ok();
                }
            }
        }
    }

    pub fn error(&self, module: &str, message: &str) {
        self.log(LogLevel::Error, module, message);
    }

    pub fn warn(&self, module: &str, message: &str) {
        self.log(LogLevel::Warn, module, message);
    }

    pub fn info(&self, module: &str, message: &str) {
        self.log(LogLevel::Info, module, message);
    }

    pub fn debug(&self, module: &str, message: &str) {
        self.log(LogLevel::Debug, module, message);
    }
}

// 全局日志实例
use std::sync::OnceLock;
use std::sync::{Arc, Mutex};

static GLOBAL_LOGGER: OnceLock<Arc<Mutex<Logger>>> = OnceLock::new();

pub fn init_logger() -> Arc<Mutex<Logger>> {
    GLOBAL_LOGGER
        .get_or_init(|| {
            let logger = if cfg!(test) {
                Logger::console_only()
            } else {
                Logger::new()
            };
            Arc::new(Mutex::new(logger))
        })
        .clone()
}

pub fn get_logger() -> Arc<Mutex<Logger>> {
    init_logger()
}

#[macro_export]
macro_rules! app_log {
    (error, $module:expr, $($arg:tt)*) => {
        if let Ok(logger) = $crate::utils::logger::get_logger().lock() {
            logger.error($module, &format!($($arg)*));
        }
    };
    (warn, $module:expr, $($arg:tt)*) => {
        if let Ok(logger) = $crate::utils::logger::get_logger().lock() {
            logger.warn($module, &format!($($arg)*));
        }
    };
    (info, $module:expr, $($arg:tt)*) => {
        if let Ok(logger) = $crate::utils::logger::get_logger().lock() {
            logger.info($module, &format!($($arg)*));
        }
    };
    (debug, $module:expr, $($arg:tt)*) => {
        if let Ok(logger) = $crate::utils::logger::get_logger().lock() {
            logger.debug($module, &format!($($arg)*));
        }
    };
}

/// 启动时清空上一次会话的日志文件
pub fn clear_log_file() {
    if let Ok(logger) = get_logger().lock() {
        if let Some(ref log_file_path) = logger.log_file_path {
            if let Err(e) = std::fs::File::create(log_file_path) {
                log::warn!("failed to truncate {}: {}", log_file_path.display(), e);
            }
        }
    }
}
