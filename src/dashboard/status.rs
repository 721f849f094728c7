use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::utils::current_timestamp;

const MAX_REPORTED_ERRORS: usize = 20;
const MAX_LATENCY_SAMPLES: usize = 100;

pub type SharedStatus = Rc<RefCell<StatusIndicator>>;

#[derive(Debug, Clone, PartialEq)]
pub enum ServerStatus {
    Unknown,
    Success { summary: String },
    Danger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportedError {
    pub at: String,
    pub message: String,
}

/// 全局状态指示：服务器连通性 + 插件错误
#[derive(Debug)]
pub struct StatusIndicator {
    server: ServerStatus,
    errors: VecDeque<ReportedError>,
    latency_history: VecDeque<f64>,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self {
            server: ServerStatus::Unknown,
            errors: VecDeque::with_capacity(MAX_REPORTED_ERRORS),
            latency_history: VecDeque::with_capacity(MAX_LATENCY_SAMPLES),
        }
    }
}

impl StatusIndicator {
    pub fn shared() -> SharedStatus {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn set_server_status_success(&mut self, summary: &str) {
        self.server = ServerStatus::Success {
            summary: summary.to_string(),
        };
    }

    pub fn set_server_status_danger(&mut self) {
        self.server = ServerStatus::Danger;
    }

    pub fn server(&self) -> &ServerStatus {
        &self.server
    }

    /// 状态栏里显示的摘要，danger 时为空
    pub fn summary_text(&self) -> String {
        match &self.server {
            ServerStatus::Success { summary } if !summary.is_empty() => format!("({})", summary),
            _ => String::new(),
        }
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        if self.errors.len() == MAX_REPORTED_ERRORS {
            self.errors.pop_front();
        }
        self.errors.push_back(ReportedError {
            at: current_timestamp(),
            message: message.into(),
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &ReportedError> {
        self.errors.iter()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn dismiss_errors(&mut self) {
        self.errors.clear();
    }

    pub fn record_latency(&mut self, latency_ms: f64) {
        if self.latency_history.len() == MAX_LATENCY_SAMPLES {
            self.latency_history.pop_front();
        }
        self.latency_history.push_back(latency_ms);
    }

    pub fn latency_history(&self) -> &VecDeque<f64> {
        &self.latency_history
    }
}
