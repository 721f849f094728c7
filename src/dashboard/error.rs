use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleHook {
    Activated,
    Deactivated,
}

impl std::fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleHook::Activated => write!(f, "activated"),
            LifecycleHook::Deactivated => write!(f, "deactivated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("plugin name must not be empty")]
    EmptyPluginName,

    #[error("plugin `{0}` is already registered")]
    DuplicatePluginName(String),

    #[error("tab `{tab_id}` of plugin `{plugin}` is already bound to plugin `{bound_to}`")]
    DuplicateTabId {
        tab_id: String,
        plugin: String,
        bound_to: String,
    },

    #[error("tab `{tab_id}` is tagged with `{tagged}` but belongs to plugin `{plugin}`")]
    UntaggedTab {
        tab_id: String,
        plugin: String,
        tagged: String,
    },

    #[error("plugin `{0}` is not registered")]
    UnknownPlugin(String),

    #[error("plugin `{plugin}` failed in {hook}(): {message}")]
    Lifecycle {
        plugin: String,
        hook: LifecycleHook,
        message: String,
    },
}

impl DashboardError {
    pub fn lifecycle(plugin: &str, hook: LifecycleHook, err: &anyhow::Error) -> Self {
        Self::Lifecycle {
            plugin: plugin.to_string(),
            hook,
            message: format!("{:#}", err),
        }
    }
}
