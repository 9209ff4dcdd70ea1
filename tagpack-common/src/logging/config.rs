use std::collections::BTreeMap;

use log::{LevelFilter, SetLoggerError};
use serde::{Deserialize, Serialize};

/// Log level accepted by [`LoggingConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

/// Key identifying a predefined component in a [`LoggingConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKey {
    Serializer,
    Registry,
    Compaction,
    Adapter,
    Facade,
}

impl ComponentKey {
    /// Log target shared with [`super::Component::target`]
    pub fn target(&self) -> &'static str {
        match self {
            ComponentKey::Serializer => "tagpack::serializer",
            ComponentKey::Registry => "tagpack::registry",
            ComponentKey::Compaction => "tagpack::compaction",
            ComponentKey::Adapter => "tagpack::adapter",
            ComponentKey::Facade => "tagpack::facade",
        }
    }
}

/// Logging configuration
///
/// A default level plus optional per-component overrides. `apply` installs
/// the configuration into `env_logger`; once any global logger is installed
/// it returns an error and leaves that logger in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub default_level: LogLevel,
    pub component_levels: BTreeMap<ComponentKey, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingConfig {
    /// Warn-level default, no overrides
    pub fn new() -> Self {
        Self {
            default_level: LogLevel::Warn,
            component_levels: BTreeMap::new(),
        }
    }

    pub fn default_info() -> Self {
        Self::new().with_default_level(LogLevel::Info)
    }

    pub fn with_default_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_component_level(mut self, component: ComponentKey, level: LogLevel) -> Self {
        self.component_levels.insert(component, level);
        self
    }

    /// Effective level for a component
    pub fn level_for(&self, component: ComponentKey) -> LogLevel {
        self.component_levels
            .get(&component)
            .copied()
            .unwrap_or(self.default_level)
    }

    /// Build an `env_logger` builder reflecting this configuration
    pub fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(self.default_level.to_level_filter());
        for (component, level) in &self.component_levels {
            builder.filter_module(component.target(), level.to_level_filter());
        }
        builder
    }

    /// Install the configuration as the global logger
    pub fn apply(&self) -> Result<(), SetLoggerError> {
        self.builder().try_init()
    }
}
