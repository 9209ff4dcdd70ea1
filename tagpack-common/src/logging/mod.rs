// Logging utilities for tagpack
//
// This module provides:
// - Component-based structured logging
// - Instance name tracking through logger inheritance
// - Per-component log targets so levels can be tuned independently

use log::{debug, error, info, warn};
use std::fmt::{self, Arguments, Display, Formatter};

mod config;

pub use config::{ComponentKey, LogLevel, LoggingConfig};

/// Predefined components for logging categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Serializer,
    Registry,
    Compaction,
    Adapter,
    Facade,
    Custom(&'static str),
}

impl Component {
    /// Get the string representation of the component
    pub fn as_str(&self) -> &str {
        match self {
            Component::Serializer => "Serializer",
            Component::Registry => "Registry",
            Component::Compaction => "Compaction",
            Component::Adapter => "Adapter",
            Component::Facade => "Facade",
            Component::Custom(name) => name,
        }
    }

    /// Log target used for records emitted by this component.
    ///
    /// Targets are what `LoggingConfig` filters on, so each predefined
    /// component can be given its own level.
    pub fn target(&self) -> &str {
        match self {
            Component::Serializer => ComponentKey::Serializer.target(),
            Component::Registry => ComponentKey::Registry.target(),
            Component::Compaction => ComponentKey::Compaction.target(),
            Component::Adapter => ComponentKey::Adapter.target(),
            Component::Facade => ComponentKey::Facade.target(),
            Component::Custom(name) => name,
        }
    }
}

// Lightweight Display helper to avoid prefix String allocations
struct ComponentPrefixDisplay {
    parent: Option<Component>,
    component: Component,
}

impl Display for ComponentPrefixDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "{}.{}", parent.as_str(), self.component.as_str()),
            None => write!(f, "{}", self.component.as_str()),
        }
    }
}

/// A helper for creating component-specific loggers tagged with the owning
/// serializer instance
#[derive(Clone, Debug)]
pub struct Logger {
    /// Component this logger is for
    component: Component,
    /// Name of the serializer instance (or application) doing the logging
    instance: String,
    /// Parent component for hierarchical logging (if any)
    parent_component: Option<Component>,
}

impl Logger {
    /// Create a new root logger for a specific component and instance name
    pub fn new_root(component: Component, instance: &str) -> Self {
        Self {
            component,
            instance: instance.to_string(),
            parent_component: None,
        }
    }

    /// Create a child logger with the same instance name but a different component
    pub fn with_component(&self, component: Component) -> Self {
        Self {
            component,
            instance: self.instance.clone(),
            parent_component: Some(self.component),
        }
    }

    /// Get a reference to the instance name
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Component this logger reports as
    pub fn component(&self) -> Component {
        self.component
    }

    fn prefix(&self) -> ComponentPrefixDisplay {
        ComponentPrefixDisplay {
            parent: self.parent_component,
            component: self.component,
        }
    }

    /// Log a debug message
    pub fn debug(&self, message: impl Into<String>) {
        let target = self.component.target();
        if log::log_enabled!(target: target, log::Level::Debug) {
            debug!(target: target, "[{}][{}] {}", self.instance, self.prefix(), message.into());
        }
    }

    /// Log a debug message using fmt::Arguments (avoids allocating message String)
    pub fn debug_args(&self, args: Arguments) {
        let target = self.component.target();
        if log::log_enabled!(target: target, log::Level::Debug) {
            debug!(target: target, "[{}][{}] {}", self.instance, self.prefix(), args);
        }
    }

    /// Log an info message
    pub fn info(&self, message: impl Into<String>) {
        let target = self.component.target();
        if log::log_enabled!(target: target, log::Level::Info) {
            info!(target: target, "[{}][{}] {}", self.instance, self.prefix(), message.into());
        }
    }

    /// Log a warning message
    pub fn warn(&self, message: impl Into<String>) {
        let target = self.component.target();
        if log::log_enabled!(target: target, log::Level::Warn) {
            warn!(target: target, "[{}][{}] {}", self.instance, self.prefix(), message.into());
        }
    }

    /// Log a warning using fmt::Arguments
    pub fn warn_args(&self, args: Arguments) {
        let target = self.component.target();
        if log::log_enabled!(target: target, log::Level::Warn) {
            warn!(target: target, "[{}][{}] {}", self.instance, self.prefix(), args);
        }
    }

    /// Log an error message
    pub fn error(&self, message: impl Into<String>) {
        let target = self.component.target();
        if log::log_enabled!(target: target, log::Level::Error) {
            error!(target: target, "[{}][{}] {}", self.instance, self.prefix(), message.into());
        }
    }
}
