//! Logger that forwards to `tracing`
//!
//! Lets an embedding binary route core logs through whatever subscriber it
//! installs (`tracing-subscriber` with an env filter, JSON, ...).

use super::traits::Logger;

/// A logger that emits `tracing` events under a fixed component name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    /// Create a tracing logger with the default component name
    pub fn new() -> Self {
        Self {
            component: "sherpa".to_string(),
        }
    }

    /// Create a tracing logger with a custom component name
    pub fn with_component(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(component = %self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(component = %self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(component = %self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(component = %self.component, "{}", message);
    }
}
