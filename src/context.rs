//! Trace event dispatch.
//!
//! Loading and classification surface diagnostics as trace events instead of
//! failing the engine. Every event reaches the registered listeners and is
//! mirrored to the `tracing` ecosystem at the matching level.

use parking_lot::RwLock;

/// Severity of a trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TraceLevel {
    /// Fine-grained diagnostics (tag labels, readiness transitions)
    Debug,
    /// Notable but expected events
    Info,
    /// Degraded behavior the engine recovered from
    Warn,
    /// Failures surfaced to the caller or dropped slot values
    Error,
}

/// Callback invoked for every trace event.
pub type TraceListener = Box<dyn Fn(TraceLevel, &str) + Send + Sync>;

/// Shared dispatch point for engine diagnostics.
///
/// One context is created per engine and handed to every component that can
/// produce trace events: the encoder's vocabulary loader, the resource
/// loader, the slot parser registry, and the classification workers.
#[derive(Default)]
pub struct NluContext {
    listeners: RwLock<Vec<TraceListener>>,
}

impl NluContext {
    /// Create a context with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for all future trace events.
    pub fn add_trace_listener(&self, listener: TraceListener) {
        self.listeners.write().push(listener);
    }

    /// Dispatch one trace event to the listeners and the `tracing` layer.
    pub fn trace(&self, level: TraceLevel, message: &str) {
        match level {
            TraceLevel::Debug => tracing::debug!(target: "slotwise", "{}", message),
            TraceLevel::Info => tracing::info!(target: "slotwise", "{}", message),
            TraceLevel::Warn => tracing::warn!(target: "slotwise", "{}", message),
            TraceLevel::Error => tracing::error!(target: "slotwise", "{}", message),
        }
        for listener in self.listeners.read().iter() {
            listener(level, message);
        }
    }

    /// Dispatch a debug-level event.
    pub fn trace_debug(&self, message: &str) {
        self.trace(TraceLevel::Debug, message);
    }

    /// Dispatch an info-level event.
    pub fn trace_info(&self, message: &str) {
        self.trace(TraceLevel::Info, message);
    }

    /// Dispatch a warn-level event.
    pub fn trace_warn(&self, message: &str) {
        self.trace(TraceLevel::Warn, message);
    }

    /// Dispatch an error-level event.
    pub fn trace_error(&self, message: &str) {
        self.trace(TraceLevel::Error, message);
    }
}
