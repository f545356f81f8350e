//! Non-fatal diagnostics.
//!
//! Nothing an include does is fatal: a miss degrades to rendering nothing and
//! is reported once per distinct message.

use rustc_hash::FxHashSet;
use std::cell::RefCell;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum IncludeWarning {
    /// Neither a live binding nor a registry entry matched the name.
    #[error("Could not find template for partial \"{0}\"")]
    MissingTemplate(Arc<str>),
}

/// Deduplicating warning sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    enabled: bool,
    seen: RefCell<FxHashSet<String>>,
    emitted: RefCell<Vec<IncludeWarning>>,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Report `warning` unless the same message was already reported.
    /// Returns whether it was emitted.
    pub fn warn_once(&self, warning: IncludeWarning) -> bool {
        if !self.enabled {
            return false;
        }
        let message = warning.to_string();
        if !self.seen.borrow_mut().insert(message.clone()) {
            return false;
        }
        tracing::warn!("{message}");
        self.emitted.borrow_mut().push(warning);
        true
    }

    /// Warnings emitted so far, in order.
    pub fn emitted(&self) -> Vec<IncludeWarning> {
        self.emitted.borrow().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
