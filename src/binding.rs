//! Reference bindings.
//!
//! A binding ties a reference expression written in a template to a keypath
//! in the data context. Resolution is pluggable through
//! [`ReferenceResolver`]; [`ScopeResolver`] covers plain and relative
//! references.

use crate::context::DataContext;
use crate::keypath::Keypath;
use crate::root::Root;
use crate::value::Value;
use std::sync::Arc;

/// Resolve a reference, written inside the scope `base`, to a keypath.
/// `None` means the reference does not name live data (yet).
pub trait ReferenceResolver {
    fn resolve(&self, data: &DataContext, base: &Keypath, reference: &str) -> Option<Keypath>;
}

/// Walks from the enclosing scope toward the root and binds to the first
/// scope whose data defines the reference's head segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopeResolver;

impl ReferenceResolver for ScopeResolver {
    fn resolve(&self, data: &DataContext, base: &Keypath, reference: &str) -> Option<Keypath> {
        if reference == "." || reference == "this" {
            return Some(base.clone());
        }
        if let Some(relative) = reference.strip_prefix('.') {
            return Some(base.join(relative));
        }
        let head = reference.split('.').next().filter(|h| !h.is_empty())?;
        let mut scope = Some(base.clone());
        while let Some(current) = scope {
            if data.has(&current.join(head)) {
                return Some(current.join(reference));
            }
            scope = current.parent();
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingState {
    /// The reference named no data when last tried.
    Unresolved,
    Resolved {
        keypath: Keypath,
        /// Last value delivered; `None` is "undefined".
        value: Option<Value>,
    },
    /// Torn down; never resolves or updates again.
    Unbound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    reference: Arc<str>,
    base: Keypath,
    state: BindingState,
}

impl Binding {
    /// Try to resolve `reference` within `base`. The binding starts
    /// unresolved when the resolver finds no live keypath.
    pub fn init(reference: Arc<str>, base: Keypath, root: &Root) -> Self {
        let mut binding = Self {
            reference,
            base,
            state: BindingState::Unresolved,
        };
        binding.try_resolve(root);
        binding
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn state(&self) -> &BindingState {
        &self.state
    }

    pub fn keypath(&self) -> Option<&Keypath> {
        match &self.state {
            BindingState::Resolved { keypath, .. } => Some(keypath),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.state {
            BindingState::Resolved { value, .. } => value.as_ref(),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, BindingState::Resolved { .. })
    }

    pub fn is_unbound(&self) -> bool {
        matches!(self.state, BindingState::Unbound)
    }

    /// Unresolved → resolved, once the reference names live data.
    /// The stored value stays undefined until [`record`](Self::record).
    pub fn try_resolve(&mut self, root: &Root) -> bool {
        if !matches!(self.state, BindingState::Unresolved) {
            return false;
        }
        match root.resolve(&self.base, &self.reference) {
            Some(keypath) => {
                tracing::trace!(reference = %self.reference, %keypath, "reference resolved");
                self.state = BindingState::Resolved {
                    keypath,
                    value: None,
                };
                true
            }
            None => false,
        }
    }

    /// Current data at the bound keypath.
    pub fn read(&self, root: &Root) -> Option<Value> {
        root.data().get(self.keypath()?).cloned()
    }

    /// Remember the value most recently delivered to the owner.
    pub fn record(&mut self, new_value: Option<Value>) {
        if let BindingState::Resolved { value, .. } = &mut self.state {
            *value = new_value;
        }
    }

    /// Whether a write at `changed` may alter this binding's value.
    pub fn is_affected_by(&self, changed: &Keypath) -> bool {
        self.keypath().is_some_and(|keypath| keypath.overlaps(changed))
    }

    /// Re-point the binding after data under `old` moved to `new`.
    /// Returns `true` when the bound keypath changed.
    pub fn rebind(&mut self, old: &Keypath, new: &Keypath) -> bool {
        if let Some(base) = self.base.replace_prefix(old, new) {
            self.base = base;
        }
        match &mut self.state {
            BindingState::Resolved { keypath, .. } => match keypath.replace_prefix(old, new) {
                Some(moved) if moved != *keypath => {
                    tracing::trace!(from = %keypath, to = %moved, "binding rebound");
                    *keypath = moved;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Sever the binding. Idempotent.
    pub fn unbind(&mut self) {
        self.state = BindingState::Unbound;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TemplateRegistry;

    fn root(data: serde_json::Value) -> Root {
        Root::new(
            DataContext::new(serde_json::from_value(data).unwrap()),
            TemplateRegistry::new(),
        )
    }

    #[test]
    fn resolves_through_enclosing_scopes() {
        let data = DataContext::new(
            serde_json::from_value(serde_json::json!({
                "title": "t",
                "items": [{ "label": "a" }]
            }))
            .unwrap(),
        );
        let base = Keypath::new("items.0");
        let resolver = ScopeResolver;
        assert_eq!(
            resolver.resolve(&data, &base, "label"),
            Some(Keypath::new("items.0.label"))
        );
        assert_eq!(resolver.resolve(&data, &base, "title"), Some(Keypath::new("title")));
        assert_eq!(resolver.resolve(&data, &base, "missing"), None);
        assert_eq!(resolver.resolve(&data, &base, ".x"), Some(Keypath::new("items.0.x")));
    }

    #[test]
    fn bare_identifier_without_data_stays_unresolved() {
        let root = root(serde_json::json!({}));
        let binding = Binding::init("sidebar".into(), Keypath::root(), &root);
        assert_eq!(binding.state(), &BindingState::Unresolved);
        assert_eq!(binding.read(&root), None);
    }

    #[test]
    fn rebind_moves_keypath() {
        let root = root(serde_json::json!({ "items": [{ "t": "a" }, { "t": "b" }] }));
        let mut binding = Binding::init("t".into(), Keypath::new("items.1"), &root);
        assert_eq!(binding.keypath(), Some(&Keypath::new("items.1.t")));

        assert!(binding.rebind(&"items.1".into(), &"items.0".into()));
        assert_eq!(binding.keypath(), Some(&Keypath::new("items.0.t")));
        assert_eq!(binding.read(&root), Some(Value::string("a")));
        assert!(!binding.rebind(&"other".into(), &"x".into()));
    }

    #[test]
    fn unbind_is_terminal() {
        let root = root(serde_json::json!({ "name": "x" }));
        let mut binding = Binding::init("name".into(), Keypath::root(), &root);
        binding.unbind();
        binding.unbind();
        assert!(binding.is_unbound());
        assert!(!binding.try_resolve(&root));
        assert!(!binding.is_affected_by(&"name".into()));
    }
}
