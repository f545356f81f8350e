//! Template registry.
//!
//! Lookup is an explicit interface injected into the root; there is no
//! process-wide template map. A registry may chain to a fallback so
//! instance-level templates shadow shared ones.

use crate::template::Template;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// `(name) -> Option<Template>` lookup used to resolve include targets.
pub trait TemplateLookup {
    fn lookup(&self, name: &str) -> Option<Arc<Template>>;
}

/// Template storage
#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    templates: FxHashMap<Arc<str>, Arc<Template>>,
    fallback: Option<Arc<TemplateRegistry>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that consults `fallback` for names it doesn't define.
    pub fn with_fallback(fallback: Arc<TemplateRegistry>) -> Self {
        Self {
            templates: FxHashMap::default(),
            fallback: Some(fallback),
        }
    }

    /// Register a template under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl AsRef<str>, template: Template) -> &mut Self {
        self.templates
            .insert(name.as_ref().into(), Arc::new(template));
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: impl AsRef<str>, template: Template) -> Self {
        self.register(name, template);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Template>> {
        self.templates.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Number of templates defined directly in this registry.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateLookup for TemplateRegistry {
    fn lookup(&self, name: &str) -> Option<Arc<Template>> {
        self.templates
            .get(name)
            .cloned()
            .or_else(|| self.fallback.as_ref()?.lookup(name))
    }
}
