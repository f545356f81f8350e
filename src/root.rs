//! The reactive root: data context plus the services every node consults.

use crate::binding::{ReferenceResolver, ScopeResolver};
use crate::config::Config;
use crate::context::DataContext;
use crate::diagnostics::Diagnostics;
use crate::keypath::Keypath;
use crate::registry::TemplateLookup;
use crate::template::Template;
use std::sync::Arc;

pub struct Root {
    data: DataContext,
    registry: Box<dyn TemplateLookup>,
    resolver: Box<dyn ReferenceResolver>,
    diagnostics: Diagnostics,
    config: Config,
}

impl Root {
    pub fn new(data: DataContext, registry: impl TemplateLookup + 'static) -> Self {
        let config = Config::default();
        Self {
            data,
            registry: Box::new(registry),
            resolver: Box::new(ScopeResolver),
            diagnostics: Diagnostics::new(config.debug),
            config,
        }
    }

    pub fn with_resolver(mut self, resolver: impl ReferenceResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replaces the configuration. Resets diagnostics history.
    pub fn with_config(mut self, config: Config) -> Self {
        self.diagnostics = Diagnostics::new(config.debug);
        self.config = config;
        self
    }

    pub fn data(&self) -> &DataContext {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataContext {
        &mut self.data
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn lookup_template(&self, name: &str) -> Option<Arc<Template>> {
        let template = self.registry.lookup(name);
        tracing::debug!(name, found = template.is_some(), "template lookup");
        template
    }

    pub fn resolve(&self, base: &Keypath, reference: &str) -> Option<Keypath> {
        self.resolver.resolve(&self.data, base, reference)
    }
}

impl std::fmt::Debug for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root")
            .field("data", &self.data)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
