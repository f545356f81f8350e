//! Parsed template model.
//!
//! Templates are produced by the template compiler and stored in the
//! registry; a fragment instantiates one against a data context. Only the
//! item kinds a fragment needs to render are modeled here.

use std::sync::Arc;

/// An include directive: the position where another template is inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Compile-time name (`{{>foo}}` carries `foo`). Absent for purely
    /// bound includes.
    pub name: Option<Arc<str>>,
    /// Reference expression handed to the binding resolver.
    pub reference: Arc<str>,
}

impl IncludeDirective {
    /// `{{>name}}`: the identifier is both a candidate reference and a
    /// literal template name.
    pub fn named(name: impl AsRef<str>) -> Self {
        let name: Arc<str> = name.as_ref().into();
        Self {
            reference: name.clone(),
            name: Some(name),
        }
    }

    /// An include whose target is always computed from data.
    pub fn bound(reference: impl AsRef<str>) -> Self {
        Self {
            name: None,
            reference: reference.as_ref().into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateItem {
    Text(String),
    Element {
        tag: Arc<str>,
        children: Vec<TemplateItem>,
    },
    /// `{{reference}}`
    Interpolation(Arc<str>),
    Include(IncludeDirective),
    /// A named sub-template rendered in place (component boundary).
    Component {
        name: Arc<str>,
        template: Arc<Template>,
    },
}

impl TemplateItem {
    pub fn text(text: impl Into<String>) -> Self {
        TemplateItem::Text(text.into())
    }

    pub fn element(tag: impl AsRef<str>, children: impl IntoIterator<Item = TemplateItem>) -> Self {
        TemplateItem::Element {
            tag: tag.as_ref().into(),
            children: children.into_iter().collect(),
        }
    }

    pub fn interpolation(reference: impl AsRef<str>) -> Self {
        TemplateItem::Interpolation(reference.as_ref().into())
    }

    pub fn include(directive: IncludeDirective) -> Self {
        TemplateItem::Include(directive)
    }

    pub fn component(name: impl AsRef<str>, template: Template) -> Self {
        TemplateItem::Component {
            name: name.as_ref().into(),
            template: Arc::new(template),
        }
    }
}

/// A parsed template: an ordered list of items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub items: Vec<TemplateItem>,
}

impl Template {
    pub fn new(items: impl IntoIterator<Item = TemplateItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// The template that renders nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new([TemplateItem::text(text)])
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
