//! Shared fixtures for the include scenario tests.
#![allow(dead_code)]

use boon_partial::{
    DataContext, Instance, Item, PartialNode, Root, Template, TemplateItem, TemplateRegistry,
    Value,
};

/// Registry with one text template per `(name, text)` pair.
pub fn registry(templates: &[(&str, &str)]) -> TemplateRegistry {
    templates
        .iter()
        .fold(TemplateRegistry::new(), |registry, (name, text)| {
            registry.with(*name, Template::text(*text))
        })
}

pub fn data(json: serde_json::Value) -> DataContext {
    let value: Value = serde_json::from_value(json).expect("fixture data must be valid");
    DataContext::new(value)
}

pub fn root(json: serde_json::Value, registry: TemplateRegistry) -> Root {
    Root::new(data(json), registry)
}

/// Instance over `items`, already mounted into a `div`.
pub fn mounted(root: Root, items: impl IntoIterator<Item = TemplateItem>) -> Instance {
    let mut instance = Instance::new(root, Template::new(items));
    instance.mount("div");
    instance
}

/// The include node at `index` among the top-level items.
pub fn partial_at(instance: &Instance, index: usize) -> &PartialNode {
    match &instance.fragment().items()[index] {
        Item::Partial(partial) => partial,
        other => panic!("item {index} is not an include: {other:?}"),
    }
}
