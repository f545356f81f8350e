//! Markup serialization of included content.

mod common;

use boon_partial::{IncludeDirective, Instance, Template, TemplateItem};
use common::{partial_at, registry, root};
use serde_json::json;

fn serialize(items: impl IntoIterator<Item = TemplateItem>) -> String {
    let instance = Instance::new(
        root(json!({}), registry(&[("list", "<li>1</li>\n<li>2</li>"), ("pair", "a\nb")])),
        Template::new(items),
    );
    instance.to_string()
}

#[test]
fn standalone_include_inherits_indentation() {
    let out = serialize([
        TemplateItem::text("<ul>\n  "),
        TemplateItem::include(IncludeDirective::named("list")),
        TemplateItem::text("\n</ul>"),
    ]);
    assert_eq!(out, "<ul>\n  <li>1</li>\n  <li>2</li>\n</ul>");
}

#[test]
fn whitespace_only_text_is_the_indent() {
    let out = serialize([
        TemplateItem::text("  "),
        TemplateItem::include(IncludeDirective::named("pair")),
    ]);
    assert_eq!(out, "  a\n  b");
}

#[test]
fn inline_include_is_not_reindented() {
    let out = serialize([
        TemplateItem::text("x "),
        TemplateItem::include(IncludeDirective::named("pair")),
    ]);
    assert_eq!(out, "x a\nb");
}

#[test]
fn first_item_include_is_not_reindented() {
    let out = serialize([TemplateItem::include(IncludeDirective::named("pair"))]);
    assert_eq!(out, "a\nb");
}

#[test]
fn non_text_predecessor_is_not_an_indent() {
    let out = serialize([
        TemplateItem::element("br", Vec::<TemplateItem>::new()),
        TemplateItem::include(IncludeDirective::named("pair")),
    ]);
    assert_eq!(out, "<br></br>a\nb");
}

#[test]
fn include_after_newline_is_not_reindented() {
    let out = serialize([
        TemplateItem::text("head\n"),
        TemplateItem::include(IncludeDirective::named("pair")),
    ]);
    assert_eq!(out, "head\na\nb");
}

#[test]
fn missing_template_serializes_to_nothing() {
    let out = serialize([
        TemplateItem::text("["),
        TemplateItem::include(IncludeDirective::named("ghost")),
        TemplateItem::text("]"),
    ]);
    assert_eq!(out, "[]");
}

#[test]
fn value_concatenates_included_text() {
    let instance = Instance::new(
        root(json!({ "who": "ada" }), registry(&[])),
        Template::new([
            TemplateItem::text("hi "),
            TemplateItem::interpolation("who"),
        ]),
    );
    assert_eq!(instance.fragment().value(), "hi ada");

    let mut templates = registry(&[]);
    templates.register(
        "greeting",
        Template::new([TemplateItem::text("hi "), TemplateItem::interpolation("who")]),
    );
    let instance = Instance::new(
        root(json!({ "who": "ada" }), templates),
        Template::new([TemplateItem::include(IncludeDirective::named("greeting"))]),
    );
    assert_eq!(partial_at(&instance, 0).value(), "hi ada");
}
