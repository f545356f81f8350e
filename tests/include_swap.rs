//! Content swaps driven by data writes.

mod common;

use boon_partial::{IncludeDirective, TemplateItem};
use common::{mounted, partial_at, registry, root};
use serde_json::json;

fn view_instance(view: &str) -> boon_partial::Instance {
    mounted(
        root(
            json!({ "view": view }),
            registry(&[("v1", "first"), ("v2", "second"), ("v3", "third")]),
        ),
        [
            TemplateItem::text("<"),
            TemplateItem::include(IncludeDirective::bound("view")),
            TemplateItem::text(">"),
        ],
    )
}

#[test]
fn switching_value_swaps_template() {
    let mut instance = view_instance("v1");
    assert_eq!(instance.html(), "<first>");

    instance.set("view", "v2");
    assert_eq!(instance.html(), "<second>");
    assert!(!instance.html().contains("first"));
    assert!(partial_at(&instance, 1).swap_state().is_idle());

    instance.set("view", "v1");
    assert_eq!(instance.html(), "<first>");
}

#[test]
fn same_value_twice_is_a_no_op() {
    let mut instance = view_instance("v1");
    let first = partial_at(&instance, 1).first_node();
    let mutations = instance.dom().mutations();

    instance.set("view", "v1");
    instance.set("view", "v1");

    assert_eq!(partial_at(&instance, 1).first_node(), first);
    assert_eq!(instance.dom().mutations(), mutations);
    assert!(instance.runloop().is_empty());
}

#[test]
fn batched_writes_collapse_into_one_splice() {
    let mut instance = view_instance("v1");
    let mutations = instance.dom().mutations();

    instance.batch(|batch| {
        batch.set("view", "v2").set("view", "v3");
    });

    assert_eq!(instance.html(), "<third>");
    // One removal of the old text node, one splice of the buffer.
    assert_eq!(instance.dom().mutations(), mutations + 2);
}

#[test]
fn separate_writes_splice_each_time() {
    let mut instance = view_instance("v1");
    let mutations = instance.dom().mutations();

    instance.set("view", "v2");
    instance.set("view", "v3");

    assert_eq!(instance.html(), "<third>");
    assert_eq!(instance.dom().mutations(), mutations + 4);
}

#[test]
fn swap_back_within_batch_restores_content() {
    let mut instance = view_instance("v1");
    instance.batch(|batch| {
        batch.set("view", "v2").set("view", "v1");
    });
    assert_eq!(instance.html(), "<first>");
}

#[test]
fn swap_to_missing_template_empties_include() {
    let mut instance = view_instance("v1");
    instance.set("view", "absent");
    assert_eq!(instance.html(), "<>");

    instance.set("view", "v2");
    assert_eq!(instance.html(), "<second>");
}

#[test]
fn swap_inside_element_keeps_siblings_in_place() {
    let mut instance = mounted(
        root(json!({ "tab": "a" }), registry(&[("a", "A"), ("b", "B")])),
        [TemplateItem::element(
            "section",
            [
                TemplateItem::text("("),
                TemplateItem::include(IncludeDirective::bound("tab")),
                TemplateItem::text(")"),
            ],
        )],
    );
    assert_eq!(instance.html(), "<section>(A)</section>");

    instance.set("tab", "b");
    assert_eq!(instance.html(), "<section>(B)</section>");
}

#[test]
fn adjacent_includes_swap_independently() {
    let mut instance = mounted(
        root(
            json!({ "left": "a", "right": "b" }),
            registry(&[("a", "A"), ("b", "B"), ("c", "C")]),
        ),
        [
            TemplateItem::include(IncludeDirective::bound("left")),
            TemplateItem::include(IncludeDirective::bound("right")),
        ],
    );
    assert_eq!(instance.html(), "AB");

    instance.batch(|batch| {
        batch.set("left", "c").set("right", "a");
    });
    assert_eq!(instance.html(), "CA");

    instance.set("right", "c");
    assert_eq!(instance.html(), "CC");
}

#[test]
fn nested_include_swaps_inside_outer_content() {
    let mut templates = registry(&[("x", "X"), ("y", "Y")]);
    templates.register(
        "outer",
        boon_partial::Template::new([
            TemplateItem::text("("),
            TemplateItem::include(IncludeDirective::bound("inner")),
            TemplateItem::text(")"),
        ]),
    );
    let mut instance = mounted(
        root(json!({ "inner": "x" }), templates),
        [
            TemplateItem::include(IncludeDirective::named("outer")),
            TemplateItem::text("!"),
        ],
    );
    assert_eq!(instance.html(), "(X)!");

    instance.set("inner", "y");
    assert_eq!(instance.html(), "(Y)!");
    assert_eq!(instance.to_string(), "(Y)!");
}

#[test]
fn interpolations_inside_included_content_update() {
    let mut templates = registry(&[]);
    templates.register(
        "greeting",
        boon_partial::Template::new([
            TemplateItem::text("hi "),
            TemplateItem::interpolation("who"),
        ]),
    );
    let mut instance = mounted(
        root(json!({ "who": "ada" }), templates),
        [TemplateItem::include(IncludeDirective::named("greeting"))],
    );
    assert_eq!(instance.html(), "hi ada");

    instance.set("who", "grace");
    assert_eq!(instance.html(), "hi grace");
}

#[test]
fn swap_marks_every_owner_up_the_tree() {
    use boon_partial::Item;

    let mut instance = mounted(
        root(json!({ "view": "a" }), registry(&[("a", "A"), ("b", "B")])),
        [
            TemplateItem::element("p", [TemplateItem::include(IncludeDirective::bound("view"))]),
            TemplateItem::element("section", [TemplateItem::text("static")]),
        ],
    );
    let owner = |instance: &boon_partial::Instance, index: usize| match &instance.fragment().items()[index] {
        Item::Element(element) => element.fragment().is_dirty(),
        other => panic!("item {index} is not an element: {other:?}"),
    };
    assert!(!instance.fragment().is_dirty());
    assert!(!owner(&instance, 0));

    instance.set("view", "b");
    assert_eq!(instance.html(), "<p>B</p><section>static</section>");
    assert!(owner(&instance, 0));
    assert!(!owner(&instance, 1));
    assert!(instance.fragment().is_dirty());
    assert_eq!(instance.revision(), 1);
}

#[test]
fn rerender_clears_structural_marks() {
    let mut instance = view_instance("v1");
    instance.set("view", "v2");
    assert!(instance.fragment().is_dirty());

    let container = instance.dom_mut().create_root("div");
    instance.render(container);
    assert!(!instance.fragment().is_dirty());
    assert_eq!(instance.html(), "<second>");
}

#[test]
fn integral_float_equal_to_int_is_not_a_change() {
    let mut instance = mounted(
        root(json!({ "step": 1 }), registry(&[("1", "first")])),
        [TemplateItem::include(IncludeDirective::bound("step"))],
    );
    let first = partial_at(&instance, 0).first_node();
    let mutations = instance.dom().mutations();

    instance.set("step", 1.0_f64);

    assert_eq!(partial_at(&instance, 0).first_node(), first);
    assert_eq!(instance.dom().mutations(), mutations);
    assert_eq!(instance.revision(), 0);
    assert_eq!(instance.html(), "first");
}

#[test]
fn large_float_names_template_by_full_digits() {
    let mut instance = mounted(
        root(json!({ "id": 1 }), registry(&[("100000000000000000000", "big")])),
        [TemplateItem::include(IncludeDirective::bound("id"))],
    );
    instance.set("id", 1e20_f64);
    assert_eq!(instance.html(), "big");
}
