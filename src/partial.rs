//! Dynamic include node.
//!
//! Inserts another template at its position. The target is either a fixed
//! template name (named mode) or the string form of a bound data value
//! (bound mode), re-evaluated whenever that value changes. A change never
//! touches the live tree directly: the node swaps its fragment, returns a
//! [`PendingUpdate`] and performs the tree surgery when flushed.
//!
//! ```text
//!   set_template        flush: teardown outgoing,        flush: splice
//!  ─────────────▶ Pending ──── render incoming ─────▶ Buffered ─────────▶ Idle
//! ```

use crate::binding::Binding;
use crate::diagnostics::IncludeWarning;
use crate::dom::{Dom, NodeId};
use crate::fragment::{ComponentItem, Fragment, FragmentOptions, FragmentOwner, Item};
use crate::indent;
use crate::keypath::Keypath;
use crate::root::Root;
use crate::runloop::{PartialId, PendingUpdate};
use crate::template::{IncludeDirective, Template};
use crate::value::Value;
use std::sync::Arc;

/// How the include target is resolved. The only transition is
/// `Bound` → `Named`.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Target computed from data; tracks the bound value.
    Bound(Binding),
    /// Fixed template name. Never re-resolves.
    Named(Arc<str>),
}

/// Fragment swap progress.
#[derive(Debug, Default)]
pub enum SwapState {
    /// Active content is where the owner expects it.
    #[default]
    Idle,
    /// The active fragment still has to be rendered into the buffer;
    /// `outgoing` is the previously rendered fragment awaiting teardown.
    Pending { outgoing: Option<Fragment> },
    /// The active fragment sits in the buffer, not yet spliced.
    Buffered,
}

impl SwapState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SwapState::Idle)
    }
}

/// Where a flush splices the buffer: before `anchor` inside `parent`,
/// or at the end of `parent` when there is no anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveTarget {
    pub parent: NodeId,
    pub anchor: Option<NodeId>,
}

/// Outcome of a bound value change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ValueChange {
    /// Structure changed; the owner must mark itself dirty.
    pub bubble: bool,
    /// Present while rendered: the caller must queue it with the runloop.
    pub pending: Option<PendingUpdate>,
}

#[derive(Debug)]
pub struct PartialNode {
    id: PartialId,
    /// Position among the owning fragment's items.
    index: usize,
    name: Option<Arc<str>>,
    base: Keypath,
    resolution: Resolution,
    fragment: Fragment,
    swap: SwapState,
    buffer: Option<NodeId>,
    rendered: bool,
}

impl PartialNode {
    /// Resolve `directive` synchronously and instantiate the first fragment.
    ///
    /// A reference that names live data puts the node in bound mode. One that
    /// doesn't is read as a literal template name: found, the node becomes
    /// named for good; not found, it stays empty and a warning is emitted.
    pub fn new(index: usize, directive: &IncludeDirective, base: Keypath, root: &Root) -> Self {
        let id = PartialId::new();
        let binding = Binding::init(directive.reference.clone(), base.clone(), root);
        let mut node = Self {
            id,
            index,
            name: directive.name.clone(),
            fragment: Fragment::empty(FragmentOwner::Partial(id), base.clone()),
            base,
            resolution: Resolution::Bound(binding),
            swap: SwapState::Pending { outgoing: None },
            buffer: None,
            rendered: false,
        };

        let resolved = match &node.resolution {
            Resolution::Bound(binding) if binding.is_resolved() => Some(binding.read(root)),
            _ => None,
        };
        if let Some(value) = resolved {
            // Not rendered yet, so there is nothing to enqueue.
            let _ = node.set_value(value, root);
            return node;
        }

        match node.name.clone() {
            Some(name) => match root.lookup_template(&name) {
                Some(template) => {
                    node.become_named(name);
                    node.set_template(template, root);
                }
                None => {
                    root.diagnostics()
                        .warn_once(IncludeWarning::MissingTemplate(name));
                }
            },
            None => {
                root.diagnostics().warn_once(IncludeWarning::MissingTemplate(
                    directive.reference.clone(),
                ));
            }
        }
        node
    }

    pub fn id(&self) -> PartialId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Literal name from the directive.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn is_named(&self) -> bool {
        matches!(self.resolution, Resolution::Named(_))
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn swap_state(&self) -> &SwapState {
        &self.swap
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub(crate) fn fragment_mut(&mut self) -> &mut Fragment {
        &mut self.fragment
    }

    pub fn buffer(&self) -> Option<NodeId> {
        self.buffer
    }

    /// The name this include currently stands for.
    pub fn partial_name(&self) -> String {
        match &self.resolution {
            Resolution::Named(name) => name.to_string(),
            Resolution::Bound(binding) => match binding.value() {
                Some(value) => value.to_name(),
                None => self
                    .name
                    .as_deref()
                    .unwrap_or(binding.reference())
                    .to_string(),
            },
        }
    }

    fn become_named(&mut self, name: Arc<str>) {
        if let Resolution::Bound(binding) = &mut self.resolution {
            binding.unbind();
        }
        tracing::debug!(partial = %self.id, %name, "include switched to named mode");
        self.resolution = Resolution::Named(name);
    }

    /// Bound value changed.
    ///
    /// The value's string form is looked up first; only if that misses and
    /// the literal name resolves does the node fall back to named mode. A
    /// total miss renders nothing.
    pub fn set_value(&mut self, value: Option<Value>, root: &Root) -> ValueChange {
        let Resolution::Bound(binding) = &self.resolution else {
            return ValueChange::default();
        };
        if value
            .as_ref()
            .zip(binding.value())
            .is_some_and(|(next, current)| next.same_as(current))
        {
            return ValueChange::default();
        }

        let mut template = value
            .as_ref()
            .and_then(|value| root.lookup_template(&value.to_name()));

        if template.is_none() {
            if let Some(name) = self.name.clone() {
                if let Some(named) = root.lookup_template(&name) {
                    self.become_named(name);
                    template = Some(named);
                }
            }
        }

        if template.is_none() {
            let missing = self
                .name
                .clone()
                .or_else(|| value.as_ref().map(|value| value.to_name().into()))
                .unwrap_or_else(|| self.reference().into());
            root.diagnostics()
                .warn_once(IncludeWarning::MissingTemplate(missing));
        }

        if let Resolution::Bound(binding) = &mut self.resolution {
            binding.record(value);
        }

        self.set_template(
            template.unwrap_or_else(|| Arc::new(Template::empty())),
            root,
        );

        ValueChange {
            bubble: true,
            pending: self.rendered.then_some(PendingUpdate { node: self.id }),
        }
    }

    fn reference(&self) -> &str {
        match &self.resolution {
            Resolution::Bound(binding) => binding.reference(),
            Resolution::Named(name) => name,
        }
    }

    /// Replace the active fragment. Teardown of the old one and insertion of
    /// the new one wait for the next flush; its bindings are cut right away.
    pub fn set_template(&mut self, template: Arc<Template>, root: &Root) {
        let incoming = Fragment::new(
            FragmentOptions {
                template,
                base: self.base.clone(),
                owner: FragmentOwner::Partial(self.id),
            },
            root,
        );
        let mut previous = std::mem::replace(&mut self.fragment, incoming);
        previous.unbind();

        self.swap = match std::mem::take(&mut self.swap) {
            // The previous fragment never made it into the buffer; the one
            // that did is still queued for teardown.
            SwapState::Pending {
                outgoing: Some(earlier),
            } => SwapState::Pending {
                outgoing: Some(earlier),
            },
            _ if previous.is_rendered() => SwapState::Pending {
                outgoing: Some(previous),
            },
            _ => SwapState::Pending { outgoing: None },
        };
        tracing::trace!(partial = %self.id, "fragment swap pending");
    }

    /// Render into a fresh buffer and hand it to the owner, which inserts it.
    pub fn render(&mut self, dom: &mut Dom, root: &Root) -> NodeId {
        if let Some(old) = self.buffer.take() {
            dom.remove(old);
        }
        let buffer = dom.create_buffer();
        self.buffer = Some(buffer);
        if self.swap.is_idle() && !self.fragment.is_rendered() {
            self.swap = SwapState::Pending { outgoing: None };
        }
        self.flush(dom, root, None);
        self.rendered = true;
        // Whatever sits in the buffer now is the owner's to place.
        self.swap = SwapState::Idle;
        buffer
    }

    /// Reconcile a pending swap: tear down the outgoing fragment, render the
    /// incoming one into the buffer, then splice the buffer into `target`
    /// when the node is rendered. Always leaves the node idle when it is
    /// rendered and a target is given. Returns whether the live tree changed.
    pub fn flush(&mut self, dom: &mut Dom, root: &Root, target: Option<LiveTarget>) -> bool {
        if let SwapState::Pending { outgoing } = std::mem::take(&mut self.swap) {
            if let Some(mut outgoing) = outgoing {
                outgoing.unrender(dom, true);
                tracing::trace!(partial = %self.id, "outgoing fragment torn down");
            }
            let buffer = match self.buffer {
                Some(buffer) if dom.is_valid(buffer) => buffer,
                _ => {
                    let buffer = dom.create_buffer();
                    self.buffer = Some(buffer);
                    buffer
                }
            };
            let rendered = self.fragment.render(dom, root);
            dom.append_child(buffer, rendered);
            dom.remove(rendered);
            self.swap = SwapState::Buffered;
        }

        let mut spliced = false;
        if self.rendered && matches!(self.swap, SwapState::Buffered) {
            if let (Some(target), Some(buffer)) = (target, self.buffer) {
                spliced = dom.insert_before(target.parent, buffer, target.anchor);
                self.swap = SwapState::Idle;
                tracing::trace!(partial = %self.id, "buffer spliced into live tree");
            }
        }
        debug_assert!(
            !(self.rendered && target.is_some()) || self.swap.is_idle(),
            "flush must drain the swap state"
        );
        spliced
    }

    /// Tear down rendered content. A second call is a no-op.
    pub fn unrender(&mut self, dom: &mut Dom, destroy: bool) {
        if !self.rendered {
            return;
        }
        if let SwapState::Pending {
            outgoing: Some(mut outgoing),
        } = std::mem::take(&mut self.swap)
        {
            outgoing.unrender(dom, destroy);
        }
        self.fragment.unrender(dom, destroy);
        if let Some(buffer) = self.buffer.take() {
            dom.remove(buffer);
        }
        // Rendering again has to start from the active fragment.
        self.swap = SwapState::Pending { outgoing: None };
        self.rendered = false;
    }

    /// Follow data that moved from `old` to `new`. Named nodes only forward
    /// to their content; they have no binding of their own.
    pub fn rebind(
        &mut self,
        old: &Keypath,
        new: &Keypath,
        dom: &mut Dom,
        root: &Root,
        pending: &mut Vec<PendingUpdate>,
    ) -> bool {
        if let Some(base) = self.base.replace_prefix(old, new) {
            self.base = base;
        }
        let moved = match &mut self.resolution {
            Resolution::Bound(binding) => binding.rebind(old, new).then(|| binding.read(root)),
            Resolution::Named(_) => None,
        };
        let mut bubble = false;
        if let Some(value) = moved {
            bubble |= self.apply(value, root, pending);
        }
        bubble | self.fragment.rebind(old, new, dom, root, pending)
    }

    /// Sever this node's binding (bound mode only) and its content's.
    /// Idempotent.
    pub fn unbind(&mut self) {
        if let Resolution::Bound(binding) = &mut self.resolution {
            binding.unbind();
        }
        self.fragment.unbind();
    }

    /// Deliver a data write. Named nodes never re-resolve.
    pub fn notify(
        &mut self,
        changed: &Keypath,
        dom: &mut Dom,
        root: &Root,
        pending: &mut Vec<PendingUpdate>,
    ) -> bool {
        let affected = match &self.resolution {
            Resolution::Bound(binding) if binding.is_affected_by(changed) => {
                Some(binding.read(root))
            }
            _ => None,
        };
        let mut bubble = false;
        if let Some(value) = affected {
            bubble |= self.apply(value, root, pending);
        }
        bubble | self.fragment.notify(changed, dom, root, pending)
    }

    /// Resolve a reference that named no data at construction time.
    pub fn try_resolve(
        &mut self,
        dom: &mut Dom,
        root: &Root,
        pending: &mut Vec<PendingUpdate>,
    ) -> bool {
        let resolved = match &mut self.resolution {
            Resolution::Bound(binding) => binding.try_resolve(root).then(|| binding.read(root)),
            Resolution::Named(_) => None,
        };
        let mut bubble = false;
        if let Some(value) = resolved {
            bubble |= self.apply(value, root, pending);
        }
        bubble | self.fragment.try_resolve(dom, root, pending)
    }

    fn apply(&mut self, value: Option<Value>, root: &Root, pending: &mut Vec<PendingUpdate>) -> bool {
        let change = self.set_value(value, root);
        pending.extend(change.pending);
        change.bubble
    }

    /// Serialize the active fragment. When the preceding sibling is text
    /// whose last line is pure whitespace, every following line of the
    /// output is indented to match.
    pub fn to_string(&self, preceding: Option<&Item>) -> String {
        let text = self.fragment.to_string();
        let Some(Item::Text(previous)) = preceding else {
            return text;
        };
        match indent::trailing_indent(previous.text()) {
            Some(indentation) => indent::apply_indent(&text, indentation),
            None => text,
        }
    }

    pub fn value(&self) -> String {
        self.fragment.value()
    }

    pub fn first_node(&self) -> Option<NodeId> {
        self.fragment.first_node()
    }

    /// Move the rendered content out of the tree into a fresh buffer.
    pub fn detach(&self, dom: &mut Dom) -> NodeId {
        self.fragment.detach(dom)
    }

    pub fn find(&self, dom: &Dom, selector: &str) -> Option<NodeId> {
        self.fragment.find(dom, selector)
    }

    pub fn find_all(&self, dom: &Dom, selector: &str) -> Vec<NodeId> {
        self.fragment.find_all(dom, selector)
    }

    pub fn find_component(&self, name: &str) -> Option<&ComponentItem> {
        self.fragment.find_component(name)
    }

    pub fn find_all_components(&self, name: &str) -> Vec<&ComponentItem> {
        self.fragment.find_all_components(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DataContext;
    use crate::registry::TemplateRegistry;

    fn root(data: serde_json::Value, registry: TemplateRegistry) -> Root {
        Root::new(
            DataContext::new(serde_json::from_value(data).unwrap()),
            registry,
        )
    }

    fn registry() -> TemplateRegistry {
        TemplateRegistry::new()
            .with("a", Template::text("A"))
            .with("b", Template::text("B"))
            .with("foo", Template::text("named foo"))
    }

    #[test]
    fn unresolved_reference_with_template_becomes_named() {
        let root = root(serde_json::json!({}), registry());
        let node = PartialNode::new(0, &IncludeDirective::named("foo"), Keypath::root(), &root);
        assert!(node.is_named());
        assert_eq!(node.partial_name(), "foo");
        assert_eq!(node.to_string(None), "named foo");
    }

    #[test]
    fn bound_reference_picks_template_by_value() {
        let root = root(serde_json::json!({ "kind": "a" }), registry());
        let node = PartialNode::new(0, &IncludeDirective::named("kind"), Keypath::root(), &root);
        assert!(!node.is_named());
        assert_eq!(node.partial_name(), "a");
        assert_eq!(node.to_string(None), "A");
    }

    #[test]
    fn same_value_twice_is_a_no_op() {
        let root = root(serde_json::json!({ "kind": "a" }), registry());
        let mut node = PartialNode::new(0, &IncludeDirective::named("kind"), Keypath::root(), &root);
        assert_eq!(node.set_value(Some(Value::string("a")), &root), ValueChange::default());
    }

    #[test]
    fn unknown_value_falls_back_to_literal_name() {
        let root = root(serde_json::json!({ "foo": "nope" }), registry());
        let node = PartialNode::new(0, &IncludeDirective::named("foo"), Keypath::root(), &root);
        assert!(node.is_named());
        assert_eq!(node.to_string(None), "named foo");
    }

    #[test]
    fn total_miss_renders_nothing_and_warns_once() {
        let root = root(serde_json::json!({}), registry());
        let first = PartialNode::new(0, &IncludeDirective::named("ghost"), Keypath::root(), &root);
        let second = PartialNode::new(1, &IncludeDirective::named("ghost"), Keypath::root(), &root);
        assert_eq!(first.to_string(None), "");
        assert_eq!(second.to_string(None), "");
        assert_eq!(
            root.diagnostics().emitted(),
            vec![IncludeWarning::MissingTemplate("ghost".into())]
        );
    }

    #[test]
    fn rendered_value_change_returns_pending_update() {
        let root = root(serde_json::json!({ "kind": "a" }), registry());
        let mut dom = Dom::new();
        let mut node = PartialNode::new(0, &IncludeDirective::named("kind"), Keypath::root(), &root);

        let unrendered = node.set_value(Some(Value::string("b")), &root);
        assert_eq!(unrendered.pending, None);
        assert!(unrendered.bubble);

        let container = dom.create_root("div");
        let buffer = node.render(&mut dom, &root);
        dom.append_child(container, buffer);
        assert_eq!(dom.inner_html(container), "B");

        let change = node.set_value(Some(Value::string("a")), &root);
        assert_eq!(change.pending, Some(PendingUpdate { node: node.id() }));
        assert!(matches!(node.swap_state(), SwapState::Pending { outgoing: Some(_) }));

        node.flush(&mut dom, &root, Some(LiveTarget { parent: container, anchor: None }));
        assert!(node.swap_state().is_idle());
        assert_eq!(dom.inner_html(container), "A");
    }

    #[test]
    fn repeated_swaps_before_flush_keep_only_rendered_outgoing() {
        let root = root(serde_json::json!({ "kind": "a" }), registry());
        let mut dom = Dom::new();
        let container = dom.create_root("div");
        let mut node = PartialNode::new(0, &IncludeDirective::named("kind"), Keypath::root(), &root);
        let buffer = node.render(&mut dom, &root);
        dom.append_child(container, buffer);

        let _ = node.set_value(Some(Value::string("b")), &root);
        let _ = node.set_value(Some(Value::Null), &root);
        let _ = node.set_value(Some(Value::string("b")), &root);
        node.flush(&mut dom, &root, Some(LiveTarget { parent: container, anchor: None }));

        assert_eq!(dom.inner_html(container), "B");
    }

    #[test]
    fn indentation_follows_whitespace_only_line() {
        let root = root(
            serde_json::json!({}),
            TemplateRegistry::new().with("two", Template::text("a\nb")),
        );
        let node = PartialNode::new(1, &IncludeDirective::named("two"), Keypath::root(), &root);
        let owner = Fragment::new(
            FragmentOptions {
                template: Arc::new(Template::new([crate::template::TemplateItem::text("x\n  ")])),
                base: Keypath::root(),
                owner: FragmentOwner::Instance,
            },
            &root,
        );
        assert_eq!(node.to_string(owner.items().first()), "a\n  b");
    }
}
