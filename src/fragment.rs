//! Fragments: a template instantiated against a data scope.
//!
//! A fragment owns its items in document order. Items never reach back into
//! their owner; everything an item needs from its surroundings (preceding
//! sibling, live parent, insertion anchor) is handed down by the fragment
//! while it walks its items.

use crate::binding::Binding;
use crate::dom::{Dom, DomNodeKind, NodeId};
use crate::keypath::Keypath;
use crate::partial::{LiveTarget, PartialNode};
use crate::root::Root;
use crate::runloop::{PartialId, PendingUpdate};
use crate::template::{Template, TemplateItem};
use crate::value::Value;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Who owns a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentOwner {
    Instance,
    Element(Arc<str>),
    Partial(PartialId),
    Component(Arc<str>),
}

pub struct FragmentOptions {
    pub template: Arc<Template>,
    /// Data scope the template's references resolve in.
    pub base: Keypath,
    pub owner: FragmentOwner,
}

#[derive(Debug)]
pub struct TextItem {
    text: String,
    node: Option<NodeId>,
}

impl TextItem {
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug)]
pub struct ElementItem {
    tag: Arc<str>,
    fragment: Fragment,
    node: Option<NodeId>,
}

impl ElementItem {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }
}

#[derive(Debug)]
pub struct InterpolationItem {
    binding: Binding,
    text: String,
    node: Option<NodeId>,
}

impl InterpolationItem {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Re-read the bound value; returns `true` when the text changed.
    fn refresh(&mut self, dom: Option<&mut Dom>, root: &Root) -> bool {
        let value = self.binding.read(root);
        if value.as_ref() == self.binding.value() {
            return false;
        }
        self.text = display(value.as_ref());
        self.binding.record(value);
        if let (Some(dom), Some(node)) = (dom, self.node) {
            dom.set_text(node, self.text.clone());
        }
        true
    }
}

#[derive(Debug)]
pub struct ComponentItem {
    name: Arc<str>,
    fragment: Fragment,
}

impl ComponentItem {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }
}

#[derive(Debug)]
pub enum Item {
    Text(TextItem),
    Element(ElementItem),
    Interpolation(InterpolationItem),
    Partial(PartialNode),
    Component(ComponentItem),
}

impl Item {
    fn instantiate(template: &TemplateItem, index: usize, base: &Keypath, root: &Root) -> Self {
        match template {
            TemplateItem::Text(text) => Item::Text(TextItem {
                text: text.clone(),
                node: None,
            }),
            TemplateItem::Element { tag, children } => Item::Element(ElementItem {
                tag: tag.clone(),
                fragment: Fragment::new(
                    FragmentOptions {
                        template: Arc::new(Template::new(children.iter().cloned())),
                        base: base.clone(),
                        owner: FragmentOwner::Element(tag.clone()),
                    },
                    root,
                ),
                node: None,
            }),
            TemplateItem::Interpolation(reference) => {
                let mut binding = Binding::init(reference.clone(), base.clone(), root);
                let value = binding.read(root);
                let text = display(value.as_ref());
                binding.record(value);
                Item::Interpolation(InterpolationItem {
                    binding,
                    text,
                    node: None,
                })
            }
            TemplateItem::Include(directive) => {
                Item::Partial(PartialNode::new(index, directive, base.clone(), root))
            }
            TemplateItem::Component { name, template } => Item::Component(ComponentItem {
                name: name.clone(),
                fragment: Fragment::new(
                    FragmentOptions {
                        template: template.clone(),
                        base: base.clone(),
                        owner: FragmentOwner::Component(name.clone()),
                    },
                    root,
                ),
            }),
        }
    }

    /// First rendered node of this item, if any.
    pub fn first_node(&self) -> Option<NodeId> {
        match self {
            Item::Text(TextItem { node, .. })
            | Item::Element(ElementItem { node, .. })
            | Item::Interpolation(InterpolationItem { node, .. }) => *node,
            Item::Partial(partial) => partial.first_node(),
            Item::Component(component) => component.fragment.first_node(),
        }
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        match self {
            Item::Text(TextItem { node, .. })
            | Item::Element(ElementItem { node, .. })
            | Item::Interpolation(InterpolationItem { node, .. }) => out.extend(*node),
            Item::Partial(partial) => partial.fragment().collect_nodes(out),
            Item::Component(component) => component.fragment.collect_nodes(out),
        }
    }

    fn render(&mut self, dom: &mut Dom, root: &Root) -> Option<NodeId> {
        match self {
            Item::Text(item) => {
                let node = dom.create_text(item.text.clone());
                item.node = Some(node);
                Some(node)
            }
            Item::Interpolation(item) => {
                let node = dom.create_text(item.text.clone());
                item.node = Some(node);
                Some(node)
            }
            Item::Element(item) => {
                let node = dom.create_element(&item.tag);
                let children = item.fragment.render(dom, root);
                dom.append_child(node, children);
                dom.remove(children);
                item.node = Some(node);
                Some(node)
            }
            // The partial keeps its buffer for later swaps; the caller only
            // moves the buffer's children.
            Item::Partial(partial) => Some(partial.render(dom, root)),
            Item::Component(component) => Some(component.fragment.render(dom, root)),
        }
    }

    fn unrender(&mut self, dom: &mut Dom, destroy: bool) {
        match self {
            Item::Text(TextItem { node, .. })
            | Item::Element(ElementItem { node, .. })
            | Item::Interpolation(InterpolationItem { node, .. }) => {
                if let Some(node) = node.take() {
                    if destroy {
                        dom.remove(node);
                    }
                }
            }
            Item::Partial(partial) => partial.unrender(dom, destroy),
            Item::Component(component) => component.fragment.unrender(dom, destroy),
        }
        if let Item::Element(item) = self {
            // Removing the element freed its subtree.
            item.fragment.unrender(dom, false);
        }
    }
}

/// Display text of a bound value; undefined and null render as nothing.
fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(value) => value.to_name(),
    }
}

#[derive(Debug)]
pub struct Fragment {
    owner: FragmentOwner,
    base: Keypath,
    items: Vec<Item>,
    rendered: bool,
    dirty: bool,
}

impl Fragment {
    pub fn new(options: FragmentOptions, root: &Root) -> Self {
        let FragmentOptions {
            template,
            base,
            owner,
        } = options;
        let items = template
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| Item::instantiate(item, index, &base, root))
            .collect();
        Self {
            owner,
            base,
            items,
            rendered: false,
            dirty: false,
        }
    }

    /// A fragment with no items.
    pub fn empty(owner: FragmentOwner, base: Keypath) -> Self {
        Self {
            owner,
            base,
            items: Vec::new(),
            rendered: false,
            dirty: false,
        }
    }

    pub fn owner(&self) -> &FragmentOwner {
        &self.owner
    }

    pub fn base(&self) -> &Keypath {
        &self.base
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Set when a descendant's structure changed since this fragment was
    /// last rendered.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Render every item into a fresh detached buffer and return it.
    pub fn render(&mut self, dom: &mut Dom, root: &Root) -> NodeId {
        let buffer = dom.create_buffer();
        for item in &mut self.items {
            let is_partial = matches!(item, Item::Partial(_));
            if let Some(node) = item.render(dom, root) {
                dom.append_child(buffer, node);
                if !is_partial && matches!(dom.kind(node), Some(DomNodeKind::Buffer)) {
                    dom.remove(node);
                }
            }
        }
        self.rendered = true;
        self.dirty = false;
        buffer
    }

    /// Tear down rendered output. With `destroy` the nodes are removed from
    /// the tree; without it an ancestor's removal is expected to take them.
    pub fn unrender(&mut self, dom: &mut Dom, destroy: bool) {
        if !self.rendered {
            return;
        }
        for item in &mut self.items {
            item.unrender(dom, destroy);
        }
        self.rendered = false;
    }

    /// Sever every binding in this fragment. Idempotent.
    pub fn unbind(&mut self) {
        for item in &mut self.items {
            match item {
                Item::Text(_) => {}
                Item::Interpolation(item) => item.binding.unbind(),
                Item::Element(item) => item.fragment.unbind(),
                Item::Partial(partial) => partial.unbind(),
                Item::Component(component) => component.fragment.unbind(),
            }
        }
    }

    /// Re-point bindings after data under `old` moved to `new`.
    /// Returns whether structure changed.
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
        let mut bubble = false;
        for item in &mut self.items {
            bubble |= match item {
                Item::Text(_) => false,
                Item::Interpolation(item) => {
                    item.binding.rebind(old, new) && item.refresh(Some(&mut *dom), root)
                }
                Item::Element(item) => item.fragment.rebind(old, new, dom, root, pending),
                Item::Partial(partial) => partial.rebind(old, new, dom, root, pending),
                Item::Component(component) => {
                    component.fragment.rebind(old, new, dom, root, pending)
                }
            };
        }
        self.bubble_if(bubble)
    }

    /// Deliver a data write at `changed` to every affected binding.
    /// Collects the flushes that must run before the batch completes.
    pub fn notify(
        &mut self,
        changed: &Keypath,
        dom: &mut Dom,
        root: &Root,
        pending: &mut Vec<PendingUpdate>,
    ) -> bool {
        let mut bubble = false;
        for item in &mut self.items {
            bubble |= match item {
                Item::Text(_) => false,
                Item::Interpolation(item) => {
                    item.binding.is_affected_by(changed) && item.refresh(Some(&mut *dom), root)
                }
                Item::Element(item) => item.fragment.notify(changed, dom, root, pending),
                Item::Partial(partial) => partial.notify(changed, dom, root, pending),
                Item::Component(component) => {
                    component.fragment.notify(changed, dom, root, pending)
                }
            };
        }
        self.bubble_if(bubble)
    }

    /// Give unresolved references another chance after a data write.
    pub fn try_resolve(
        &mut self,
        dom: &mut Dom,
        root: &Root,
        pending: &mut Vec<PendingUpdate>,
    ) -> bool {
        let mut bubble = false;
        for item in &mut self.items {
            bubble |= match item {
                Item::Text(_) => false,
                Item::Interpolation(item) => {
                    item.binding.try_resolve(root) && item.refresh(Some(&mut *dom), root)
                }
                Item::Element(item) => item.fragment.try_resolve(dom, root, pending),
                Item::Partial(partial) => partial.try_resolve(dom, root, pending),
                Item::Component(component) => component.fragment.try_resolve(dom, root, pending),
            };
        }
        self.bubble_if(bubble)
    }

    fn bubble_if(&mut self, bubble: bool) -> bool {
        if bubble {
            self.dirty = true;
        }
        bubble
    }

    /// Flush the include nodes listed in `pending` that live in this subtree.
    ///
    /// `parent` is the live node this fragment's output sits in and
    /// `following` the node right after the fragment. Anchors are computed
    /// when each node flushes, so earlier splices in the same pass are seen.
    /// Returns the number of nodes flushed.
    pub fn flush_pending(
        &mut self,
        pending: &FxHashSet<PartialId>,
        dom: &mut Dom,
        root: &Root,
        parent: NodeId,
        following: Option<NodeId>,
    ) -> usize {
        let mut flushed = 0;
        for index in 0..self.items.len() {
            let anchor = match &self.items[index] {
                Item::Partial(partial) => self.find_next_node(partial.index()).or(following),
                Item::Component(_) => self.find_next_node(index).or(following),
                _ => None,
            };
            match &mut self.items[index] {
                Item::Text(_) | Item::Interpolation(_) => {}
                Item::Element(item) => {
                    if let Some(node) = item.node {
                        flushed += item.fragment.flush_pending(pending, dom, root, node, None);
                    }
                }
                Item::Partial(partial) => {
                    if pending.contains(&partial.id()) {
                        partial.flush(dom, root, Some(LiveTarget { parent, anchor }));
                        flushed += 1;
                    }
                    flushed += partial
                        .fragment_mut()
                        .flush_pending(pending, dom, root, parent, anchor);
                }
                Item::Component(component) => {
                    flushed += component
                        .fragment
                        .flush_pending(pending, dom, root, parent, anchor);
                }
            }
        }
        flushed
    }

    /// First rendered node after the item at `index`, within this fragment.
    pub fn find_next_node(&self, index: usize) -> Option<NodeId> {
        self.items.get(index + 1..)?.iter().find_map(Item::first_node)
    }

    pub fn first_node(&self) -> Option<NodeId> {
        self.items.iter().find_map(Item::first_node)
    }

    /// Top-level rendered nodes in document order.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        for item in &self.items {
            item.collect_nodes(out);
        }
    }

    /// Move the rendered nodes out of the tree into a fresh buffer.
    pub fn detach(&self, dom: &mut Dom) -> NodeId {
        let buffer = dom.create_buffer();
        for node in self.nodes() {
            dom.append_child(buffer, node);
        }
        buffer
    }

    /// First rendered element matching the tag `selector`.
    pub fn find(&self, dom: &Dom, selector: &str) -> Option<NodeId> {
        self.find_all(dom, selector).into_iter().next()
    }

    pub fn find_all(&self, dom: &Dom, selector: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        for node in self.nodes() {
            dom.query_all(node, selector, &mut found);
        }
        found
    }

    pub fn find_component(&self, name: &str) -> Option<&ComponentItem> {
        self.find_all_components(name).into_iter().next()
    }

    pub fn find_all_components(&self, name: &str) -> Vec<&ComponentItem> {
        let mut found = Vec::new();
        self.collect_components(name, &mut found);
        found
    }

    fn collect_components<'a>(&'a self, name: &str, found: &mut Vec<&'a ComponentItem>) {
        for item in &self.items {
            match item {
                Item::Text(_) | Item::Interpolation(_) => {}
                Item::Element(item) => item.fragment.collect_components(name, found),
                Item::Partial(partial) => partial.fragment().collect_components(name, found),
                Item::Component(component) => {
                    if &*component.name == name {
                        found.push(component);
                    }
                    component.fragment.collect_components(name, found);
                }
            }
        }
    }

    /// Concatenated text value, as used where a fragment feeds a string.
    pub fn value(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            match item {
                Item::Text(item) => out.push_str(&item.text),
                Item::Interpolation(item) => out.push_str(&item.text),
                Item::Element(_) | Item::Component(_) => {}
                Item::Partial(partial) => out.push_str(&partial.value()),
            }
        }
        out
    }
}

impl std::fmt::Display for Fragment {
    /// Markup serialization. Include nodes see their preceding sibling so a
    /// standalone include can inherit its line's indentation.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for item in &self.items {
            match item {
                Item::Text(item) => f.write_str(&item.text)?,
                Item::Interpolation(item) => f.write_str(&item.text)?,
                Item::Element(item) => write!(f, "<{0}>{1}</{0}>", item.tag, item.fragment)?,
                Item::Partial(partial) => {
                    let preceding = partial.index().checked_sub(1).and_then(|i| self.items.get(i));
                    f.write_str(&partial.to_string(preceding))?
                }
                Item::Component(component) => write!(f, "{}", component.fragment)?,
            }
        }
        Ok(())
    }
}
