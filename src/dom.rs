//! Render tree backed by a generational arena.
//!
//! Rendered output lives here: elements, text and detached buffers. A buffer
//! behaves like a document fragment: inserting it into a parent moves its
//! children and leaves the buffer empty and reusable.

use std::fmt::Write as _;
use std::sync::Arc;

/// Generational index into the render tree.
/// Allows safe reuse of slots with use-after-free detection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomNodeKind {
    Element { tag: Arc<str> },
    Text(String),
    /// Detached staging container.
    Buffer,
}

#[derive(Debug, Clone)]
struct DomNode {
    generation: u32,
    kind: DomNodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    live: bool,
}

impl Default for DomNode {
    fn default() -> Self {
        Self {
            generation: 0,
            kind: DomNodeKind::Buffer,
            parent: None,
            children: Vec::new(),
            live: false,
        }
    }
}

/// Arena allocator for render nodes.
#[derive(Debug, Default)]
pub struct Dom {
    nodes: Vec<DomNode>,
    free_list: Vec<u32>,
    /// Splices into / removals from a live parent.
    mutations: u64,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: DomNodeKind) -> NodeId {
        if let Some(index) = self.free_list.pop() {
            // Reuse freed slot, generation was bumped on free
            let node = &mut self.nodes[index as usize];
            node.kind = kind;
            node.parent = None;
            node.children.clear();
            node.live = false;
            NodeId {
                index,
                generation: node.generation,
            }
        } else {
            let index = self.nodes.len() as u32;
            self.nodes.push(DomNode {
                kind,
                ..DomNode::default()
            });
            NodeId { index, generation: 0 }
        }
    }

    /// A container that is live from the start (the mount point).
    pub fn create_root(&mut self, tag: impl AsRef<str>) -> NodeId {
        let id = self.create_element(tag);
        self.nodes[id.index as usize].live = true;
        id
    }

    pub fn create_element(&mut self, tag: impl AsRef<str>) -> NodeId {
        self.alloc(DomNodeKind::Element {
            tag: tag.as_ref().into(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(DomNodeKind::Text(text.into()))
    }

    pub fn create_buffer(&mut self) -> NodeId {
        self.alloc(DomNodeKind::Buffer)
    }

    /// Check if a NodeId is valid (correct generation).
    pub fn is_valid(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.index as usize)
            .is_some_and(|node| node.generation == id.generation)
    }

    fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes
            .get(id.index as usize)
            .filter(|node| node.generation == id.generation)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.nodes
            .get_mut(id.index as usize)
            .filter(|node| node.generation == id.generation)
    }

    pub fn kind(&self, id: NodeId) -> Option<&DomNodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            DomNodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            DomNodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(DomNode {
                kind: DomNodeKind::Text(current),
                ..
            }) => {
                *current = text.into();
                true
            }
            _ => false,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Whether the node is attached (transitively) to a live root.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| node.live)
    }

    /// Number of live-tree splices and removals so far.
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `anchor` (or at the end).
    /// A buffer child contributes its children instead of itself.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, anchor: Option<NodeId>) -> bool {
        if !self.is_valid(parent) || !self.is_valid(child) || parent == child {
            return false;
        }
        let moving: Vec<NodeId> = if matches!(self.kind(child), Some(DomNodeKind::Buffer)) {
            std::mem::take(&mut self.nodes[child.index as usize].children)
        } else {
            self.detach(child);
            vec![child]
        };
        if moving.is_empty() {
            return true;
        }

        let position = anchor
            .filter(|anchor| self.parent(*anchor) == Some(parent))
            .and_then(|anchor| self.children(parent).iter().position(|c| *c == anchor));
        let parent_live = self.is_live(parent);
        for node in &moving {
            self.nodes[node.index as usize].parent = Some(parent);
            self.set_live(*node, parent_live);
        }
        let siblings = &mut self.nodes[parent.index as usize].children;
        match position {
            Some(at) => {
                siblings.splice(at..at, moving);
            }
            None => siblings.extend(moving),
        }
        if parent_live {
            self.mutations += 1;
        }
        true
    }

    /// Remove `id` from its parent, keeping it allocated.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let was_live = self.is_live(id);
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|c| *c != id);
        }
        self.nodes[id.index as usize].parent = None;
        self.set_live(id, false);
        if was_live {
            self.mutations += 1;
        }
        true
    }

    /// Detach `id` and free its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.index as usize];
            stack.append(&mut node.children);
            node.generation += 1;
            node.parent = None;
            node.live = false;
            self.free_list.push(current.index);
        }
        true
    }

    fn set_live(&mut self, id: NodeId, live: bool) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.index as usize];
            node.live = live;
            stack.extend(node.children.iter().copied());
        }
    }

    /// Serialize the children of `id` as markup.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    /// Serialize `id` and its subtree as markup.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.kind {
            DomNodeKind::Text(text) => out.push_str(text),
            DomNodeKind::Buffer => {
                for child in &node.children {
                    self.write_html(*child, out);
                }
            }
            DomNodeKind::Element { tag } => {
                let _ = write!(out, "<{tag}>");
                for child in &node.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    /// Depth-first search below (and including) `id` for elements with `tag`.
    pub fn query_all(&self, id: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        if self.tag(id) == Some(tag) {
            found.push(id);
        }
        for child in self.children(id) {
            self.query_all(*child, tag, found);
        }
    }

    /// Number of slots in the arena (including freed slots).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
