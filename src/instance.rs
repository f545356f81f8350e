//! A rendered template bound to its data.
//!
//! The instance owns everything a render needs and is the only place data is
//! written. Each write is delivered to the fragment tree, the include nodes
//! that changed hand back pending updates, and the runloop drains them when
//! the outermost batch closes.

use crate::dom::{Dom, NodeId};
use crate::fragment::{Fragment, FragmentOptions, FragmentOwner};
use crate::keypath::Keypath;
use crate::root::Root;
use crate::runloop::{PendingUpdate, Runloop};
use crate::template::Template;
use crate::value::Value;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Writes collected inside [`Instance::batch`].
#[derive(Debug, Default)]
pub struct Batch {
    writes: Vec<(Keypath, Value)>,
}

impl Batch {
    pub fn set(&mut self, keypath: impl Into<Keypath>, value: impl Into<Value>) -> &mut Self {
        self.writes.push((keypath.into(), value.into()));
        self
    }
}

#[derive(Debug)]
pub struct Instance {
    root: Root,
    dom: Dom,
    fragment: Fragment,
    runloop: Runloop,
    container: Option<NodeId>,
    /// Bumped once per batch in which an include changed structure.
    revision: u64,
}

impl Instance {
    pub fn new(root: Root, template: Template) -> Self {
        let fragment = Fragment::new(
            FragmentOptions {
                template: Arc::new(template),
                base: Keypath::root(),
                owner: FragmentOwner::Instance,
            },
            &root,
        );
        Self {
            root,
            dom: Dom::new(),
            fragment,
            runloop: Runloop::new(),
            container: None,
            revision: 0,
        }
    }

    /// Create a live container element and render into it.
    pub fn mount(&mut self, tag: &str) -> NodeId {
        let container = self.dom.create_root(tag);
        self.render(container);
        container
    }

    /// Render the top fragment and append it to `container`.
    pub fn render(&mut self, container: NodeId) {
        if self.fragment.is_rendered() {
            self.fragment.unrender(&mut self.dom, true);
        }
        let buffer = self.fragment.render(&mut self.dom, &self.root);
        self.dom.append_child(container, buffer);
        self.dom.remove(buffer);
        self.container = Some(container);
        tracing::debug!(nodes = self.dom.len(), "instance rendered");
    }

    /// Write one value and flush.
    pub fn set(&mut self, keypath: impl Into<Keypath>, value: impl Into<Value>) {
        self.batch(|batch| {
            batch.set(keypath, value);
        });
    }

    /// Apply every write made in `writes` and flush once at the end, so an
    /// include that changes several times swaps its content only once.
    pub fn batch(&mut self, writes: impl FnOnce(&mut Batch)) {
        let mut batch = Batch::default();
        writes(&mut batch);

        self.runloop.start();
        let mut pending: Vec<PendingUpdate> = Vec::new();
        let mut changed = false;
        for (keypath, value) in batch.writes {
            if !self.root.data_mut().set(&keypath, value) {
                tracing::warn!(%keypath, "write through a non-container value ignored");
                continue;
            }
            changed |= self
                .fragment
                .notify(&keypath, &mut self.dom, &self.root, &mut pending);
            changed |= self
                .fragment
                .try_resolve(&mut self.dom, &self.root, &mut pending);
        }
        self.record_change(changed);
        for update in pending {
            self.runloop.enqueue(update);
        }
        if self.runloop.end() {
            self.drain();
        }
    }

    /// Follow data that moved from `old` to `new`.
    pub fn rebind(&mut self, old: impl Into<Keypath>, new: impl Into<Keypath>) {
        let (old, new) = (old.into(), new.into());
        self.runloop.start();
        let mut pending = Vec::new();
        let changed = self
            .fragment
            .rebind(&old, &new, &mut self.dom, &self.root, &mut pending);
        self.record_change(changed);
        for update in pending {
            self.runloop.enqueue(update);
        }
        if self.runloop.end() {
            self.drain();
        }
    }

    fn record_change(&mut self, changed: bool) {
        if changed {
            self.revision += 1;
            tracing::debug!(revision = self.revision, "structure changed");
        }
    }

    fn drain(&mut self) {
        if self.runloop.is_empty() {
            return;
        }
        let pending: FxHashSet<_> = self.runloop.take().into_iter().collect();
        let Some(container) = self.container else {
            return;
        };
        let flushed = self
            .fragment
            .flush_pending(&pending, &mut self.dom, &self.root, container, None);
        tracing::trace!(flushed, "runloop drained");
    }

    pub fn unrender(&mut self) {
        self.fragment.unrender(&mut self.dom, true);
        self.container = None;
    }

    /// Unbind everything, then unrender.
    pub fn teardown(&mut self) {
        self.fragment.unbind();
        self.unrender();
    }

    /// Live markup of the container, or an empty string when not mounted.
    pub fn html(&self) -> String {
        self.container
            .map(|container| self.dom.inner_html(container))
            .unwrap_or_default()
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn runloop(&self) -> &Runloop {
        &self.runloop
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    /// Number of batches that swapped include content.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.fragment, f)
    }
}
