//! The change feed: observers and subscription guards.
//!
//! A [`TreeObserver`] receives synchronous callbacks for every mutation of a
//! subscribed subtree. All callbacks default to no-ops so implementors only
//! override what they care about. Registration follows the guard pattern:
//! [`Node::subscribe`](crate::Node::subscribe) returns a [`Subscription`]
//! that keeps the observer alive and detaches it when dropped.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::node::{Node, NodeData};

/// Callbacks delivered when a subscribed subtree changes.
///
/// Events bubble upward: an observer subscribed on a node receives the events
/// of that node and of every node below it. Delivery happens synchronously on
/// the mutating call, after the tree already reflects the change.
pub trait TreeObserver {
    /// An attribute of `node` was set or removed.
    fn on_property_changed(&self, node: &Node, name: &str) {
        let _ = (node, name);
    }

    /// `child` was attached under `parent`.
    fn on_child_added(&self, parent: &Node, child: &Node) {
        let _ = (parent, child);
    }

    /// `child` was detached from `parent`; it previously sat at `index`.
    fn on_child_removed(&self, parent: &Node, child: &Node, index: usize) {
        let _ = (parent, child, index);
    }

    /// A child of `parent` moved from `from` to `to`.
    fn on_child_order_changed(&self, parent: &Node, from: usize, to: usize) {
        let _ = (parent, from, to);
    }

    /// `node` gained or lost its parent.
    fn on_reparented(&self, node: &Node) {
        let _ = node;
    }
}

/// Per-node observer storage.
///
/// Observers are held weakly; the owning [`Subscription`] keeps them alive.
/// Dead entries are pruned whenever the set is snapshotted for delivery.
pub(crate) struct ObserverSet {
    entries: Vec<(u64, Weak<dyn TreeObserver>)>,
    next: u64,
}

impl ObserverSet {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next: 0,
        }
    }

    pub(crate) fn insert(&mut self, observer: Weak<dyn TreeObserver>) -> u64 {
        let id = self.next;
        self.next = id
            .checked_add(1)
            .expect("observer id counter should not overflow");
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry, _)| *entry != id);
    }

    pub(crate) fn snapshot(&mut self) -> Vec<Rc<dyn TreeObserver>> {
        self.entries
            .retain(|(_, observer)| observer.strong_count() > 0);
        self.entries
            .iter()
            .filter_map(|(_, observer)| observer.upgrade())
            .collect()
    }
}

/// Keeps an observer registered on a node.
///
/// Dropping the subscription detaches the observer. The subscription also
/// owns the observer, so a consumer only needs to hold this guard.
#[must_use = "dropping the subscription detaches the observer"]
pub struct Subscription {
    node: Weak<RefCell<NodeData>>,
    id: u64,
    _observer: Rc<dyn TreeObserver>,
}

impl Subscription {
    pub(crate) fn new(
        node: Weak<RefCell<NodeData>>,
        id: u64,
        observer: Rc<dyn TreeObserver>,
    ) -> Self {
        Self {
            node,
            id,
            _observer: observer,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(node) = self.node.upgrade() {
            node.borrow_mut().observers_mut().remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
