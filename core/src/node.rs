//! The mutable, observable state tree.

use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::id::{Key, Kind};
use crate::observer::{ObserverSet, Subscription, TreeObserver};
use crate::value::Value;

/// The reserved attribute holding a node's identity key.
pub const IDENTITY_PROPERTY: &str = "id";

/// A shared handle to one node of the state tree.
///
/// A node carries a [`Kind`], an attribute map and an ordered child list, and
/// it knows its parent. Cloning a `Node` clones the handle; equality compares
/// handles, not contents. All mutators take `&self` and notify subscribed
/// observers synchronously once the tree reflects the change.
///
/// The tree is single-threaded by construction. Nodes own their children;
/// parent links are weak, so dropping the last handle to a root drops the
/// whole tree.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

pub(crate) struct NodeData {
    kind: Kind,
    attributes: BTreeMap<Rc<str>, Value>,
    children: Vec<Node>,
    parent: Weak<RefCell<NodeData>>,
    observers: ObserverSet,
}

impl NodeData {
    pub(crate) fn observers_mut(&mut self) -> &mut ObserverSet {
        &mut self.observers
    }
}

impl Node {
    /// Creates a detached node of the given kind.
    #[must_use]
    pub fn new(kind: impl Into<Kind>) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            kind: kind.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            parent: Weak::new(),
            observers: ObserverSet::new(),
        })))
    }

    /// Creates a detached node with an identity key already assigned.
    #[must_use]
    pub fn with_identity(kind: impl Into<Kind>, key: impl Into<Key>) -> Self {
        let node = Self::new(kind);
        node.set_identity(key);
        node
    }

    /// Returns the kind of this node.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.0.borrow().kind.clone()
    }

    /// Returns the identity key of this node, if it has a non-empty one.
    ///
    /// The key is stored in the [`IDENTITY_PROPERTY`] attribute; an absent or
    /// empty attribute means the node is anonymous.
    #[must_use]
    pub fn identity(&self) -> Option<Key> {
        self.attribute(IDENTITY_PROPERTY)
            .as_ref()
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .map(Key::new)
    }

    /// Assigns the identity key of this node.
    pub fn set_identity(&self, key: impl Into<Key>) {
        self.set_attribute(IDENTITY_PROPERTY, key.into().as_str());
    }

    /// Returns a clone of the named attribute, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.0.borrow().attributes.get(name).cloned()
    }

    /// Sets an attribute and notifies observers.
    pub fn set_attribute(&self, name: impl Into<Rc<str>>, value: impl Into<Value>) {
        let name = name.into();
        self.0
            .borrow_mut()
            .attributes
            .insert(name.clone(), value.into());
        self.notify(|observer| observer.on_property_changed(self, &name));
    }

    /// Removes an attribute, notifying observers if it was present.
    pub fn remove_attribute(&self, name: &str) {
        let removed = self.0.borrow_mut().attributes.remove(name).is_some();
        if removed {
            self.notify(|observer| observer.on_property_changed(self, name));
        }
    }

    /// Returns the parent of this node, if it is attached to one.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.borrow().parent.upgrade().map(Self)
    }

    /// Returns `true` if this node has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Returns the number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// Returns the child at `index`, if it exists.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        self.0.borrow().children.get(index).cloned()
    }

    /// Returns a snapshot of the current child list.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.0.borrow().children.clone()
    }

    /// Appends `child` as the last child of this node.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent, or if attaching it would
    /// create a cycle.
    pub fn append_child(&self, child: Self) {
        let index = self.child_count();
        self.insert_child(index, child);
    }

    /// Inserts `child` at `index` in this node's child list.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds, if `child` already has a parent,
    /// or if attaching it would create a cycle.
    pub fn insert_child(&self, index: usize, child: Self) {
        assert!(
            child.parent().is_none(),
            "node is already attached to a parent"
        );
        self.assert_not_ancestor(&child);
        {
            let mut data = self.0.borrow_mut();
            assert!(index <= data.children.len(), "child index out of bounds");
            data.children.insert(index, child.clone());
        }
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.notify(|observer| observer.on_child_added(self, &child));
        child.notify_self(|observer| observer.on_reparented(&child));
    }

    /// Detaches and returns the child at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_child(&self, index: usize) -> Self {
        let child = {
            let mut data = self.0.borrow_mut();
            assert!(index < data.children.len(), "child index out of bounds");
            data.children.remove(index)
        };
        child.0.borrow_mut().parent = Weak::new();
        self.notify(|observer| observer.on_child_removed(self, &child, index));
        child.notify_self(|observer| observer.on_reparented(&child));
        child
    }

    /// Moves the child at `from` to position `to`, keeping the rest in order.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn move_child(&self, from: usize, to: usize) {
        if from == to {
            return;
        }
        {
            let mut data = self.0.borrow_mut();
            assert!(from < data.children.len(), "child index out of bounds");
            assert!(to < data.children.len(), "child index out of bounds");
            let child = data.children.remove(from);
            data.children.insert(to, child);
        }
        self.notify(|observer| observer.on_child_order_changed(self, from, to));
    }

    /// Registers an observer for this node and everything below it.
    ///
    /// The observer is held weakly by the node; the returned guard owns it
    /// and detaches it when dropped.
    pub fn subscribe(&self, observer: Rc<dyn TreeObserver>) -> Subscription {
        let id = self
            .0
            .borrow_mut()
            .observers
            .insert(Rc::downgrade(&observer));
        Subscription::new(Rc::downgrade(&self.0), id, observer)
    }

    /// Returns `true` if both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Delivers an event to the observers of this node and of every ancestor.
    ///
    /// Internal borrows are released before any callback runs, so observers
    /// are free to read the tree.
    fn notify(&self, event: impl Fn(&dyn TreeObserver)) {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            node.notify_self(&event);
            current = node.parent();
        }
    }

    /// Delivers an event to this node's own observers only.
    ///
    /// Used for reparenting, which concerns the moved node rather than the
    /// trees it moves between; those already receive the child events.
    fn notify_self(&self, event: impl Fn(&dyn TreeObserver)) {
        let observers = self.0.borrow_mut().observers.snapshot();
        for observer in &observers {
            event(observer.as_ref());
        }
    }

    fn assert_not_ancestor(&self, child: &Self) {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            assert!(
                !node.ptr_eq(child),
                "cannot attach a node beneath itself"
            );
            current = node.parent();
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Node")
            .field("kind", &data.kind)
            .field("attributes", &data.attributes)
            .field("children", &data.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::{String, ToString};
    use alloc::vec;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<String> {
            self.events.take()
        }

        fn push(&self, event: impl Into<String>) {
            self.events.borrow_mut().push(event.into());
        }
    }

    impl TreeObserver for Recorder {
        fn on_property_changed(&self, node: &Node, name: &str) {
            self.push(format!("property {} {name}", node.kind()));
        }

        fn on_child_added(&self, parent: &Node, child: &Node) {
            self.push(format!("added {} under {}", child.kind(), parent.kind()));
        }

        fn on_child_removed(&self, parent: &Node, child: &Node, index: usize) {
            self.push(format!(
                "removed {} from {} at {index}",
                child.kind(),
                parent.kind()
            ));
        }

        fn on_child_order_changed(&self, parent: &Node, from: usize, to: usize) {
            self.push(format!("moved {from}->{to} in {}", parent.kind()));
        }

        fn on_reparented(&self, node: &Node) {
            self.push(format!("reparented {}", node.kind()));
        }
    }

    #[test]
    fn attributes_round_trip() {
        let node = Node::new("label");
        node.set_attribute("text", "hello");
        assert_eq!(node.attribute("text"), Some(Value::from("hello")));
        node.remove_attribute("text");
        assert_eq!(node.attribute("text"), None);
    }

    #[test]
    fn empty_identity_reads_as_anonymous() {
        let node = Node::new("label");
        assert_eq!(node.identity(), None);
        node.set_attribute(IDENTITY_PROPERTY, "");
        assert_eq!(node.identity(), None);
        node.set_identity("a");
        assert_eq!(node.identity(), Some(Key::new("a")));
    }

    #[test]
    fn children_keep_declaration_order() {
        let root = Node::new("panel");
        root.append_child(Node::with_identity("label", "a"));
        root.append_child(Node::with_identity("label", "c"));
        root.insert_child(1, Node::with_identity("label", "b"));

        let keys: Vec<_> = root
            .children()
            .iter()
            .map(|child| child.identity().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(root.child(1).unwrap().parent().unwrap().ptr_eq(&root));
    }

    #[test]
    fn removal_detaches_the_child() {
        let root = Node::new("panel");
        root.append_child(Node::new("label"));
        let child = root.remove_child(0);
        assert!(child.is_root());
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn events_bubble_to_the_root() {
        let root = Node::new("panel");
        let child = Node::new("row");
        root.append_child(child.clone());

        let recorder = Rc::new(Recorder::default());
        let _guard = root.subscribe(recorder.clone());

        let grandchild = Node::new("label");
        child.append_child(grandchild.clone());
        grandchild.set_attribute("text", "hi");
        child.move_child(0, 0);

        assert_eq!(
            recorder.take(),
            vec!["added label under row", "property label text"]
        );
    }

    #[test]
    fn reparenting_notifies_the_moved_node() {
        let root = Node::new("panel");
        let child = Node::new("row");
        let recorder = Rc::new(Recorder::default());
        let _guard = child.subscribe(recorder.clone());

        root.append_child(child.clone());
        root.remove_child(0);

        assert_eq!(recorder.take(), vec!["reparented row", "reparented row"]);
    }

    #[test]
    fn dropping_the_subscription_detaches_the_observer() {
        let root = Node::new("panel");
        let recorder = Rc::new(Recorder::default());
        let guard = root.subscribe(recorder.clone());

        root.set_attribute("padding", 4_i64);
        assert_eq!(recorder.take().len(), 1);

        drop(guard);
        root.set_attribute("padding", 8_i64);
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn order_changes_are_reported() {
        let root = Node::new("panel");
        root.append_child(Node::with_identity("label", "a"));
        root.append_child(Node::with_identity("label", "b"));

        let recorder = Rc::new(Recorder::default());
        let _guard = root.subscribe(recorder.clone());

        root.move_child(1, 0);
        assert_eq!(recorder.take(), vec!["moved 1->0 in panel"]);
    }

    #[test]
    #[should_panic(expected = "already attached to a parent")]
    fn double_attachment_is_rejected() {
        let first = Node::new("panel");
        let second = Node::new("panel");
        let child = Node::new("label");
        first.append_child(child.clone());
        second.append_child(child);
    }

    #[test]
    #[should_panic(expected = "cannot attach a node beneath itself")]
    fn cycles_are_rejected() {
        let root = Node::new("panel");
        let child = Node::new("row");
        root.append_child(child.clone());
        child.append_child(root);
    }
}
