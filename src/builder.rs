//! The reconciler: keeps a live instance tree in agreement with a state tree.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use reflow_core::{Key, Kind, Node, Subscription, TreeObserver};
use tracing::{debug, trace};

use crate::handler::{HandlerRegistry, TypeHandler};
use crate::instance::Instance;

/// Builds a live instance for `state`, including its whole subtree.
///
/// New instances inherit the state node's identity key at construction time.
///
/// # Panics
///
/// Panics if any kind in the subtree has no handler in `registry`; an
/// unknown kind is a defect in the producer of the state tree, not a
/// recoverable condition.
#[must_use]
pub fn build_instance(registry: &HandlerRegistry, state: &Node) -> Instance {
    let kind = state.kind();
    let handler = registry
        .get(&kind)
        .unwrap_or_else(|| panic!("no handler registered for kind `{kind}`"));
    let widget = handler.create(state);
    trace!(kind = %kind, key = ?state.identity(), "constructed instance");
    let mut instance = Instance::new(kind, state.identity(), widget);
    sync_children(registry, &mut instance, &state.children());
    instance
}

/// Reconciles `parent`'s live children against an ordered list of states.
///
/// Children whose identity key (and kind) match a state are kept as-is;
/// everything else is constructed through the registry. Live children with
/// no matching state are destroyed when the pass ends. Keyless states can
/// never be matched, so they are rebuilt on every pass. The resulting child
/// list follows declaration order, which is paint order: the last declared
/// child ends up frontmost.
///
/// # Panics
///
/// Panics if a state's kind has no registered handler.
pub fn sync_children(registry: &HandlerRegistry, parent: &mut Instance, states: &[Node]) {
    let mut pool = std::mem::take(parent.children_mut());
    let mut next = Vec::with_capacity(states.len());

    for state in states {
        let instance = state
            .identity()
            .and_then(|key| take_pooled(&mut pool, &key, &state.kind()))
            .unwrap_or_else(|| build_instance(registry, state));
        next.push(instance);
    }

    if !pool.is_empty() {
        debug!(count = pool.len(), "destroying stale instances");
    }
    *parent.children_mut() = next;
    // pool remainder dropped here, tearing down the orphaned subtrees
}

/// Takes the pooled instance matching `key`, if its kind also matches.
///
/// Scans from the back so that with duplicated keys the most recently
/// attached instance wins. A key match with a different kind is treated as
/// no match, forcing reconstruction instead of updating a stale widget.
fn take_pooled(pool: &mut Vec<Instance>, key: &Key, kind: &Kind) -> Option<Instance> {
    let index = pool
        .iter()
        .rposition(|instance| instance.key() == Some(key) && instance.kind() == kind)?;
    Some(pool.remove(index))
}

/// Owns a live instance tree and keeps it synchronized with a state tree.
///
/// The reconciler subscribes to the state tree for its whole lifetime. The
/// live root is materialized lazily, either on first access through
/// [`with_root`](Self::with_root) or by the first delivered change. From
/// then on every state mutation is mirrored into the live tree before the
/// mutating call returns.
pub struct Reconciler {
    inner: Rc<RefCell<Inner>>,
    _subscription: Subscription,
}

#[derive(Debug)]
struct Inner {
    state: Node,
    registry: HandlerRegistry,
    root: Option<Instance>,
}

/// Routes state-tree events into the reconciler.
///
/// Structural events are routed at the parent (that is where membership and
/// order changed); property and reparent events at the node itself.
struct StateObserver {
    inner: Weak<RefCell<Inner>>,
}

impl StateObserver {
    fn refresh(&self, node: &Node) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().refresh_from(node);
        }
    }
}

impl TreeObserver for StateObserver {
    fn on_property_changed(&self, node: &Node, _name: &str) {
        self.refresh(node);
    }

    fn on_child_added(&self, parent: &Node, _child: &Node) {
        self.refresh(parent);
    }

    fn on_child_removed(&self, parent: &Node, _child: &Node, _index: usize) {
        self.refresh(parent);
    }

    fn on_child_order_changed(&self, parent: &Node, _from: usize, _to: usize) {
        self.refresh(parent);
    }

    fn on_reparented(&self, node: &Node) {
        self.refresh(node);
    }
}

impl Reconciler {
    /// Creates a reconciler bound to the given state tree root.
    ///
    /// Handlers must be registered before the live tree is materialized —
    /// that is, before the first [`with_root`](Self::with_root) call and
    /// before the first state mutation after construction.
    #[must_use]
    pub fn new(state: Node) -> Self {
        let inner = Rc::new(RefCell::new(Inner {
            state: state.clone(),
            registry: HandlerRegistry::new(),
            root: None,
        }));
        let observer: Rc<dyn TreeObserver> = Rc::new(StateObserver {
            inner: Rc::downgrade(&inner),
        });
        let subscription = state.subscribe(observer);
        Self {
            inner,
            _subscription: subscription,
        }
    }

    /// Binds a handler to a node kind.
    ///
    /// # Panics
    ///
    /// Panics if the kind is already bound.
    pub fn register_handler(&self, kind: impl Into<Kind>, handler: impl TypeHandler) {
        self.inner.borrow_mut().registry.register(kind, handler);
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.inner.borrow().registry.len()
    }

    /// Returns the state tree this reconciler mirrors.
    #[must_use]
    pub fn state(&self) -> Node {
        self.inner.borrow().state.clone()
    }

    /// Returns `true` if the live root has been materialized.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.inner.borrow().root.is_some()
    }

    /// Gives `f` access to the live root, materializing it first if needed.
    ///
    /// # Panics
    ///
    /// Panics if no handlers are registered, or if the root state's kind has
    /// no handler.
    pub fn with_root<R>(&self, f: impl FnOnce(&Instance) -> R) -> R {
        let mut inner = self.inner.borrow_mut();
        inner.ensure_root();
        f(inner.root.as_ref().expect("root was just materialized"))
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Reconciler")
            .field("registry", &inner.registry)
            .field("materialized", &inner.root.is_some())
            .finish()
    }
}

impl Inner {
    fn ensure_root(&mut self) {
        if self.root.is_some() {
            return;
        }
        assert!(
            !self.registry.is_empty(),
            "register handlers before materializing the live tree"
        );
        let root = build_instance(&self.registry, &self.state);
        debug!(kind = %self.state.kind(), "materialized live root");
        self.root = Some(root);
    }

    /// Applies a state change rooted at `node` to the live tree.
    ///
    /// Walks upward until it reaches a node that is addressable (registered
    /// kind plus non-empty identity), then updates the corresponding live
    /// instance in place and re-reconciles its children. An unaddressable
    /// root means the update has nowhere to land; it is dropped. In valid
    /// usage the root always carries an identity, so the walk terminates at
    /// an addressable node before that.
    fn refresh_from(&mut self, node: &Node) {
        self.ensure_root();
        let Self { registry, root, .. } = self;
        let root = root.as_mut().expect("root was just materialized");

        let mut current = node.clone();
        loop {
            if let Some(key) = current.identity() {
                if let Some(handler) = registry.get(&current.kind()) {
                    if let Some(instance) = root.find_mut(&key) {
                        trace!(key = %key, kind = %current.kind(), "refreshing instance");
                        handler.update(instance.widget_mut(), &current);
                        sync_children(registry, instance, &current.children());
                    } else {
                        trace!(key = %key, "no live instance for changed node");
                    }
                    return;
                }
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => {
                    trace!("dropping update below an unaddressable root");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Widget;

    #[derive(Debug)]
    struct Plain;
    impl Widget for Plain {}

    fn plain_handler() -> impl TypeHandler {
        crate::handler::from_fns(|_| Box::new(Plain) as Box<dyn Widget>, |_, _| {})
    }

    #[test]
    #[should_panic(expected = "register handlers before materializing")]
    fn materializing_without_handlers_is_rejected() {
        let reconciler = Reconciler::new(Node::with_identity("panel", "root"));
        reconciler.with_root(|_| ());
    }

    #[test]
    #[should_panic(expected = "no handler registered for kind `mystery`")]
    fn unknown_root_kind_is_rejected() {
        let reconciler = Reconciler::new(Node::with_identity("mystery", "root"));
        reconciler.register_handler("panel", plain_handler());
        reconciler.with_root(|_| ());
    }

    #[test]
    fn root_is_materialized_lazily() {
        let reconciler = Reconciler::new(Node::with_identity("panel", "root"));
        reconciler.register_handler("panel", plain_handler());
        assert!(!reconciler.is_materialized());

        let key = reconciler.with_root(|root| root.key().cloned());
        assert!(reconciler.is_materialized());
        assert_eq!(key, Some(Key::new("root")));
    }

    #[test]
    fn first_state_change_materializes_the_root() {
        let state = Node::with_identity("panel", "root");
        let reconciler = Reconciler::new(state.clone());
        reconciler.register_handler("panel", plain_handler());

        state.set_attribute("padding", 2_i64);
        assert!(reconciler.is_materialized());
    }
}
