//! The live instance tree maintained by the reconciler.

use std::cell::Cell;
use std::num::NonZeroU64;

use reflow_core::{Key, Kind};

use crate::widget::Widget;

/// A process-unique identifier for one live instance.
///
/// Ids are never reused, so holding on to one across reconciliations reveals
/// whether an instance survived or was rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(NonZeroU64);

fn next_instance_id() -> InstanceId {
    thread_local! {
        static COUNTER: Cell<u64> = const { Cell::new(1) };
    }
    COUNTER.with(|counter| {
        let id = counter.get();
        counter.set(
            id.checked_add(1)
                .expect("instance id counter should not overflow"),
        );
        InstanceId(NonZeroU64::new(id).expect("instance id counter starts at one"))
    })
}

/// One constructed node of the live tree.
///
/// An instance owns its widget and its children; dropping it tears down the
/// whole subtree. The child list is kept in declaration order, which doubles
/// as back-to-front paint order: the last child is frontmost.
#[derive(Debug)]
pub struct Instance {
    id: InstanceId,
    kind: Kind,
    key: Option<Key>,
    widget: Box<dyn Widget>,
    children: Vec<Instance>,
}

impl Instance {
    pub(crate) fn new(kind: Kind, key: Option<Key>, widget: Box<dyn Widget>) -> Self {
        Self {
            id: next_instance_id(),
            kind,
            key,
            widget,
            children: Vec::new(),
        }
    }

    /// Returns the unique id of this instance.
    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Returns the kind this instance was constructed for.
    #[must_use]
    pub const fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns the identity key of this instance, if it has one.
    #[must_use]
    pub const fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Borrows the widget payload.
    #[must_use]
    pub fn widget(&self) -> &dyn Widget {
        self.widget.as_ref()
    }

    /// Mutably borrows the widget payload.
    pub fn widget_mut(&mut self) -> &mut dyn Widget {
        self.widget.as_mut()
    }

    /// Returns the children, ordered back-to-front.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }

    /// Finds the instance with the given key in this subtree, depth first.
    ///
    /// The receiver itself is considered first; among descendants, earlier
    /// siblings win.
    #[must_use]
    pub fn find(&self, key: &Key) -> Option<&Self> {
        if self.key.as_ref() == Some(key) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    /// Mutable variant of [`find`](Self::find).
    pub fn find_mut(&mut self, key: &Key) -> Option<&mut Self> {
        if self.key.as_ref() == Some(key) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(key))
    }
}
