//! Type handlers and the registry that maps node kinds onto them.

use core::fmt;

use reflow_core::{Kind, Node};

use crate::widget::Widget;

/// A kind-specific strategy for building and refreshing live widgets.
///
/// One handler serves every node of its registered kind. `create` builds a
/// fresh widget from a state node; `update` mutates an existing widget so it
/// reflects the node's current attributes. The engine drives child
/// reconciliation itself, so handlers only deal with their own widget.
pub trait TypeHandler: 'static {
    /// Builds a new widget for `state`.
    fn create(&self, state: &Node) -> Box<dyn Widget>;

    /// Brings an existing widget in line with `state`.
    fn update(&self, widget: &mut dyn Widget, state: &Node);
}

/// An append-only table mapping node kinds to their handlers.
///
/// Handlers are registered once and shared read-only by every reconciliation
/// pass afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Vec<(Kind, Box<dyn TypeHandler>)>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binds `handler` to `kind`.
    ///
    /// # Panics
    ///
    /// Panics if a handler is already registered for `kind`; handler
    /// bindings are append-only and never replaced.
    pub fn register(&mut self, kind: impl Into<Kind>, handler: impl TypeHandler) {
        let kind = kind.into();
        assert!(
            self.get(&kind).is_none(),
            "a handler is already registered for kind `{kind}`"
        );
        self.entries.push((kind, Box::new(handler)));
    }

    /// Returns the handler bound to `kind`, if any.
    #[must_use]
    pub fn get(&self, kind: &Kind) -> Option<&dyn TypeHandler> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == kind)
            .map(|(_, handler)| handler.as_ref())
    }

    /// Returns `true` if a handler is bound to `kind`.
    #[must_use]
    pub fn contains(&self, kind: &Kind) -> bool {
        self.get(kind).is_some()
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(kind, _)| kind))
            .finish()
    }
}

/// A [`TypeHandler`] assembled from a create/update function pair.
///
/// Convenient for simple kinds that do not warrant a named handler type; see
/// [`from_fns`].
pub struct FnHandler<C, U> {
    create: C,
    update: U,
}

impl<C, U> fmt::Debug for FnHandler<C, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

impl<C, U> TypeHandler for FnHandler<C, U>
where
    C: 'static + Fn(&Node) -> Box<dyn Widget>,
    U: 'static + Fn(&mut dyn Widget, &Node),
{
    fn create(&self, state: &Node) -> Box<dyn Widget> {
        (self.create)(state)
    }

    fn update(&self, widget: &mut dyn Widget, state: &Node) {
        (self.update)(widget, state)
    }
}

/// Builds a handler from a create function and an update function.
pub const fn from_fns<C, U>(create: C, update: U) -> FnHandler<C, U>
where
    C: 'static + Fn(&Node) -> Box<dyn Widget>,
    U: 'static + Fn(&mut dyn Widget, &Node),
{
    FnHandler { create, update }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker;
    impl Widget for Marker {}

    fn marker_handler() -> impl TypeHandler {
        from_fns(|_state| Box::new(Marker) as Box<dyn Widget>, |_, _| {})
    }

    #[test]
    fn lookup_finds_registered_kinds() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());

        registry.register("label", marker_handler());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&Kind::new("label")));
        assert!(registry.get(&Kind::new("panel")).is_none());
    }

    #[test]
    #[should_panic(expected = "already registered for kind `label`")]
    fn duplicate_registration_is_rejected() {
        let mut registry = HandlerRegistry::new();
        registry.register("label", marker_handler());
        registry.register("label", marker_handler());
    }
}
