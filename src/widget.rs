//! The live-object abstraction handlers produce.

use core::any::Any;
use core::fmt::Debug;

/// A live UI object mirroring one state node.
///
/// reflow never interprets a widget itself; it only stores it inside the
/// live tree and hands it back to the handler that knows its concrete type.
/// Implement this marker on any `'static` type a handler constructs:
///
/// ```
/// use reflow::Widget;
///
/// #[derive(Debug)]
/// struct Button {
///     label: String,
/// }
///
/// impl Widget for Button {}
/// ```
pub trait Widget: Any + Debug {}

impl dyn Widget {
    /// Returns `true` if the widget is of type `T`.
    #[must_use]
    pub fn is<T: Widget>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Borrows the widget as its concrete type, if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Widget>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }

    /// Mutably borrows the widget as its concrete type, if it is a `T`.
    #[must_use]
    pub fn downcast_mut<T: Widget>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut()
    }
}
