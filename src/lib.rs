#![doc = include_str!("../README.md")]

pub mod builder;
pub mod handler;
pub mod instance;
pub mod widget;

#[doc(inline)]
pub use builder::Reconciler;
#[doc(inline)]
pub use handler::{HandlerRegistry, TypeHandler};
#[doc(inline)]
pub use instance::{Instance, InstanceId};
#[doc(inline)]
pub use widget::Widget;

#[doc(inline)]
pub use reflow_core::{IDENTITY_PROPERTY, Key, Kind, Node, Subscription, TreeObserver, Value};
