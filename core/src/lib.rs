//! # `reflow-core`
//!
//! Observable state-tree primitives for the reflow reconciliation engine.
//!
//! This crate provides the declarative side of reflow: a mutable tree of
//! [`Node`]s carrying a [`Kind`], an attribute map of [`Value`]s, and an
//! ordered child list. Every mutation is announced synchronously through the
//! [`TreeObserver`] interface, so a consumer subscribed at the root observes
//! every change in the tree and can mirror it into whatever live structure it
//! maintains.
//!
//! Nodes are single-threaded shared handles (`Rc`-backed); cloning a `Node`
//! clones the handle, not the subtree. The crate is `no_std` + `alloc`
//! compatible, with a default `std` feature.
//!
//! # Example
//!
//! ```
//! use reflow_core::{Key, Node};
//!
//! let root = Node::with_identity("panel", "root");
//! let child = Node::with_identity("label", "greeting");
//! child.set_attribute("text", "Hello!");
//! root.append_child(child);
//!
//! assert_eq!(root.child_count(), 1);
//! assert_eq!(root.child(0).unwrap().identity(), Some(Key::new("greeting")));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod id;
pub mod node;
pub mod observer;
pub mod value;

#[doc(inline)]
pub use id::{Key, Kind};
#[doc(inline)]
pub use node::{IDENTITY_PROPERTY, Node};
#[doc(inline)]
pub use observer::{Subscription, TreeObserver};
#[doc(inline)]
pub use value::Value;
