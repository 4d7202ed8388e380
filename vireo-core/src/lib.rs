//! Dependency-tracking reactivity.
//!
//! [`observe`] turns the properties of an [`Object`] into observable slots,
//! each backed by a [`Dep`]. A [`Watcher`] subscribes to every slot it reads
//! while running and re-runs whenever one of them is written with a different
//! value.

pub mod dep;
pub mod observer;
pub mod value;
pub mod watcher;

pub use dep::Dep;
pub use observer::{Observer, observe, observe_object};
pub use value::{Array, Object, Value};
pub use watcher::{MAX_RERUNS, Watcher, WeakWatcher};
