//! Reconciler and root instance.
//!
//! [`App`] ties the pieces together: it observes its data, compiles the
//! mount target into a template and keeps one watcher that binds and patches
//! the surface whenever a read data slot changes. [`Surface`] is the seam to
//! the backend; [`MemorySurface`] is the in-memory one.

pub mod app;
pub mod error;
pub mod memory;
pub mod patch;
pub mod surface;

pub use app::{App, Options, Target};
pub use error::{AppError, PatchError};
pub use memory::{MemorySurface, NodeData, Op};
pub use patch::{PatchReport, Reconciler, Rendered, patch};
pub use surface::Surface;
