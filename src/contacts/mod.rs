//! Contact lifecycle: shape-pair dispatch, the persistent [`Contact`] and the
//! [`ContactRegistry`] arena that owns them.

pub mod contact;
pub mod dispatch;
pub mod registry;

pub use contact::{Contact, TouchTransition};
pub use dispatch::{CollideFn, ContactKind, DispatchTable, Handler};
pub use registry::{ContactHandle, ContactRegistry};
