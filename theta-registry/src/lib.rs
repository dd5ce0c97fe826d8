//! Handle registry for Theta.
//!
//! Hands out small integer handles to live entities, recycles released
//! handles in FIFO order, and exposes the whole allocation table as a
//! consistent [`Snapshot`] for saving. Restoring a snapshot rebuilds every
//! entity through the [`TypeCatalog`](theta_model::TypeCatalog).
//!
//! All registry state sits behind one lock. The same lock is the exclusive
//! section held for the whole of a save or load (see [`HandleRegistry::lock`]).

mod error;
mod registry;
mod snapshot;
mod tracked;

pub use error::{RegistryError, RegistryResult};
pub use registry::{HandleRegistry, RegistryGuard, RegistryStats};
pub use snapshot::Snapshot;
pub use tracked::Tracked;
