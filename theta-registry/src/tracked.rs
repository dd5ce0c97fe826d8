use crate::{HandleRegistry, RegistryError, RegistryResult};
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use theta_model::{EntityType, SharedEntity};
use theta_types::Handle;
use tracing::{error, warn};

/// Owning guard for an assigned entity.
///
/// Dropping the guard frees its handle. A guard whose slot has since been
/// freed or taken over by another entity (for example after a load) leaves
/// that slot alone.
pub struct Tracked<T: EntityType> {
    handle: Handle,
    cell: SharedEntity<T>,
    registry: HandleRegistry,
    armed: bool,
}

impl<T: EntityType> Tracked<T> {
    pub(crate) fn new(handle: Handle, cell: SharedEntity<T>, registry: HandleRegistry) -> Self {
        Self {
            handle,
            cell,
            registry,
            armed: true,
        }
    }

    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// The shared cell, for handing to code that outlives this guard.
    #[must_use]
    pub fn shared(&self) -> SharedEntity<T> {
        self.cell.clone()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.cell.read()
    }

    /// Locks the entity for writing.
    ///
    /// Do not call into the registry (`get`, `try_get`, `assign`, `free`)
    /// while the returned guard is alive: a concurrent save holds the
    /// registry lock while it waits to read this entity, and the two
    /// deadlock. Copy out the handles you need, drop the guard, then
    /// follow them.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.cell.write()
    }

    /// Frees the handle now. Fails with `DoubleFree` if the slot no longer
    /// holds this entity.
    pub fn release(mut self) -> RegistryResult<()> {
        self.armed = false;
        self.registry.free_cell(self.handle, &self.cell)
    }

    /// Leaves the entity with the registry. It stays live until freed by
    /// handle.
    #[must_use]
    pub fn detach(mut self) -> Handle {
        self.armed = false;
        self.handle
    }
}

impl<T: EntityType> Drop for Tracked<T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.registry.free_cell(self.handle, &self.cell) {
            Ok(()) => {}
            Err(RegistryError::DoubleFree { handle }) => {
                warn!("Stale {} guard for {}; slot left untouched", T::NAME, handle);
            }
            Err(e) => {
                error!("Failed to release {} {}: {}", T::NAME, self.handle, e);
            }
        }
    }
}

impl<T: EntityType> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("type", &T::NAME)
            .field("handle", &self.handle)
            .field("armed", &self.armed)
            .finish()
    }
}
