use crate::{RegistryError, RegistryResult, Snapshot, Tracked};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use theta_model::{EntityType, LiveEntity, ModelError, SharedEntity, TypeCatalog};
use theta_types::Handle;
use tracing::{debug, info};

/// Read-only counters for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// High-water mark: the handle issued when nothing is free.
    pub next: u32,
    /// Live handles.
    pub held: usize,
    /// Handles waiting for reuse.
    pub freed: usize,
}

#[derive(Default)]
struct RegistryState {
    held: HashMap<Handle, LiveEntity>,
    freed: VecDeque<Handle>,
    next: u32,
}

impl RegistryState {
    /// The handle the next assign will use. Does not mutate.
    fn peek(&self) -> RegistryResult<Handle> {
        let handle = match self.freed.front() {
            Some(&handle) => handle,
            None if self.next == Handle::NULL_RAW => {
                return Err(RegistryError::HandleSpaceExhausted);
            }
            None => Handle::new(self.next),
        };
        if self.held.contains_key(&handle) {
            return Err(RegistryError::TrackerDesync { handle });
        }
        Ok(handle)
    }

    /// Consumes the handle returned by [`Self::peek`].
    fn commit(&mut self, handle: Handle, entity: LiveEntity) {
        if self.freed.front() == Some(&handle) {
            self.freed.pop_front();
        } else {
            self.next += 1;
        }
        self.held.insert(handle, entity);
    }

    fn free(&mut self, handle: Handle) -> RegistryResult<LiveEntity> {
        let entity = self
            .held
            .remove(&handle)
            .ok_or(RegistryError::DoubleFree { handle })?;
        self.freed.push_back(handle);
        Ok(entity)
    }

    fn stats(&self) -> RegistryStats {
        RegistryStats {
            next: self.next,
            held: self.held.len(),
            freed: self.freed.len(),
        }
    }

    fn clear(&mut self) {
        self.held.clear();
        self.freed.clear();
        self.next = 0;
    }

    fn snapshot(&self) -> Snapshot {
        let mut handles: Vec<Handle> = self.held.keys().copied().collect();
        handles.sort_unstable();
        let entities = handles
            .into_iter()
            .map(|handle| self.held[&handle].to_record())
            .collect();
        Snapshot::new(self.next, self.freed.iter().copied().collect(), entities)
    }

    fn restore(&mut self, snapshot: Snapshot, catalog: &TypeCatalog) -> RegistryResult<()> {
        snapshot.validate()?;
        let mut held = HashMap::with_capacity(snapshot.entities.len());
        for record in snapshot.entities {
            let entity = catalog.construct(record)?;
            held.insert(entity.handle(), entity);
        }
        self.held = held;
        self.freed = snapshot.freed.into();
        self.next = snapshot.next;
        Ok(())
    }
}

/// Allocates handles and owns the handle → entity table.
///
/// Cheap to clone; clones share the same table. Every operation takes the
/// registry lock for its duration, so assign and free are safe from any
/// number of threads.
#[derive(Clone, Default)]
pub struct HandleRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl HandleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a handle and stores the entity `build` creates for it.
    ///
    /// Reuses the oldest freed handle if there is one, otherwise issues
    /// `next`. `build` runs under the registry lock and must not call back
    /// into the registry.
    ///
    /// The returned guard frees the handle when dropped; use
    /// [`Tracked::detach`] to leave the entity with the registry.
    pub fn assign<T, F>(&self, build: F) -> RegistryResult<Tracked<T>>
    where
        T: EntityType,
        F: FnOnce(Handle) -> T,
    {
        let mut state = self.state.lock();
        let handle = state.peek()?;
        let entity = build(handle);
        if entity.handle() != handle {
            return Err(ModelError::HandleMismatch {
                type_name: T::NAME,
                expected: handle,
                found: entity.handle(),
            }
            .into());
        }
        let cell: SharedEntity<T> = Arc::new(parking_lot::RwLock::new(entity));
        state.commit(handle, LiveEntity::from_shared(cell.clone()));
        debug!("Assigned {} to {}", handle, T::NAME);
        drop(state);
        Ok(Tracked::new(handle, cell, self.clone()))
    }

    /// Releases a handle for reuse and returns the entity it held.
    pub fn free(&self, handle: Handle) -> RegistryResult<LiveEntity> {
        let entity = self.state.lock().free(handle)?;
        debug!("Freed {} ({})", handle, entity.type_name());
        Ok(entity)
    }

    /// Frees `handle` only while it still holds `cell`.
    pub(crate) fn free_cell<T: EntityType>(
        &self,
        handle: Handle,
        cell: &SharedEntity<T>,
    ) -> RegistryResult<()> {
        let mut state = self.state.lock();
        match state.held.get(&handle) {
            Some(live) if live.is_cell(cell) => {
                state.free(handle)?;
                debug!("Released {} ({})", handle, T::NAME);
                Ok(())
            }
            _ => Err(RegistryError::DoubleFree { handle }),
        }
    }

    /// The entity held under `handle`, if any.
    #[must_use]
    pub fn try_get(&self, handle: Handle) -> Option<LiveEntity> {
        self.state.lock().held.get(&handle).cloned()
    }

    /// Typed access to the entity under `handle`. `None` if the handle is
    /// not held or holds a different type.
    #[must_use]
    pub fn get<T: EntityType>(&self, handle: Handle) -> Option<SharedEntity<T>> {
        self.try_get(handle)?.downcast::<T>()
    }

    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.state.lock().held.contains_key(&handle)
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.state.lock().stats()
    }

    /// Live entities ordered by handle.
    #[must_use]
    pub fn live_entities(&self) -> Vec<LiveEntity> {
        let state = self.state.lock();
        let mut entities: Vec<LiveEntity> = state.held.values().cloned().collect();
        entities.sort_unstable_by_key(LiveEntity::handle);
        entities
    }

    /// Empties the table and resets `next` to zero.
    pub fn clear_state(&self) {
        self.state.lock().clear();
        debug!("Registry state cleared");
    }

    /// A consistent copy of the allocation table.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Replaces the table with `snapshot`, rebuilding each entity through
    /// `catalog`. On error the registry is unchanged.
    pub fn restore(&self, snapshot: Snapshot, catalog: &TypeCatalog) -> RegistryResult<()> {
        self.lock().restore(snapshot, catalog)
    }

    /// Takes the registry-wide exclusive section.
    ///
    /// Assign and free on other threads block until the guard is dropped.
    /// Entity cells are still reachable through outstanding [`Tracked`]
    /// guards; a caller holding an entity write lock while waiting on the
    /// registry can deadlock a concurrent snapshot.
    pub fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            state: self.state.lock(),
        }
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Exclusive access to the registry for the length of a save or load.
pub struct RegistryGuard<'a> {
    state: MutexGuard<'a, RegistryState>,
}

impl RegistryGuard<'_> {
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Builds every entity into a fresh table, then swaps it in. Nothing
    /// changes unless every record constructs.
    pub fn restore(&mut self, snapshot: Snapshot, catalog: &TypeCatalog) -> RegistryResult<()> {
        let (next, held, freed) = (
            snapshot.next,
            snapshot.entities.len(),
            snapshot.freed.len(),
        );
        self.state.restore(snapshot, catalog)?;
        info!(
            "Restored registry: {} held, {} freed, next {}",
            held, freed, next
        );
        Ok(())
    }

    pub fn clear(&mut self) {
        self.state.clear();
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.state.stats()
    }
}
