use crate::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use theta_types::{EntityRecord, Handle};

/// The registry's allocation table at one instant.
///
/// `entities` are ordered by handle; `freed` keeps reuse order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub next: u32,
    pub freed: Vec<Handle>,
    pub entities: Vec<EntityRecord>,
}

impl Snapshot {
    #[must_use]
    pub fn new(next: u32, freed: Vec<Handle>, entities: Vec<EntityRecord>) -> Self {
        Self {
            next,
            freed,
            entities,
        }
    }

    /// Number of live entities.
    #[must_use]
    pub fn held(&self) -> usize {
        self.entities.len()
    }

    /// Looks up a record by handle.
    #[must_use]
    pub fn record(&self, handle: Handle) -> Option<&EntityRecord> {
        self.entities
            .binary_search_by_key(&handle, |r| r.handle)
            .ok()
            .map(|i| &self.entities[i])
    }

    /// Checks that every handle below `next` is exactly one of held or freed.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.next == Handle::NULL_RAW {
            return Err(RegistryError::InvalidSnapshot(
                "next handle reaches the null sentinel".into(),
            ));
        }

        let mut held = HashSet::with_capacity(self.entities.len());
        for record in &self.entities {
            let handle = record.handle;
            if handle.get() >= self.next {
                return Err(RegistryError::InvalidSnapshot(format!(
                    "entity {handle} is beyond next handle {}",
                    self.next
                )));
            }
            if !held.insert(handle) {
                return Err(RegistryError::InvalidSnapshot(format!(
                    "entity {handle} appears twice"
                )));
            }
        }

        let mut freed = HashSet::with_capacity(self.freed.len());
        for &handle in &self.freed {
            if handle.get() >= self.next {
                return Err(RegistryError::InvalidSnapshot(format!(
                    "freed handle {handle} is beyond next handle {}",
                    self.next
                )));
            }
            if held.contains(&handle) {
                return Err(RegistryError::InvalidSnapshot(format!(
                    "handle {handle} is both held and freed"
                )));
            }
            if !freed.insert(handle) {
                return Err(RegistryError::InvalidSnapshot(format!(
                    "freed handle {handle} appears twice"
                )));
            }
        }

        let accounted = held.len() as u64 + freed.len() as u64;
        if accounted != u64::from(self.next) {
            return Err(RegistryError::InvalidSnapshot(format!(
                "{} held + {} freed does not cover {} handles",
                held.len(),
                freed.len(),
                self.next
            )));
        }
        Ok(())
    }
}
