use crate::{ModelResult, Schema};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use theta_types::{EntityRecord, FieldValue, Handle, TypeTag};

/// A persisted domain object.
///
/// The handle is assigned once, when the registry creates the entity, and
/// implementors expose it read-only. Field values are produced in schema
/// order and never include the handle.
pub trait Entity: Send + Sync + 'static {
    /// The handle this entity was created under.
    fn handle(&self) -> Handle;

    /// Current field values, in schema order.
    fn save_fields(&self) -> Vec<FieldValue>;
}

/// A concrete, registrable entity type.
pub trait EntityType: Entity + Sized {
    /// Stable tag persisted instead of the type name.
    const TYPE_TAG: TypeTag;
    /// Type name used in errors and catalog listings.
    const NAME: &'static str;

    /// The ordered field list.
    fn schema() -> Schema;

    /// Rebuilds an entity from a record whose fields follow [`Self::schema`].
    fn load(record: EntityRecord) -> ModelResult<Self>;
}

/// A typed, shared entity cell.
pub type SharedEntity<T> = Arc<RwLock<T>>;

/// An entity as held by the registry: one allocation viewed both as
/// `dyn Entity` (for snapshots) and as `dyn Any` (for typed access).
#[derive(Clone)]
pub struct LiveEntity {
    handle: Handle,
    type_tag: TypeTag,
    type_name: &'static str,
    erased: Arc<RwLock<dyn Entity>>,
    typed: Arc<dyn Any + Send + Sync>,
}

impl LiveEntity {
    /// Wraps a freshly built entity.
    pub fn new<T: EntityType>(entity: T) -> Self {
        Self::from_shared(Arc::new(RwLock::new(entity)))
    }

    /// Wraps an existing typed cell without copying it.
    pub fn from_shared<T: EntityType>(cell: SharedEntity<T>) -> Self {
        let handle = cell.read().handle();
        let erased: Arc<RwLock<dyn Entity>> = cell.clone();
        Self {
            handle,
            type_tag: T::TYPE_TAG,
            type_name: T::NAME,
            erased,
            typed: cell,
        }
    }

    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn read(&self) -> RwLockReadGuard<'_, dyn Entity> {
        self.erased.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, dyn Entity> {
        self.erased.write()
    }

    /// Typed view of the cell, if the entity is a `T`.
    #[must_use]
    pub fn downcast<T: EntityType>(&self) -> Option<SharedEntity<T>> {
        Arc::clone(&self.typed).downcast::<RwLock<T>>().ok()
    }

    /// Whether `cell` is this very allocation.
    #[must_use]
    pub fn is_cell<T: EntityType>(&self, cell: &SharedEntity<T>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.typed), Arc::as_ptr(cell))
    }

    /// Captures the entity's current state as a record.
    #[must_use]
    pub fn to_record(&self) -> EntityRecord {
        EntityRecord::new(self.handle, self.type_tag, self.erased.read().save_fields())
    }
}

impl fmt::Debug for LiveEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveEntity")
            .field("handle", &self.handle)
            .field("type_tag", &self.type_tag)
            .field("type_name", &self.type_name)
            .finish()
    }
}
