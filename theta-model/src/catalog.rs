//! Static type catalog.
//!
//! Built once at startup by explicit registration of every concrete entity
//! type and value blob. Maps type tags to constructors and schemas so the
//! codec can rebuild entities without runtime type discovery.

use crate::{EntityType, LiveEntity, ModelError, ModelResult, Schema, ValueBlob};
use std::collections::HashMap;
use theta_types::{BlobId, EntityRecord, TypeTag};

/// Largest field count an entity header can carry.
pub const MAX_FIELDS: usize = u8::MAX as usize;

/// Rebuilds an entity from its record.
pub type Constructor = fn(EntityRecord) -> ModelResult<LiveEntity>;

/// A registered entity type.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub tag: TypeTag,
    pub name: &'static str,
    pub schema: Schema,
    construct: Constructor,
}

impl CatalogEntry {
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.schema.len()
    }

    /// Checks the record against the schema and builds the entity.
    pub fn construct(&self, record: EntityRecord) -> ModelResult<LiveEntity> {
        self.schema.check(self.name, &record.fields)?;
        (self.construct)(record)
    }
}

/// A registered value blob layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobSpec {
    pub id: BlobId,
    pub name: &'static str,
    pub size: usize,
}

/// Type tag → constructor + schema, and blob id → layout.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<TypeTag, CatalogEntry>,
    blobs: HashMap<BlobId, BlobSpec>,
}

impl TypeCatalog {
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Looks up a type by tag.
    pub fn entry(&self, tag: TypeTag) -> ModelResult<&CatalogEntry> {
        self.types.get(&tag).ok_or(ModelError::UnknownTypeTag(tag))
    }

    /// Looks up a blob layout by id.
    pub fn blob(&self, id: BlobId) -> ModelResult<&BlobSpec> {
        self.blobs.get(&id).ok_or(ModelError::UnknownBlob(id))
    }

    /// Rebuilds an entity through its registered constructor.
    pub fn construct(&self, record: EntityRecord) -> ModelResult<LiveEntity> {
        self.entry(record.type_tag)?.construct(record)
    }

    #[must_use]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.types.contains_key(&tag)
    }

    /// Registered entity types, ordered by tag.
    #[must_use]
    pub fn entries(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<_> = self.types.values().collect();
        entries.sort_by_key(|e| e.tag);
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn construct<T: EntityType>(record: EntityRecord) -> ModelResult<LiveEntity> {
    let expected = record.handle;
    let entity = T::load(record)?;
    let found = entity.handle();
    if found != expected {
        return Err(ModelError::HandleMismatch {
            type_name: T::NAME,
            expected,
            found,
        });
    }
    Ok(LiveEntity::new(entity))
}

/// Collects registrations; [`CatalogBuilder::build`] validates them.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    types: HashMap<TypeTag, CatalogEntry>,
    blobs: HashMap<BlobId, BlobSpec>,
}

impl CatalogBuilder {
    /// Registers an entity type. Fails on a reserved or duplicate tag.
    pub fn register<T: EntityType>(mut self) -> ModelResult<Self> {
        let tag = T::TYPE_TAG;
        if tag.is_reserved() {
            return Err(ModelError::ReservedTypeTag { tag, name: T::NAME });
        }
        if let Some(existing) = self.types.get(&tag) {
            return Err(ModelError::DuplicateTypeTag {
                tag,
                first: existing.name,
                second: T::NAME,
            });
        }
        let schema = T::schema();
        if schema.len() > MAX_FIELDS {
            return Err(ModelError::TooManyFields {
                type_name: T::NAME,
                count: schema.len(),
                max: MAX_FIELDS,
            });
        }
        self.types.insert(
            tag,
            CatalogEntry {
                tag,
                name: T::NAME,
                schema,
                construct: construct::<T>,
            },
        );
        Ok(self)
    }

    /// Registers a value blob layout. Fails on a duplicate id.
    pub fn register_blob<B: ValueBlob>(mut self) -> ModelResult<Self> {
        if let Some(existing) = self.blobs.get(&B::BLOB_ID) {
            return Err(ModelError::DuplicateBlobId {
                id: B::BLOB_ID,
                first: existing.name,
                second: B::NAME,
            });
        }
        self.blobs.insert(
            B::BLOB_ID,
            BlobSpec {
                id: B::BLOB_ID,
                name: B::NAME,
                size: B::SIZE,
            },
        );
        Ok(self)
    }

    /// Finishes the catalog. Every blob kind named by a schema must be registered.
    pub fn build(self) -> ModelResult<TypeCatalog> {
        for entry in self.types.values() {
            let mut missing = None;
            for kind in entry.schema.kinds() {
                kind.visit_blobs(&mut |id| {
                    if missing.is_none() && !self.blobs.contains_key(&id) {
                        missing = Some(id);
                    }
                });
            }
            if let Some(id) = missing {
                return Err(ModelError::UnknownBlob(id));
            }
        }
        Ok(TypeCatalog {
            types: self.types,
            blobs: self.blobs,
        })
    }
}
