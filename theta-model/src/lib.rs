//! Core entity model for Theta.
//!
//! Defines the contract every persisted type implements and the static
//! tables built from those types:
//! - [`Entity`] / [`EntityType`]: handle, type tag, ordered field schema,
//!   encode/decode of the type's own field values
//! - [`ValueBlob`]: fixed-layout values with their own byte codec
//! - [`Schema`] / [`FieldSpec`]: the ordered field list of a type
//! - [`TypeCatalog`]: type tag → constructor + schema, built once at startup
//! - [`LiveEntity`]: a shared, lockable entity cell as held by the registry
//! - [`FieldReader`]: typed, in-order access to an [`EntityRecord`]'s fields
//!
//! [`EntityRecord`]: theta_types::EntityRecord

mod blob;
mod catalog;
mod entity;
mod error;
mod reader;
mod schema;

pub use blob::{BlobReader, BlobWriter, ValueBlob};
pub use catalog::{BlobSpec, CatalogBuilder, CatalogEntry, Constructor, TypeCatalog};
pub use entity::{Entity, EntityType, LiveEntity, SharedEntity};
pub use error::{ModelError, ModelResult};
pub use reader::FieldReader;
pub use schema::{FieldSpec, Schema};
