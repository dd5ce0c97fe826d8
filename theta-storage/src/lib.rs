//! Save files for Theta.
//!
//! Encodes a registry [`Snapshot`](theta_registry::Snapshot) into the binary
//! save format and decodes it back, resolving entity references (including
//! cycles) with a deferred fixup pass. [`SaveStore`] ties the codec to a
//! data directory and a live [`HandleRegistry`](theta_registry::HandleRegistry).

mod config;
mod error;
mod field_codec;
mod format;
mod graph;
mod store;

pub use config::{DATA_DIR_ENV, DEFAULT_RECENT_LIMIT, StoreConfig, default_data_dir};
pub use error::{StorageError, StorageResult};
pub use field_codec::{decode_field, encode_field};
pub use format::{
    ENTITY_HEADER_LEN, EntityHeader, FORMAT_VERSION, FileHeader, HEADER_LEN, MAGIC,
    MAX_ARRAY_LEN, MAX_KIND_DEPTH, MAX_STRING_LEN, SAVE_EXTENSION,
};
pub use graph::{decode_graph, encode_graph};
pub use store::{SaveId, SaveStore, SaveSummary};
