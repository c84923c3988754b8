//! Models persisted through the storage accessor.

mod base;
mod document;

pub use base::{parse_hex_id, BaseModel, HasBaseModel, Model};
pub use document::GenericDocument;
