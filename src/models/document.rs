//! Schemaless model wrapping an arbitrary BSON document.

use bson::Document;
use serde::{Deserialize, Serialize};

use super::base::{BaseModel, HasBaseModel};

/// Field names owned by [`BaseModel`].
const BASE_FIELDS: [&str; 3] = ["_id", "created_at", "updated_at"];

/// A model whose domain fields are an untyped document.
///
/// Used where the shape of stored data is only known at runtime, such as
/// documents read from JSON on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenericDocument {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(flatten)]
    pub fields: Document,
}

impl GenericDocument {
    /// Wraps `fields`, dropping any keys that belong to the base model.
    pub fn new(mut fields: Document) -> Self {
        for key in BASE_FIELDS {
            fields.remove(key);
        }
        Self {
            base: BaseModel::new(),
            fields,
        }
    }
}

impl HasBaseModel for GenericDocument {
    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}
