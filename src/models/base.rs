//! Base model carrying identity and timestamps shared by stored documents.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::StoreError;

/// A document that can be persisted through [`BaseStorage`](crate::storage::BaseStorage).
///
/// Implemented for free by any type that embeds a [`BaseModel`] and
/// implements [`HasBaseModel`].
pub trait Model {
    /// Identifier assigned by the store, `None` before the first insert.
    fn id(&self) -> Option<ObjectId>;

    /// Identifier as 24 lowercase hex characters, or an empty string when
    /// no identifier has been assigned yet.
    fn hex_id(&self) -> String;

    /// Replaces the identifier with the one encoded in `hex`.
    ///
    /// Leaves the current identifier untouched when `hex` is invalid.
    fn set_hex_id(&mut self, hex: &str) -> Result<(), StoreError>;

    /// Sets `created_at` on first call and `updated_at` on every call.
    ///
    /// Performs no I/O. Call it before `insert_many` or any update; `insert_one`
    /// calls it for you.
    fn setup_timestamps(&mut self, clock: &dyn Clock);
}

/// Access to an embedded [`BaseModel`].
pub trait HasBaseModel {
    fn base(&self) -> &BaseModel;
    fn base_mut(&mut self) -> &mut BaseModel;
}

/// Identity and timestamp fields for a stored document.
///
/// Embed it in domain models with `#[serde(flatten)]`:
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Article {
///     #[serde(flatten)]
///     base: BaseModel,
///     title: String,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseModel {
    /// Store identifier, serialized as `_id` and omitted until assigned.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Creation time in Unix seconds, 0 when unset.
    #[serde(default)]
    pub created_at: i64,
    /// Last update time in Unix seconds, 0 when unset.
    #[serde(default)]
    pub updated_at: i64,
}

impl BaseModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a base model with a known identifier.
    pub fn with_id(id: ObjectId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

impl HasBaseModel for BaseModel {
    fn base(&self) -> &BaseModel {
        self
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        self
    }
}

impl<T: HasBaseModel> Model for T {
    fn id(&self) -> Option<ObjectId> {
        self.base().id
    }

    fn hex_id(&self) -> String {
        self.base().id.map(|id| id.to_hex()).unwrap_or_default()
    }

    fn set_hex_id(&mut self, hex: &str) -> Result<(), StoreError> {
        let id = parse_hex_id(hex)?;
        self.base_mut().id = Some(id);
        Ok(())
    }

    fn setup_timestamps(&mut self, clock: &dyn Clock) {
        let now = clock.now_unix();
        let base = self.base_mut();
        if base.created_at == 0 {
            base.created_at = now;
        }
        base.updated_at = now;
    }
}

/// Parses a 24-character hex string into an [`ObjectId`].
///
/// Only the lowercase canonical form produced by the store is accepted.
pub fn parse_hex_id(hex: &str) -> Result<ObjectId, StoreError> {
    if hex.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(StoreError::InvalidIdentifier(hex.to_string()));
    }
    ObjectId::parse_str(hex).map_err(|_| StoreError::InvalidIdentifier(hex.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use chrono::{Duration, Utc};

    fn existing_model() -> (BaseModel, ObjectId) {
        let id = ObjectId::new();
        (BaseModel::with_id(id), id)
    }

    #[test]
    fn test_new_model_has_no_id() {
        let model = BaseModel::new();
        assert_eq!(model.id(), None);
        assert_eq!(model.hex_id(), "");
        assert_eq!(model.created_at, 0);
        assert_eq!(model.updated_at, 0);
    }

    #[test]
    fn test_id_returns_object_id() {
        let (model, id) = existing_model();
        assert_eq!(model.id(), Some(id));
    }

    #[test]
    fn test_hex_id() {
        let (model, id) = existing_model();
        assert_eq!(model.hex_id(), id.to_hex());
        assert_eq!(model.hex_id().len(), 24);
    }

    #[test]
    fn test_set_hex_id() {
        let (mut model, id) = existing_model();
        let new_id = ObjectId::new();

        model.set_hex_id(&new_id.to_hex()).unwrap();

        assert_ne!(model.hex_id(), id.to_hex());
        assert_eq!(model.hex_id(), new_id.to_hex());
    }

    #[test]
    fn test_set_hex_id_round_trips_exact_text() {
        let mut model = BaseModel::new();
        model.set_hex_id("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(model.hex_id(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_set_hex_id_rejects_invalid_input() {
        let (mut model, id) = existing_model();

        for hex in [
            "not-an-id",
            "",
            "507f1f77bcf86cd79943901",
            "507f1f77bcf86cd7994390111",
            "zzzzzzzzzzzzzzzzzzzzzzzz",
            "507F1F77BCF86CD799439011",
        ] {
            let err = model.set_hex_id(hex).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidIdentifier(_)),
                "expected InvalidIdentifier for {:?}",
                hex
            );
            assert_eq!(model.id(), Some(id));
        }
    }

    #[test]
    fn test_setup_timestamps_when_empty() {
        let at = Utc::now() + Duration::hours(1);
        let clock = MockClock::frozen(at);
        let mut model = BaseModel::new();

        model.setup_timestamps(&clock);

        assert_eq!(model.created_at, at.timestamp());
        assert_eq!(model.updated_at, at.timestamp());
    }

    #[test]
    fn test_setup_timestamps_keeps_created_at() {
        let clock = MockClock::new();
        let prev_created_at = Utc::now().timestamp();
        let mut model = BaseModel {
            created_at: prev_created_at,
            updated_at: 0,
            ..BaseModel::default()
        };

        let at = Utc::now() + Duration::hours(1);
        clock.freeze(at);
        model.setup_timestamps(&clock);

        assert_eq!(model.created_at, prev_created_at);
        assert_eq!(model.updated_at, at.timestamp());
        assert!(model.updated_at >= model.created_at);
    }

    #[test]
    fn test_serialize_omits_unset_id() {
        let model = BaseModel::new();
        let doc = bson::to_document(&model).unwrap();
        assert!(!doc.contains_key("_id"));
        assert_eq!(doc.get_i64("created_at").unwrap(), 0);
    }

    #[test]
    fn test_serialize_writes_id_as_object_id() {
        let (model, id) = existing_model();
        let doc = bson::to_document(&model).unwrap();
        assert_eq!(doc.get_object_id("_id").unwrap(), id);
    }
}
