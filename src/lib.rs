//! Mongostore - base models and a typed storage accessor for MongoDB.
//!
//! Models embed a [`BaseModel`](models::BaseModel) for identity and
//! timestamps; [`BaseStorage`](storage::BaseStorage) inserts them into a
//! single collection and translates duplicate-key conflicts into
//! [`StoreError::DuplicateKey`](error::StoreError::DuplicateKey).

pub mod cli;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod storage;

pub use clock::{Clock, MockClock, SystemClock};
pub use context::OpContext;
pub use error::{StoreError, StoreErrorKind};
pub use models::{BaseModel, GenericDocument, HasBaseModel, Model};
pub use storage::BaseStorage;
