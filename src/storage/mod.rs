//! Storage accessors over MongoDB collections.
//!
//! [`BaseStorage`] binds a shared client to one database collection and
//! handles timestamping, identifier write-back and duplicate-key translation
//! for models implementing [`Model`](crate::models::Model).

mod base;

pub use base::BaseStorage;
