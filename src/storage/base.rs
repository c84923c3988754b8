//! Storage accessor bound to a single database collection.

use std::sync::Arc;

use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, IndexOptions, InsertManyOptions, InsertOneOptions};
use mongodb::{Client, Collection, IndexModel};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::StorageConfig;
use crate::context::OpContext;
use crate::error::{command_code, StoreError, NAMESPACE_NOT_FOUND};
use crate::models::{parse_hex_id, Model};

/// Storage accessor for one collection.
///
/// Holds a long-lived [`Client`]. The driver pools connections internally,
/// so clones of this type share them and may be used concurrently. The client
/// is never shut down here; its lifetime belongs to the caller.
///
/// # Example
///
/// ```ignore
/// let ctx = OpContext::background();
/// let storage = BaseStorage::new(&ctx, "mongodb://localhost:27017", "app", "articles").await?;
///
/// let mut article = Article::new("Hello");
/// let id = storage.insert_one(&ctx, &mut article, None).await?;
/// assert_eq!(article.hex_id(), id);
/// ```
#[derive(Clone)]
pub struct BaseStorage {
    client: Client,
    db_name: String,
    collection_name: String,
    clock: Arc<dyn Clock>,
}

impl BaseStorage {
    /// Creates a storage accessor for `collection_name` in `db_name`.
    ///
    /// Parses the URI and builds the client; does not contact the server.
    /// A malformed URI fails with [`StoreError::Connection`].
    pub async fn new(
        ctx: &OpContext,
        uri: &str,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, StoreError> {
        Self::connect(ctx, &StorageConfig::new(uri, db_name, collection_name)).await
    }

    /// Creates a storage accessor from configuration.
    ///
    /// When `verify_connection` is set the server is pinged once and an
    /// unreachable server fails construction with [`StoreError::Connection`].
    pub async fn connect(ctx: &OpContext, config: &StorageConfig) -> Result<Self, StoreError> {
        let mut options = ctx
            .run(async {
                ClientOptions::parse(&config.uri)
                    .await
                    .map_err(StoreError::Connection)
            })
            .await?;

        if let Some(app_name) = &config.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(timeout) = config.server_selection_timeout() {
            options.server_selection_timeout = Some(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            options.connect_timeout = Some(timeout);
        }

        let client = Client::with_options(options).map_err(StoreError::Connection)?;

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "Created MongoDB client"
        );

        let storage = Self {
            client,
            db_name: config.database.clone(),
            collection_name: config.collection.clone(),
            clock: Arc::new(SystemClock),
        };

        if config.verify_connection {
            storage.ping(ctx).await?;
        }

        Ok(storage)
    }

    /// Replaces the clock used to stamp models on insert.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database_name(&self) -> &str {
        &self.db_name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Checks that the server is reachable.
    pub async fn ping(&self, ctx: &OpContext) -> Result<(), StoreError> {
        ctx.run(async {
            self.client
                .database("admin")
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(StoreError::Connection)
        })
        .await?;

        tracing::debug!(database = %self.db_name, "Pinged MongoDB");
        Ok(())
    }

    /// Handle to the configured collection. No I/O.
    pub fn collection(&self) -> Collection<Document> {
        self.typed_collection()
    }

    /// Handle to the configured collection, decoding documents as `T`.
    pub fn typed_collection<T: Send + Sync>(&self) -> Collection<T> {
        self.client
            .database(&self.db_name)
            .collection(&self.collection_name)
    }

    /// Inserts one model and returns its new identifier in hex form.
    ///
    /// Stamps the model's timestamps before encoding it, and writes the
    /// store-generated identifier back into the model on success.
    pub async fn insert_one<M>(
        &self,
        ctx: &OpContext,
        model: &mut M,
        options: Option<InsertOneOptions>,
    ) -> Result<String, StoreError>
    where
        M: Model + Serialize,
    {
        model.setup_timestamps(self.clock.as_ref());

        let document = bson::to_document(&*model)?;

        let result = ctx
            .run(async move {
                self.collection()
                    .insert_one(document)
                    .with_options(options)
                    .await
                    .map_err(StoreError::from_write)
            })
            .await?;

        let hex_id = hex_from_bson(&result.inserted_id)?;
        model.set_hex_id(&hex_id)?;

        tracing::debug!(
            database = %self.db_name,
            collection = %self.collection_name,
            id = %hex_id,
            "Inserted document"
        );

        Ok(hex_id)
    }

    /// Inserts a batch of pre-encoded documents.
    ///
    /// Timestamps are not touched; stamp models before encoding them. Returns
    /// identifiers in batch order. If the store reports an identifier that is
    /// not an ObjectId, no identifiers are returned even though the documents
    /// were written.
    pub async fn insert_many(
        &self,
        ctx: &OpContext,
        documents: Vec<Document>,
        options: Option<InsertManyOptions>,
    ) -> Result<Vec<String>, StoreError> {
        ctx.check()?;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let result = ctx
            .run(async move {
                self.collection()
                    .insert_many(documents)
                    .with_options(options)
                    .await
                    .map_err(StoreError::from_write)
            })
            .await?;

        let mut inserted: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        inserted.sort_by_key(|(index, _)| *index);

        let hex_ids = inserted
            .iter()
            .map(|(_, id)| hex_from_bson(id))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            database = %self.db_name,
            collection = %self.collection_name,
            count = hex_ids.len(),
            "Inserted documents"
        );

        Ok(hex_ids)
    }

    /// Drops the collection with all its documents and indexes.
    ///
    /// Dropping a collection that does not exist succeeds.
    pub async fn drop_all(&self, ctx: &OpContext) -> Result<(), StoreError> {
        ctx.run(async {
            match self.collection().drop().await {
                Ok(()) => Ok(()),
                Err(err) if command_code(&err) == Some(NAMESPACE_NOT_FOUND) => Ok(()),
                Err(err) => Err(StoreError::Store(err)),
            }
        })
        .await?;

        tracing::info!(
            database = %self.db_name,
            collection = %self.collection_name,
            "Dropped collection"
        );
        Ok(())
    }

    /// Creates a unique ascending index on `field`, returning the index name.
    pub async fn create_unique_index(
        &self,
        ctx: &OpContext,
        field: &str,
    ) -> Result<String, StoreError> {
        let mut keys = Document::new();
        keys.insert(field, 1);

        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();

        let result = ctx
            .run(async move {
                self.collection()
                    .create_index(index)
                    .await
                    .map_err(StoreError::Store)
            })
            .await?;

        tracing::debug!(
            collection = %self.collection_name,
            index = %result.index_name,
            "Created unique index"
        );
        Ok(result.index_name)
    }

    /// Number of documents in the collection.
    pub async fn count_documents(&self, ctx: &OpContext) -> Result<u64, StoreError> {
        ctx.run(async {
            self.collection()
                .count_documents(doc! {})
                .await
                .map_err(StoreError::Store)
        })
        .await
    }

    /// Finds a document by its hex identifier, decoding it as `T`.
    pub async fn find_by_hex_id<T>(
        &self,
        ctx: &OpContext,
        hex_id: &str,
    ) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let id = parse_hex_id(hex_id)?;

        let document = ctx
            .run(async move {
                self.collection()
                    .find_one(doc! { "_id": id })
                    .await
                    .map_err(StoreError::Store)
            })
            .await?;

        document.map(decode).transpose()
    }

    /// Reads every document in the collection, decoding each as `T`.
    pub async fn find_all<T>(&self, ctx: &OpContext) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let documents: Vec<Document> = ctx
            .run(async {
                let cursor = self
                    .collection()
                    .find(doc! {})
                    .await
                    .map_err(StoreError::Store)?;
                cursor.try_collect().await.map_err(StoreError::Store)
            })
            .await?;

        documents.into_iter().map(decode).collect()
    }
}

/// Decodes a stored document; shape mismatches become
/// [`StoreError::Deserialization`].
fn decode<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(bson::from_document(document)?)
}

/// Hex form of a store-reported identifier, which must be an ObjectId.
fn hex_from_bson(id: &Bson) -> Result<String, StoreError> {
    match id {
        Bson::ObjectId(oid) => Ok(oid.to_hex()),
        other => Err(StoreError::InvalidIdentifier(format!(
            "expected ObjectId, got {:?}",
            other.element_type()
        ))),
    }
}
