//! Insert command handlers.

use std::path::Path;

use bson::Document;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde_json::{Map, Value as JsonValue};

use crate::context::OpContext;
use crate::models::GenericDocument;

use super::App;

type JsonObject = Map<String, JsonValue>;

impl App {
    /// Run the insert command for a single JSON object.
    pub async fn run_insert(&self, json: &str) -> Result<()> {
        let object: JsonObject =
            serde_json::from_str(json).wrap_err("Expected a JSON object")?;
        let mut document = GenericDocument::new(to_document(&object)?);

        let ctx = OpContext::background();
        let storage = self.storage(&ctx).await?;

        let id = storage
            .insert_one(&ctx, &mut document, None)
            .await
            .map_err(|e| eyre!("Insert failed: {}", e))?;

        tracing::info!(id = %id, "Inserted document");
        println!("{}", id);
        Ok(())
    }

    /// Run the insert-many command for a file holding a JSON array.
    pub async fn run_insert_many(&self, file: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(file)
            .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
        let objects: Vec<JsonObject> =
            serde_json::from_str(&contents).wrap_err("Expected a JSON array of objects")?;
        let documents = objects
            .iter()
            .map(to_document)
            .collect::<Result<Vec<_>>>()?;

        let ctx = OpContext::background();
        let storage = self.storage(&ctx).await?;

        let ids = storage
            .insert_many(&ctx, documents, None)
            .await
            .map_err(|e| eyre!("Insert failed: {}", e))?;

        tracing::info!(count = ids.len(), "Inserted documents");
        for id in ids {
            println!("{}", id);
        }
        Ok(())
    }
}

fn to_document(object: &JsonObject) -> Result<Document> {
    bson::to_document(object).map_err(|e| eyre!("Failed to encode document: {}", e))
}
