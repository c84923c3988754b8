//! Drop command handler.

use color_eyre::Result;

use crate::context::OpContext;

use super::App;

impl App {
    /// Run the drop command.
    pub async fn run_drop(&self) -> Result<()> {
        let ctx = OpContext::background();
        let storage = self.storage(&ctx).await?;

        tracing::info!(
            "Dropping collection {}.{}",
            storage.database_name(),
            storage.collection_name()
        );
        storage
            .drop_all(&ctx)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Drop failed: {}", e))?;

        Ok(())
    }
}
