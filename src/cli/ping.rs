//! Ping and count command handlers.

use color_eyre::Result;

use crate::context::OpContext;

use super::App;

impl App {
    /// Run the ping command.
    pub async fn run_ping(&self) -> Result<()> {
        let ctx = OpContext::background();
        let storage = self.storage(&ctx).await?;

        storage
            .ping(&ctx)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Ping failed: {}", e))?;

        tracing::info!("MongoDB is reachable");
        println!("ok");
        Ok(())
    }

    /// Run the count command.
    pub async fn run_count(&self) -> Result<()> {
        let ctx = OpContext::background();
        let storage = self.storage(&ctx).await?;

        let count = storage
            .count_documents(&ctx)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Count failed: {}", e))?;

        println!("{}", count);
        Ok(())
    }
}
