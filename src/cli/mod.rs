//! CLI module for Mongostore.
//!
//! Subcommands:
//! - `ping`: Check that the server is reachable
//! - `insert`: Insert one JSON object as a timestamped document
//! - `insert-many`: Insert a JSON array of objects as-is
//! - `count`: Count documents in the collection
//! - `drop`: Drop the collection

mod drop;
mod insert;
mod ping;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;

use crate::config::Config;
use crate::context::OpContext;
use crate::storage::BaseStorage;

/// Mongostore - MongoDB collection admin
#[derive(Parser)]
#[command(name = "mongostore")]
#[command(about = "Insert into, inspect and drop MongoDB collections")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database name, overriding configuration
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Collection name, overriding configuration
    #[arg(long, global = true)]
    pub collection: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that the server is reachable
    Ping,

    /// Insert one JSON object, stamping created_at/updated_at
    Insert {
        /// Document as a JSON object
        json: String,
    },

    /// Insert a JSON array of objects without stamping them
    InsertMany {
        /// Path to a file holding a JSON array
        file: PathBuf,
    },

    /// Count documents in the collection
    Count,

    /// Drop the collection and all its documents
    Drop,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Ping => self.run_ping().await,
            Command::Insert { ref json } => self.run_insert(json).await,
            Command::InsertMany { ref file } => self.run_insert_many(file).await,
            Command::Count => self.run_count().await,
            Command::Drop => self.run_drop().await,
        }
    }

    /// Load configuration, apply CLI overrides and connect.
    async fn storage(&self, ctx: &OpContext) -> Result<BaseStorage> {
        let mut config = Config::load()?.mongodb;
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }

        tracing::info!(
            "Using collection {}.{}",
            config.database,
            config.collection
        );

        let storage = BaseStorage::connect(ctx, &config)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;
        Ok(storage)
    }
}
