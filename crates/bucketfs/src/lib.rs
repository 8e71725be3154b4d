// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Directory semantics over container/key object stores
//!
//! `bucketfs` lets a path-oriented document editor read, write, list, move
//! and checkpoint files in an object store that only knows flat keys inside
//! named containers. The entry point is [`ContentsManager`]:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use bucketfs::{ContentsManager, MemoryStore, SaveModel};
//! use std::sync::Arc;
//!
//! let manager = ContentsManager::builder(Arc::new(MemoryStore::new())).build()?;
//! _ = manager.save(SaveModel::directory(), "bucket").await?;
//! _ = manager.save(SaveModel::text("hello"), "bucket/notes/a.txt").await?;
//! _ = manager.get("bucket/notes", true, None, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod checkpoints;
pub mod codec;
pub mod config;
pub mod containers;
pub mod error;
pub mod glob;
pub mod listing;
pub mod manager;
pub mod memory;
pub mod model;
pub mod mutation;
pub mod objstore;
pub mod path;
pub mod retry;
pub mod store;

pub use checkpoints::{Checkpoint, CheckpointLocation};
pub use codec::{JsonNotebookCodec, NotebookCodec};
pub use config::{ConfigError, ContentsConfig, RetryConfig};
pub use error::{Error, Result};
pub use manager::{ContentsManager, ContentsManagerBuilder, HookError, PostSaveHook};
pub use memory::MemoryStore;
pub use model::{Content, ContentKind, ContentModel, Format, SaveModel};
pub use objstore::{LocalStoreClient, ObjectStoreContainer};
pub use store::{Container, Listing, ObjectInfo, StoreClient, StoreError};

#[cfg(test)]
mod tests;
