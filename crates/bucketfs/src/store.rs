// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Object store contract consumed by the contents layer
//!
//! A [`StoreClient`] hands out [`Container`] handles by name. Containers
//! address objects by flat string keys; the only structure they expose is
//! prefix listing grouped by a delimiter. Everything directory-like is built
//! on top of these primitives in [`crate::listing`] and [`crate::mutation`].

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::Arc;

/// Content type recorded when a writer does not supply one
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Content type for raw bytes
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type of zero-length directory markers
pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

/// Content type of notebook documents
pub const NOTEBOOK_CONTENT_TYPE: &str = "application/x-ipynb+json";

/// Delimiter used for every grouped listing
pub const DELIMITER: &str = "/";

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by a store backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed container name or key; treated like a missing container
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Connection-level failure that is worth retrying
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }

    /// Not-found and invalid names both mean "there is nothing there"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::InvalidName(_))
    }

    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, StoreError::Forbidden(_))
    }
}

impl From<object_store::Error> for StoreError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => StoreError::NotFound(path),
            object_store::Error::PermissionDenied { path, .. }
            | object_store::Error::Unauthenticated { path, .. } => StoreError::Forbidden(path),
            object_store::Error::InvalidPath { source } => {
                StoreError::InvalidName(source.to_string())
            }
            object_store::Error::NotImplemented => {
                StoreError::Unsupported("not implemented by backend".to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Metadata for one stored object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    /// Full key within the container
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

impl ObjectInfo {
    /// Last path segment of the key, ignoring a trailing delimiter
    #[must_use]
    pub fn name(&self) -> &str {
        crate::path::basename(&self.key)
    }
}

/// Result of a grouped prefix listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    /// Objects whose key has no delimiter beyond the prefix
    pub objects: Vec<ObjectInfo>,
    /// Distinct key prefixes up to and including the next delimiter
    pub prefixes: Vec<String>,
}

impl Listing {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.prefixes.is_empty()
    }
}

/// A named namespace of objects
#[async_trait]
pub trait Container: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Metadata for the object at exactly `key`, if any
    async fn head(&self, key: &str) -> StoreResult<Option<ObjectInfo>>;

    /// Metadata and content for the object at exactly `key`, if any
    async fn get(&self, key: &str) -> StoreResult<Option<(ObjectInfo, Bytes)>>;

    /// Objects and sub-prefixes under `prefix`, grouped by `delimiter`,
    /// at most `limit` entries in total
    async fn list(&self, prefix: &str, delimiter: &str, limit: usize) -> StoreResult<Listing>;

    /// Write `data` at `key`, replacing any previous object
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<ObjectInfo>;

    /// Remove the object at `key`; removing a missing object succeeds
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Remove many objects in one request where the backend allows it
    async fn delete_many(&self, keys: &[String]) -> StoreResult<()> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    /// Copy the object at `key` into `dest` under `dest_key`
    async fn copy_to(
        &self,
        key: &str,
        dest: &dyn Container,
        dest_key: &str,
    ) -> StoreResult<ObjectInfo> {
        let (info, data) = self
            .get(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", self.name(), key)))?;
        dest.put(dest_key, data, &info.content_type).await
    }

    /// Move an object within this container
    async fn rename(&self, key: &str, new_key: &str) -> StoreResult<ObjectInfo>;
}

/// Entry point to a store: resolves, creates and removes containers
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Handle for an existing container; `NotFound` if it does not exist
    async fn container(&self, name: &str) -> StoreResult<Arc<dyn Container>>;

    /// Names of every container visible to this client
    async fn list_containers(&self) -> StoreResult<Vec<String>>;

    async fn create_container(&self, name: &str) -> StoreResult<Arc<dyn Container>>;

    /// Remove a container together with its contents
    async fn delete_container(&self, name: &str) -> StoreResult<()>;
}
