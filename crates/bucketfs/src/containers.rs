// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Container handle cache

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::store::{Container, StoreClient};
use diagnostics::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Resolves container names to handles, remembering the handles it has seen
pub struct ContainerDirectory {
    client: Arc<dyn StoreClient>,
    cache: Mutex<HashMap<String, Arc<dyn Container>>>,
    enabled: bool,
    retry: RetryConfig,
}

impl std::fmt::Debug for ContainerDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerDirectory")
            .field("enabled", &self.enabled)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ContainerDirectory {
    pub fn new(client: Arc<dyn StoreClient>, enabled: bool, retry: RetryConfig) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
            enabled,
            retry,
        }
    }

    /// Handle for `name`
    ///
    /// A missing container is `Ok(None)`, or [`Error::NotFound`] when
    /// `must_exist`. Forbidden and other store failures propagate.
    pub async fn resolve(&self, name: &str, must_exist: bool) -> Result<Option<Arc<dyn Container>>> {
        if self.enabled
            && let Some(handle) = self.cache.lock().await.get(name)
        {
            return Ok(Some(handle.clone()));
        }

        let client = self.client.as_ref();
        let fetched = with_retry(&self.retry, "container lookup", || client.container(name)).await;
        match fetched {
            Ok(handle) => {
                if self.enabled {
                    _ = self
                        .cache
                        .lock()
                        .await
                        .insert(name.to_string(), handle.clone());
                }
                Ok(Some(handle))
            }
            Err(e) if e.is_not_found() => {
                debug!("container {name} not found", name: name);
                if must_exist {
                    Err(Error::not_found(name))
                } else {
                    Ok(None)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the cached handle for `name`, if any
    pub async fn invalidate(&self, name: &str) {
        if self.cache.lock().await.remove(name).is_some() {
            debug!("evicted container {name}", name: name);
        }
    }

    /// Every container name, for the root listing
    pub async fn list_names(&self) -> Result<Vec<String>> {
        let client = self.client.as_ref();
        Ok(with_retry(&self.retry, "container listing", || client.list_containers()).await?)
    }

    pub async fn create(&self, name: &str) -> Result<Arc<dyn Container>> {
        let client = self.client.as_ref();
        let handle =
            with_retry(&self.retry, "container create", || client.create_container(name)).await?;
        if self.enabled {
            _ = self
                .cache
                .lock()
                .await
                .insert(name.to_string(), handle.clone());
        }
        Ok(handle)
    }

    /// Delete a container with its contents and forget its handle
    pub async fn delete(&self, name: &str) -> Result<()> {
        let client = self.client.as_ref();
        let result =
            with_retry(&self.retry, "container delete", || client.delete_container(name)).await;
        self.invalidate(name).await;
        Ok(result?)
    }

    #[cfg(test)]
    pub(crate) async fn cached(&self) -> Vec<String> {
        let mut names: Vec<_> = self.cache.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}
