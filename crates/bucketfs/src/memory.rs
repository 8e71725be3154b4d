// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory store for testing and embedding
//!
//! Keys are kept in a `BTreeMap` so prefix listings come back in key order,
//! the way hosted object stores return them. Faults can be injected to
//! exercise retry, forbidden and vanished-container paths.

use crate::store::{
    Container, DELIMITER, Listing, ObjectInfo, StoreClient, StoreError, StoreResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

impl MemoryObject {
    fn info(&self, key: &str) -> ObjectInfo {
        ObjectInfo {
            key: key.to_string(),
            size: self.data.len() as u64,
            content_type: self.content_type.clone(),
            last_modified: self.last_modified,
        }
    }
}

/// Strictly increasing timestamps so ordering by modification time is stable
#[derive(Debug, Default)]
struct Clock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Clock {
    async fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().await;
        let mut now = Utc::now();
        if let Some(prev) = *last
            && now <= prev
        {
            now = prev + TimeDelta::microseconds(1);
        }
        *last = Some(now);
        now
    }
}

/// Injected failures shared by a store and its containers
#[derive(Debug, Default)]
struct Faults {
    /// Transient failures still to be returned by `container()`
    container_transient: AtomicUsize,
    /// Transient failures still to be returned by `list()`
    list_transient: AtomicUsize,
    forbidden: Mutex<HashSet<String>>,
    /// Containers whose listings report not-found
    vanished: Mutex<HashSet<String>>,
    /// Keys whose writes fail with a backend error
    failing_puts: Mutex<HashSet<String>>,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// A container held in memory
#[derive(Debug)]
pub struct MemoryContainer {
    name: String,
    objects: Mutex<BTreeMap<String, MemoryObject>>,
    clock: Arc<Clock>,
    faults: Arc<Faults>,
}

impl MemoryContainer {
    /// All keys, in order
    pub async fn keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl Container for MemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn head(&self, key: &str) -> StoreResult<Option<ObjectInfo>> {
        let objects = self.objects.lock().await;
        Ok(objects.get(key).map(|obj| obj.info(key)))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<(ObjectInfo, Bytes)>> {
        let objects = self.objects.lock().await;
        Ok(objects
            .get(key)
            .map(|obj| (obj.info(key), obj.data.clone())))
    }

    async fn list(&self, prefix: &str, delimiter: &str, limit: usize) -> StoreResult<Listing> {
        if take_one(&self.faults.list_transient) {
            return Err(StoreError::Transient("connection reset during list".into()));
        }
        if self.faults.vanished.lock().await.contains(&self.name) {
            return Err(StoreError::NotFound(self.name.clone()));
        }

        let objects = self.objects.lock().await;
        let mut listing = Listing::default();
        let mut seen = BTreeSet::new();
        for (key, obj) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) || listing.objects.len() + listing.prefixes.len() >= limit
            {
                break;
            }
            let rest = &key[prefix.len()..];
            match rest.find(delimiter).filter(|_| !delimiter.is_empty()) {
                Some(idx) => {
                    let sub = format!("{prefix}{}", &rest[..idx + delimiter.len()]);
                    if seen.insert(sub.clone()) {
                        listing.prefixes.push(sub);
                    }
                }
                None => listing.objects.push(obj.info(key)),
            }
        }
        Ok(listing)
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<ObjectInfo> {
        if self.faults.failing_puts.lock().await.contains(key) {
            return Err(StoreError::Backend(format!("write rejected for {key}")));
        }
        let obj = MemoryObject {
            data,
            content_type: content_type.to_string(),
            last_modified: self.clock.now().await,
        };
        let info = obj.info(key);
        _ = self.objects.lock().await.insert(key.to_string(), obj);
        Ok(info)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        _ = self.objects.lock().await.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<()> {
        let mut objects = self.objects.lock().await;
        for key in keys {
            _ = objects.remove(key);
        }
        Ok(())
    }

    async fn rename(&self, key: &str, new_key: &str) -> StoreResult<ObjectInfo> {
        let mut objects = self.objects.lock().await;
        let mut obj = objects
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", self.name, key)))?;
        obj.last_modified = self.clock.now().await;
        let info = obj.info(new_key);
        _ = objects.insert(new_key.to_string(), obj);
        Ok(info)
    }
}

/// An in-memory [`StoreClient`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    containers: Mutex<BTreeMap<String, Arc<MemoryContainer>>>,
    clock: Arc<Clock>,
    faults: Arc<Faults>,
    container_fetches: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle for assertions in tests
    pub async fn memory_container(&self, name: &str) -> Option<Arc<MemoryContainer>> {
        self.containers.lock().await.get(name).cloned()
    }

    /// Write an object directly, creating the container if needed
    pub async fn put_object(&self, container: &str, key: &str, data: &[u8]) -> ObjectInfo {
        self.put_object_with_type(container, key, data, crate::store::DEFAULT_CONTENT_TYPE)
            .await
    }

    pub async fn put_object_with_type(
        &self,
        container: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> ObjectInfo {
        let handle = self.ensure_container(container).await;
        let obj = MemoryObject {
            data: Bytes::copy_from_slice(data),
            content_type: content_type.to_string(),
            last_modified: self.clock.now().await,
        };
        let info = obj.info(key);
        _ = handle.objects.lock().await.insert(key.to_string(), obj);
        info
    }

    /// Content of an object, bypassing every fault
    pub async fn object_bytes(&self, container: &str, key: &str) -> Option<Bytes> {
        let handle = self.memory_container(container).await?;
        let objects = handle.objects.lock().await;
        objects.get(key).map(|obj| obj.data.clone())
    }

    pub async fn object_exists(&self, container: &str, key: &str) -> bool {
        self.object_bytes(container, key).await.is_some()
    }

    /// Number of times `container()` reached the store
    pub fn container_fetches(&self) -> usize {
        self.container_fetches.load(Ordering::SeqCst)
    }

    /// Fail the next `n` container lookups with a transient error
    pub fn fail_container_lookups(&self, n: usize) {
        self.faults.container_transient.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` listings with a transient error
    pub fn fail_listings(&self, n: usize) {
        self.faults.list_transient.store(n, Ordering::SeqCst);
    }

    /// Deny access to a container
    pub async fn forbid(&self, name: &str) {
        _ = self.faults.forbidden.lock().await.insert(name.to_string());
    }

    /// Make listings of a container report not-found, as if it was
    /// deleted behind our back
    pub async fn vanish(&self, name: &str) {
        _ = self.faults.vanished.lock().await.insert(name.to_string());
    }

    /// Reject writes to a key with a backend error
    pub async fn fail_puts_to(&self, key: &str) {
        _ = self.faults.failing_puts.lock().await.insert(key.to_string());
    }

    async fn ensure_container(&self, name: &str) -> Arc<MemoryContainer> {
        let mut containers = self.containers.lock().await;
        containers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(self.new_container(name)))
            .clone()
    }

    fn new_container(&self, name: &str) -> MemoryContainer {
        MemoryContainer {
            name: name.to_string(),
            objects: Mutex::new(BTreeMap::new()),
            clock: self.clock.clone(),
            faults: self.faults.clone(),
        }
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn container(&self, name: &str) -> StoreResult<Arc<dyn Container>> {
        _ = self.container_fetches.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.faults.container_transient) {
            return Err(StoreError::Transient("broken pipe".into()));
        }
        if name.is_empty() || name.contains(DELIMITER) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        if self.faults.forbidden.lock().await.contains(name) {
            return Err(StoreError::Forbidden(name.to_string()));
        }
        let containers = self.containers.lock().await;
        match containers.get(name) {
            Some(c) => Ok(c.clone() as Arc<dyn Container>),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    async fn list_containers(&self) -> StoreResult<Vec<String>> {
        let containers = self.containers.lock().await;
        Ok(containers.keys().cloned().collect())
    }

    async fn create_container(&self, name: &str) -> StoreResult<Arc<dyn Container>> {
        if name.is_empty() || name.contains(DELIMITER) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.ensure_container(name).await as Arc<dyn Container>)
    }

    async fn delete_container(&self, name: &str) -> StoreResult<()> {
        let mut containers = self.containers.lock().await;
        match containers.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(keys: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        _ = store.create_container("b").await.expect("create");
        for key in keys {
            _ = store.put_object("b", key, b"x").await;
        }
        store
    }

    #[tokio::test]
    async fn test_list_groups_by_delimiter() {
        let store = store_with(&["a.txt", "dir/x", "dir/y/z", "dir/", "other/q"]).await;
        let c = store.container("b").await.expect("container");

        let root = c.list("", "/", 100).await.expect("list");
        let keys: Vec<_> = root.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt"]);
        assert_eq!(root.prefixes, vec!["dir/".to_string(), "other/".to_string()]);

        let dir = c.list("dir/", "/", 100).await.expect("list");
        let keys: Vec<_> = dir.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["dir/", "dir/x"]);
        assert_eq!(dir.prefixes, vec!["dir/y/".to_string()]);
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let store = store_with(&["d/1", "d/2", "d/3"]).await;
        let c = store.container("b").await.expect("container");
        let listing = c.list("d/", "/", 2).await.expect("list");
        assert_eq!(listing.objects.len(), 2);
    }

    #[tokio::test]
    async fn test_timestamps_increase() {
        let store = MemoryStore::new();
        let a = store.put_object("b", "a", b"1").await;
        let b = store.put_object("b", "b", b"2").await;
        assert!(b.last_modified > a.last_modified);
    }

    #[tokio::test]
    async fn test_faults() {
        let store = store_with(&[]).await;
        store.fail_container_lookups(1);
        assert!(store.container("b").await.expect_err("transient").is_transient());
        assert!(store.container("b").await.is_ok());

        store.forbid("b").await;
        assert!(store.container("b").await.expect_err("forbidden").is_forbidden());
        assert!(store.container("nope").await.expect_err("missing").is_not_found());
        assert_eq!(store.container_fetches(), 4);
    }

    #[tokio::test]
    async fn test_rename_moves_object() {
        let store = store_with(&["a"]).await;
        let c = store.container("b").await.expect("container");
        _ = c.rename("a", "b").await.expect("rename");
        assert!(!store.object_exists("b", "a").await);
        assert!(store.object_exists("b", "b").await);
        assert!(c.rename("a", "c").await.expect_err("gone").is_not_found());
    }
}
