// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Containers backed by the `object_store` crate
//!
//! [`ObjectStoreContainer`] wraps any [`ObjectStore`] as one container.
//! [`LocalStoreClient`] maps each sub-directory of a root directory to a
//! container backed by [`LocalFileSystem`].
//!
//! `object_store` paths cannot end in a delimiter, so the zero-length object
//! marking directory `a/` is stored as `a/.dirmarker` and translated back
//! on the way out.

use crate::store::{
    Container, DEFAULT_CONTENT_TYPE, DELIMITER, DIRECTORY_CONTENT_TYPE, Listing,
    NOTEBOOK_CONTENT_TYPE, ObjectInfo, StoreClient, StoreError, StoreResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use diagnostics::debug;
use futures::StreamExt;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, GetResult, ObjectMeta, ObjectStore,
    PutOptions, PutPayload,
};
use std::path::PathBuf;
use std::sync::Arc;

/// File name standing in for a trailing delimiter
pub const DIRECTORY_MARKER: &str = ".dirmarker";

/// True for object keys that would collide with a directory marker
fn is_reserved(key: &str) -> bool {
    key.rsplit(DELIMITER).next() == Some(DIRECTORY_MARKER)
}

fn to_path(key: &str) -> StoreResult<Path> {
    if is_reserved(key) {
        return Err(StoreError::InvalidName(format!(
            "{key}: {DIRECTORY_MARKER} is reserved for directory markers"
        )));
    }
    let path = match key.strip_suffix(DELIMITER) {
        Some(dir) => format!("{dir}{DELIMITER}{DIRECTORY_MARKER}"),
        None => key.to_string(),
    };
    Path::parse(&path).map_err(|e| StoreError::InvalidName(format!("{key}: {e}")))
}

fn to_key(path: &Path) -> String {
    let raw = path.as_ref();
    if raw == DIRECTORY_MARKER {
        return String::new();
    }
    match raw.strip_suffix(DIRECTORY_MARKER) {
        Some(dir) if dir.ends_with(DELIMITER) => dir.to_string(),
        _ => raw.to_string(),
    }
}

/// Content type for backends that do not keep attributes
fn infer_content_type(key: &str) -> &'static str {
    if key.ends_with(DELIMITER) {
        DIRECTORY_CONTENT_TYPE
    } else if key.ends_with(".ipynb") {
        NOTEBOOK_CONTENT_TYPE
    } else {
        DEFAULT_CONTENT_TYPE
    }
}

fn object_info(key: String, meta: &ObjectMeta, attributes: Option<&Attributes>) -> ObjectInfo {
    let content_type = attributes
        .and_then(|attrs| attrs.get(&Attribute::ContentType))
        .map(|v| AsRef::<str>::as_ref(v).to_string())
        .unwrap_or_else(|| infer_content_type(&key).to_string());
    ObjectInfo {
        key,
        size: meta.size,
        content_type,
        last_modified: meta.last_modified,
    }
}

fn not_found_as_none<T>(result: object_store::Result<T>) -> StoreResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(object_store::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// One container over an arbitrary [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct ObjectStoreContainer {
    name: String,
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreContainer {
    pub fn new<S: Into<String>>(name: S, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    async fn get_result(&self, key: &str, head: bool) -> StoreResult<Option<GetResult>> {
        if is_reserved(key) {
            return Ok(None);
        }
        let path = to_path(key)?;
        let options = GetOptions {
            head,
            ..Default::default()
        };
        not_found_as_none(self.store.get_opts(&path, options).await)
    }
}

#[async_trait]
impl Container for ObjectStoreContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn head(&self, key: &str) -> StoreResult<Option<ObjectInfo>> {
        let result = self.get_result(key, true).await?;
        Ok(result.map(|r| object_info(key.to_string(), &r.meta, Some(&r.attributes))))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<(ObjectInfo, Bytes)>> {
        let Some(result) = self.get_result(key, false).await? else {
            return Ok(None);
        };
        let info = object_info(key.to_string(), &result.meta, Some(&result.attributes));
        let data = result.bytes().await?;
        Ok(Some((info, data)))
    }

    async fn list(&self, prefix: &str, delimiter: &str, limit: usize) -> StoreResult<Listing> {
        if delimiter != DELIMITER {
            return Err(StoreError::Unsupported(format!(
                "listing with delimiter {delimiter:?}"
            )));
        }
        // List the enclosing directory and filter by the partial name after it
        let dir = match prefix.rfind(DELIMITER) {
            Some(idx) => &prefix[..=idx],
            None => "",
        };
        let dir_path = if dir.is_empty() {
            None
        } else {
            Some(to_path(dir.trim_end_matches(DELIMITER))?)
        };
        let result = self.store.list_with_delimiter(dir_path.as_ref()).await?;

        let mut listing = Listing::default();
        for meta in &result.objects {
            let key = to_key(&meta.location);
            if key.is_empty() || !key.starts_with(prefix) {
                continue;
            }
            listing.objects.push(object_info(key, meta, None));
        }
        // A marker sorts under its directory's name, which is not where a
        // hosted store would put `dir/`
        listing.objects.sort_by(|a, b| a.key.cmp(&b.key));
        for common in &result.common_prefixes {
            let sub = format!("{}{DELIMITER}", common.as_ref());
            if sub.starts_with(prefix) {
                listing.prefixes.push(sub);
            }
        }
        listing.prefixes.sort();

        let total = listing.objects.len() + listing.prefixes.len();
        if total > limit {
            let prefixes_kept = limit.saturating_sub(listing.objects.len());
            listing.objects.truncate(limit);
            listing.prefixes.truncate(prefixes_kept);
        }
        let container = self.name.as_str();
        let count = listing.objects.len() + listing.prefixes.len();
        debug!("listed {container}/{prefix}: {count} entries", container: container, prefix: prefix, count: count);
        Ok(listing)
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StoreResult<ObjectInfo> {
        let path = to_path(key)?;
        let mut attributes = Attributes::new();
        _ = attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let options = PutOptions {
            attributes,
            ..Default::default()
        };
        match self
            .store
            .put_opts(&path, PutPayload::from(data.clone()), options)
            .await
        {
            Ok(_) => {}
            Err(object_store::Error::NotImplemented) => {
                // Backends such as the local filesystem keep no attributes
                _ = self.store.put(&path, PutPayload::from(data)).await?;
            }
            Err(e) => return Err(e.into()),
        }
        self.head(key)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("{}/{key} missing after write", self.name)))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = to_path(key)?;
        _ = not_found_as_none(self.store.delete(&path).await)?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<()> {
        let paths = keys
            .iter()
            .map(|k| to_path(k))
            .collect::<StoreResult<Vec<_>>>()?;
        let locations = futures::stream::iter(paths.into_iter().map(Ok)).boxed();
        let results: Vec<object_store::Result<Path>> =
            self.store.delete_stream(locations).collect().await;
        for result in results {
            _ = not_found_as_none(result)?;
        }
        Ok(())
    }

    async fn rename(&self, key: &str, new_key: &str) -> StoreResult<ObjectInfo> {
        let from = to_path(key)?;
        let to = to_path(new_key)?;
        if from == to {
            return self
                .head(key)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("{}/{key}", self.name)));
        }
        // Copy and delete rather than rename: deleting is what lets the local
        // backend prune directories left empty by the move
        self.store.copy(&from, &to).await?;
        self.store.delete(&from).await?;
        self.head(new_key)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{}/{new_key}", self.name)))
    }
}

/// Containers as sub-directories of a local root directory
#[derive(Debug, Clone)]
pub struct LocalStoreClient {
    root: PathBuf,
}

fn io_error(name: &str, err: std::io::Error) -> StoreError {
    match err.kind() {
        std::io::ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
        std::io::ErrorKind::PermissionDenied => StoreError::Forbidden(name.to_string()),
        _ => StoreError::Backend(format!("{name}: {err}")),
    }
}

impl LocalStoreClient {
    /// Use `root` as the store; it is created if missing
    pub fn new<P: Into<PathBuf>>(root: P) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| io_error(&root.display().to_string(), e))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn container_dir(&self, name: &str) -> StoreResult<PathBuf> {
        if name.is_empty() || name.contains(DELIMITER) || name == "." || name == ".." {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    fn open(&self, name: &str, dir: PathBuf) -> StoreResult<Arc<dyn Container>> {
        let fs = LocalFileSystem::new_with_prefix(dir)?.with_automatic_cleanup(true);
        Ok(Arc::new(ObjectStoreContainer::new(name, Arc::new(fs))))
    }
}

#[async_trait]
impl StoreClient for LocalStoreClient {
    async fn container(&self, name: &str) -> StoreResult<Arc<dyn Container>> {
        let dir = self.container_dir(name)?;
        let meta = tokio::fs::metadata(&dir)
            .await
            .map_err(|e| io_error(name, e))?;
        if !meta.is_dir() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        self.open(name, dir)
    }

    async fn list_containers(&self) -> StoreResult<Vec<String>> {
        let root = self.root.display().to_string();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| io_error(&root, e))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&root, e))? {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| io_error(&root, e))?
                .is_dir();
            if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn create_container(&self, name: &str) -> StoreResult<Arc<dyn Container>> {
        let dir = self.container_dir(name)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(name, e))?;
        debug!("created container {name}", name: name);
        self.open(name, dir)
    }

    async fn delete_container(&self, name: &str) -> StoreResult<()> {
        let dir = self.container_dir(name)?;
        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|e| io_error(name, e))?;
        debug!("deleted container {name}", name: name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use object_store::memory::InMemory;

    async fn list_all_keys(store: &dyn ObjectStore) -> Vec<String> {
        let metas: Vec<ObjectMeta> = store.list(None).try_collect().await.expect("list");
        metas.iter().map(|m| to_key(&m.location)).collect()
    }

    fn container() -> ObjectStoreContainer {
        ObjectStoreContainer::new("bucket", Arc::new(InMemory::new()))
    }

    #[test]
    fn test_marker_paths() {
        assert_eq!(to_path("a/").expect("path").as_ref(), "a/.dirmarker");
        assert_eq!(to_path("a/b").expect("path").as_ref(), "a/b");
        assert_eq!(to_key(&Path::from("a/.dirmarker")), "a/");
        assert_eq!(to_key(&Path::from("a/b")), "a/b");
        assert!(to_path("a//b").is_err());
    }

    #[tokio::test]
    async fn test_put_head_get() {
        let c = container();
        _ = c
            .put("dir/a.txt", Bytes::from_static(b"hello"), "text/markdown")
            .await
            .expect("put");
        let info = c.head("dir/a.txt").await.expect("head").expect("exists");
        assert_eq!(info.size, 5);
        assert_eq!(info.content_type, "text/markdown");
        let (_, data) = c.get("dir/a.txt").await.expect("get").expect("exists");
        assert_eq!(&data[..], b"hello");
        assert!(c.head("dir/missing").await.expect("head").is_none());
    }

    #[tokio::test]
    async fn test_marker_is_distinct_from_object() {
        let c = container();
        _ = c.put("test", Bytes::new(), DEFAULT_CONTENT_TYPE).await.expect("put");
        assert!(c.head("test/").await.expect("head").is_none());
        _ = c
            .put("test/", Bytes::new(), DIRECTORY_CONTENT_TYPE)
            .await
            .expect("put");
        assert!(c.head("test/").await.expect("head").is_some());
        assert!(c.head("test").await.expect("head").is_some());
    }

    #[tokio::test]
    async fn test_list_groups_and_filters() {
        let c = container();
        for key in ["d/", "d/a", "d/b", "d/sub/x", "d/sub2/", "e"] {
            _ = c.put(key, Bytes::new(), DEFAULT_CONTENT_TYPE).await.expect("put");
        }
        let listing = c.list("d/", "/", 100).await.expect("list");
        let keys: Vec<_> = listing.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["d/", "d/a", "d/b"]);
        assert_eq!(listing.prefixes, vec!["d/sub/".to_string(), "d/sub2/".to_string()]);

        let partial = c.list("d/s", "/", 100).await.expect("list");
        assert!(partial.objects.is_empty());
        assert_eq!(partial.prefixes.len(), 2);

        let limited = c.list("d/", "/", 1).await.expect("list");
        assert_eq!(limited.objects.len() + limited.prefixes.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_many_and_rename() {
        let c = container();
        for key in ["a", "b", "c"] {
            _ = c.put(key, Bytes::new(), DEFAULT_CONTENT_TYPE).await.expect("put");
        }
        c.delete_many(&["a".to_string(), "b".to_string(), "zz".to_string()])
            .await
            .expect("delete");
        _ = c.rename("c", "moved/c").await.expect("rename");
        let keys = list_all_keys(c.store.as_ref()).await;
        assert_eq!(keys, vec!["moved/c".to_string()]);
        c.delete("never-there").await.expect("delete missing");
    }
}
