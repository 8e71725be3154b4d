// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Writes, recursive deletes and moves
//!
//! Directory trees are walked one listing page at a time. Nothing here is
//! transactional: a failure part way through a tree delete or move leaves
//! the objects processed so far where they ended up.

use crate::codec::NotebookCodec;
use crate::error::{Error, Result};
use crate::listing::{Access, Navigator};
use crate::model::{Content, Format, decode_base64};
use crate::path::{self, ObjectPath};
use crate::store::{
    Container, DEFAULT_CONTENT_TYPE, DIRECTORY_CONTENT_TYPE, NOTEBOOK_CONTENT_TYPE, ObjectInfo,
};
use bytes::Bytes;
use diagnostics::{debug, info};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

/// Bytes to store for a file saved with `format`
pub fn encode_file(path: &str, content: Option<&Content>, format: Option<Format>) -> Result<Bytes> {
    let text = match content {
        Some(Content::Text(text)) => text,
        Some(_) => {
            return Err(Error::bad_format(format!(
                "File content for {path} must be a string"
            )));
        }
        None => return Err(Error::bad_format("No file content provided")),
    };
    match format {
        Some(Format::Text) => Ok(Bytes::from(text.clone().into_bytes())),
        Some(Format::Base64) => decode_base64(text)
            .map(Bytes::from)
            .map_err(|e| Error::bad_format(format!("Encoding error saving {path}: {e}"))),
        _ => Err(Error::bad_format(
            "Must specify format of file contents as \"text\" or \"base64\"",
        )),
    }
}

/// Write a file object at `path`, replacing anything already there
pub async fn save_file(nav: &Navigator, path: &str, data: Bytes) -> Result<ObjectInfo> {
    let parsed = ObjectPath::parse(path);
    let container = nav.require(parsed.container).await?;
    let key = path::without_trailing_slash(parsed.key);
    let size = data.len();
    debug!("writing {size} bytes to {path}", size: size, path: path);
    Ok(container.put(key, data, DEFAULT_CONTENT_TYPE).await?)
}

pub async fn save_notebook(
    nav: &Navigator,
    path: &str,
    doc: &Value,
    codec: &dyn NotebookCodec,
) -> Result<ObjectInfo> {
    let parsed = ObjectPath::parse(path);
    let container = nav.require(parsed.container).await?;
    let data = Bytes::from(codec.serialize(doc)?);
    Ok(container
        .put(parsed.key, data, NOTEBOOK_CONTENT_TYPE)
        .await?)
}

/// Create a directory; a container when `path` names one
///
/// An existing directory is left alone. A file at the same key is a
/// [`Error::TypeConflict`].
pub async fn save_directory(nav: &Navigator, path: &str) -> Result<()> {
    let parsed = ObjectPath::parse(path);
    if parsed.is_root() {
        return Ok(());
    }
    if parsed.is_container() {
        return match nav.open(parsed.container).await? {
            Access::Open(_) => {
                debug!("container {path} already exists", path: path);
                Ok(())
            }
            Access::Forbidden => Err(Error::forbidden(parsed.container)),
            Access::Missing => {
                _ = nav.containers().create(parsed.container).await?;
                info!("created container {path}", path: path);
                Ok(())
            }
        };
    }

    let container = nav.require(parsed.container).await?;
    let bare = path::without_trailing_slash(parsed.key);
    if nav.head(container.as_ref(), bare).await?.is_some() {
        return Err(Error::type_conflict(format!("Not a directory: {path}")));
    }
    if nav.lookup_dir(path, false).await?.exists() {
        debug!("directory {path} already exists", path: path);
        return Ok(());
    }
    let marker = path::with_trailing_slash(bare);
    _ = container
        .put(&marker, Bytes::new(), DIRECTORY_CONTENT_TYPE)
        .await?;
    Ok(())
}

/// Delete a container, a single object, or a whole directory tree
///
/// Deleting something absent inside an existing container succeeds.
pub async fn delete_path(nav: &Navigator, path: &str) -> Result<()> {
    let parsed = ObjectPath::parse(path);
    if parsed.is_root() {
        return Err(Error::invalid_path("Cannot delete the root"));
    }
    let container = nav.require(parsed.container).await?;
    if parsed.is_container() {
        nav.containers().delete(parsed.container).await?;
        info!("deleted container {path}", path: path);
        return Ok(());
    }
    if !parsed.is_dir_key() && nav.head(container.as_ref(), parsed.key).await?.is_some() {
        container.delete(parsed.key).await?;
        return Ok(());
    }
    delete_tree(nav, container.as_ref(), path::with_trailing_slash(parsed.key)).await
}

fn delete_tree<'a>(
    nav: &'a Navigator,
    container: &'a dyn Container,
    prefix: String,
) -> BoxFuture<'a, Result<()>> {
    async move {
        loop {
            let Some(listing) = nav.list(container, &prefix, nav.page_size()).await? else {
                return Ok(());
            };
            let keys: Vec<String> = listing.objects.iter().map(|o| o.key.clone()).collect();
            let subs: Vec<String> = listing
                .prefixes
                .into_iter()
                .filter(|p| *p != prefix)
                .collect();
            if keys.is_empty() && subs.is_empty() {
                return Ok(());
            }
            let count = keys.len();
            debug!("deleting {count} objects under {prefix}", count: count, prefix: prefix);
            container.delete_many(&keys).await?;
            for sub in subs {
                delete_tree(nav, container, sub).await?;
            }
        }
    }
    .boxed()
}

/// Move one object, atomically when it stays in the same container
pub async fn move_object(
    src: &dyn Container,
    key: &str,
    dst: &dyn Container,
    new_key: &str,
) -> Result<ObjectInfo> {
    if src.name() == dst.name() {
        return Ok(src.rename(key, new_key).await?);
    }
    let info = src.copy_to(key, dst, new_key).await?;
    src.delete(key).await?;
    Ok(info)
}

/// Move a file or directory tree, possibly into another container
pub async fn rename_path(nav: &Navigator, old_path: &str, new_path: &str) -> Result<()> {
    let old = ObjectPath::parse(old_path);
    let new = ObjectPath::parse(new_path);
    if old.key.is_empty() || new.key.is_empty() {
        return Err(Error::invalid_path(format!(
            "Cannot rename {old_path} to {new_path}: containers cannot be renamed"
        )));
    }
    let src = nav.require(old.container).await?;
    let dst = nav.require(new.container).await?;

    if !old.is_dir_key() && nav.head(src.as_ref(), old.key).await?.is_some() {
        let new_key = path::without_trailing_slash(new.key);
        if old.container == new.container && old.key == new_key {
            return Ok(());
        }
        _ = move_object(src.as_ref(), old.key, dst.as_ref(), new_key).await?;
        return Ok(());
    }

    let old_dir = path::with_trailing_slash(old.key);
    let new_dir = path::with_trailing_slash(new.key);
    if old.container == new.container {
        if old_dir == new_dir {
            return Ok(());
        }
        if new_dir.starts_with(&old_dir) {
            return Err(Error::invalid_path(format!(
                "Cannot move {old_path} into itself"
            )));
        }
    }
    if !nav.lookup_dir(old_path, false).await?.exists() {
        return Err(Error::not_found(format!("No such file or directory: {old_path}")));
    }
    move_tree(nav, src.as_ref(), dst.as_ref(), old_dir, new_dir).await
}

fn move_tree<'a>(
    nav: &'a Navigator,
    src: &'a dyn Container,
    dst: &'a dyn Container,
    from: String,
    to: String,
) -> BoxFuture<'a, Result<()>> {
    async move {
        loop {
            let Some(listing) = nav.list(src, &from, nav.page_size()).await? else {
                return Ok(());
            };
            let subs: Vec<String> = listing
                .prefixes
                .into_iter()
                .filter(|p| *p != from)
                .collect();
            if listing.objects.is_empty() && subs.is_empty() {
                return Ok(());
            }
            for obj in &listing.objects {
                let new_key = format!("{to}{}", &obj.key[from.len()..]);
                _ = move_object(src, &obj.key, dst, &new_key).await?;
            }
            for sub in subs {
                let new_sub = format!("{to}{}", &sub[from.len()..]);
                move_tree(nav, src, dst, sub, new_sub).await?;
            }
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::containers::ContainerDirectory;
    use crate::memory::MemoryStore;
    use crate::store::StoreClient;
    use std::sync::Arc;

    async fn navigator(keys: &[&str], page_size: usize) -> (Arc<MemoryStore>, Navigator) {
        let store = Arc::new(MemoryStore::new());
        _ = store.create_container("bucket").await.expect("create");
        for key in keys {
            _ = store.put_object("bucket", key, key.as_bytes()).await;
        }
        let retry = RetryConfig {
            max_retries: 0,
            min_delay_ms: 0,
            max_delay_ms: 0,
        };
        let containers = ContainerDirectory::new(store.clone(), true, retry.clone());
        (store, Navigator::new(containers, retry, page_size))
    }

    async fn keys(store: &MemoryStore, container: &str) -> Vec<String> {
        store
            .memory_container(container)
            .await
            .expect("container")
            .keys()
            .await
    }

    #[test]
    fn test_encode_file() {
        let text = Content::Text("héllo".to_string());
        assert_eq!(
            &encode_file("p", Some(&text), Some(Format::Text)).expect("text")[..],
            "héllo".as_bytes()
        );
        let b64 = Content::Text("AAH/".to_string());
        assert_eq!(
            &encode_file("p", Some(&b64), Some(Format::Base64)).expect("base64")[..],
            &[0, 1, 255]
        );
        let err = encode_file("b/p", Some(&text), Some(Format::Base64)).expect_err("bad base64");
        assert!(err.to_string().contains("Encoding error saving b/p"));
        assert!(matches!(
            encode_file("p", Some(&text), None),
            Err(Error::BadFormat(_))
        ));
        assert!(matches!(
            encode_file("p", None, Some(Format::Text)),
            Err(Error::BadFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_tree_spans_pages() {
        let (store, nav) =
            navigator(&["d/", "d/1", "d/2", "d/3", "d/e/1", "d/e/f/2", "keep"], 2).await;
        delete_path(&nav, "bucket/d").await.expect("delete");
        assert_eq!(keys(&store, "bucket").await, vec!["keep".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let (_store, nav) = navigator(&[], 10).await;
        delete_path(&nav, "bucket/nothing").await.expect("delete");
        delete_path(&nav, "bucket/nothing/").await.expect("delete");
        assert!(matches!(
            delete_path(&nav, "absent/x").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_file_keeps_same_named_directory() {
        let (store, nav) = navigator(&["test", "test/other"], 10).await;
        delete_path(&nav, "bucket/test").await.expect("delete");
        assert_eq!(keys(&store, "bucket").await, vec!["test/other".to_string()]);
    }

    #[tokio::test]
    async fn test_move_tree_within_container() {
        let (store, nav) = navigator(&["test/", "test/other.txt", "test/dir/x.txt"], 1).await;
        rename_path(&nav, "bucket/test/", "bucket/test1/")
            .await
            .expect("rename");
        assert_eq!(
            keys(&store, "bucket").await,
            vec![
                "test1/".to_string(),
                "test1/dir/x.txt".to_string(),
                "test1/other.txt".to_string()
            ]
        );
        assert_eq!(
            store.object_bytes("bucket", "test1/dir/x.txt").await.as_deref(),
            Some(&b"test/dir/x.txt"[..])
        );
    }

    #[tokio::test]
    async fn test_move_across_containers() {
        let (store, nav) = navigator(&["a.txt", "d/x", "d/y/z"], 10).await;
        _ = store.create_container("other").await.expect("create");
        rename_path(&nav, "bucket/a.txt", "other/b.txt")
            .await
            .expect("file");
        rename_path(&nav, "bucket/d", "other/e").await.expect("dir");
        assert!(keys(&store, "bucket").await.is_empty());
        assert_eq!(
            keys(&store, "other").await,
            vec!["b.txt".to_string(), "e/x".to_string(), "e/y/z".to_string()]
        );
    }

    #[tokio::test]
    async fn test_move_into_itself_is_rejected() {
        let (_store, nav) = navigator(&["d/x"], 10).await;
        assert!(matches!(
            rename_path(&nav, "bucket/d", "bucket/d/e").await,
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            rename_path(&nav, "bucket/missing", "bucket/elsewhere").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_directory() {
        let (store, nav) = navigator(&["file"], 10).await;
        save_directory(&nav, "bucket/new").await.expect("create");
        save_directory(&nav, "bucket/new/").await.expect("no-op");
        assert!(store.object_exists("bucket", "new/").await);
        assert!(matches!(
            save_directory(&nav, "bucket/file").await,
            Err(Error::TypeConflict(_))
        ));

        save_directory(&nav, "fresh").await.expect("container");
        assert!(store.memory_container("fresh").await.is_some());
        save_directory(&nav, "fresh").await.expect("no-op");
    }
}
