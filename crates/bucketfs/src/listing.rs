// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Existence checks and directory listings over flat keys
//!
//! A key names a file when an object exists at exactly that key. It names a
//! directory when a marker object exists at `key/`, or when anything at all
//! is stored under the `key/` prefix. Both can be true at once; lookups
//! prefer the file.

use crate::config::RetryConfig;
use crate::containers::ContainerDirectory;
use crate::error::{Error, Result};
use crate::glob::HideSet;
use crate::path::{self, ObjectPath};
use crate::retry::with_retry;
use crate::store::{Container, DELIMITER, Listing, ObjectInfo};
use bytes::Bytes;
use diagnostics::debug;
use std::sync::Arc;

/// Outcome of opening a container by name
pub enum Access {
    Open(Arc<dyn Container>),
    Missing,
    Forbidden,
}

/// What a virtual path turned out to be
#[derive(Debug)]
pub enum Entry {
    /// The root; names are present when content was requested
    Root { containers: Option<Vec<String>> },

    /// The container exists but may not be read
    Hidden,

    Missing,

    File {
        container: Arc<dyn Container>,
        info: ObjectInfo,
    },

    /// `key` is empty or ends with `/`; `listing` is present when content
    /// was requested
    Directory {
        container: Arc<dyn Container>,
        key: String,
        listing: Option<Listing>,
    },
}

impl Entry {
    #[must_use]
    pub fn exists(&self) -> bool {
        !matches!(self, Entry::Missing)
    }
}

/// Which names appear in directory listings
#[derive(Debug, Clone)]
pub struct Visibility {
    globs: HideSet,
    hide_dotted: bool,
}

impl Visibility {
    pub fn new(globs: HideSet, hide_dotted: bool) -> Self {
        Self { globs, hide_dotted }
    }

    #[must_use]
    pub fn is_dotted(&self, name: &str) -> bool {
        self.hide_dotted && name.starts_with('.')
    }

    #[must_use]
    pub fn should_list(&self, name: &str) -> bool {
        !self.globs.is_hidden(name) && !self.is_dotted(name)
    }
}

/// Immediate children of a directory after filtering
#[derive(Debug, Default)]
pub struct Children {
    pub files: Vec<ObjectInfo>,
    /// Sub-directory keys, each ending with `/`
    pub dirs: Vec<String>,
}

impl Children {
    /// Split a listing of `dir_key` into visible files and sub-directories.
    /// The directory's own marker and its own prefix are never children.
    pub fn from_listing(dir_key: &str, listing: &Listing, visibility: &Visibility) -> Self {
        let files = listing
            .objects
            .iter()
            .filter(|obj| obj.key != dir_key && visibility.should_list(obj.name()))
            .cloned()
            .collect();
        let dirs = listing
            .prefixes
            .iter()
            .filter(|prefix| {
                prefix.as_str() != dir_key && visibility.should_list(path::basename(prefix))
            })
            .cloned()
            .collect();
        Children { files, dirs }
    }
}

/// Resolves virtual paths against the store
#[derive(Debug)]
pub struct Navigator {
    containers: ContainerDirectory,
    retry: RetryConfig,
    page_size: usize,
}

impl Navigator {
    pub fn new(containers: ContainerDirectory, retry: RetryConfig, page_size: usize) -> Self {
        Self {
            containers,
            retry,
            page_size,
        }
    }

    pub fn containers(&self) -> &ContainerDirectory {
        &self.containers
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub async fn open(&self, name: &str) -> Result<Access> {
        match self.containers.resolve(name, false).await {
            Ok(Some(handle)) => Ok(Access::Open(handle)),
            Ok(None) => Ok(Access::Missing),
            Err(Error::Store(e)) if e.is_forbidden() => {
                debug!("container {name} is forbidden", name: name);
                Ok(Access::Forbidden)
            }
            Err(e) => Err(e),
        }
    }

    /// Handle for a container that must exist and be readable
    pub async fn require(&self, name: &str) -> Result<Arc<dyn Container>> {
        match self.open(name).await? {
            Access::Open(handle) => Ok(handle),
            Access::Missing => Err(Error::not_found(name)),
            Access::Forbidden => Err(Error::forbidden(name)),
        }
    }

    pub async fn head(&self, container: &dyn Container, key: &str) -> Result<Option<ObjectInfo>> {
        Ok(with_retry(&self.retry, "head", || container.head(key)).await?)
    }

    pub async fn fetch(
        &self,
        container: &dyn Container,
        key: &str,
    ) -> Result<Option<(ObjectInfo, Bytes)>> {
        Ok(with_retry(&self.retry, "get", || container.get(key)).await?)
    }

    /// One page under `prefix`; `None` when the container has vanished,
    /// in which case its cached handle is dropped
    pub async fn list(
        &self,
        container: &dyn Container,
        prefix: &str,
        limit: usize,
    ) -> Result<Option<Listing>> {
        match with_retry(&self.retry, "list", || container.list(prefix, DELIMITER, limit)).await {
            Ok(listing) => Ok(Some(listing)),
            Err(e) if e.is_not_found() => {
                let name = container.name();
                debug!("container {name} vanished while listing {prefix}", name: name, prefix: prefix);
                self.containers.invalidate(name).await;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve `path`, preferring an object at the exact key over a
    /// directory of the same name
    pub async fn lookup(&self, path: &str, want_content: bool) -> Result<Entry> {
        let parsed = ObjectPath::parse(path);
        if parsed.is_root() {
            return self.root(want_content).await;
        }
        let container = match self.open(parsed.container).await? {
            Access::Open(handle) => handle,
            Access::Missing => return Ok(Entry::Missing),
            Access::Forbidden => return Ok(Entry::Hidden),
        };
        if !parsed.is_dir_key() {
            if let Some(info) = self.head(container.as_ref(), parsed.key).await? {
                return Ok(Entry::File { container, info });
            }
            let dir_key = path::with_trailing_slash(parsed.key);
            return self.probe_dir(container, dir_key, want_content).await;
        }
        self.probe_dir(container, parsed.key.to_string(), want_content)
            .await
    }

    /// Resolve `path` as a directory only; a file at the bare key is ignored
    pub async fn lookup_dir(&self, path: &str, want_content: bool) -> Result<Entry> {
        let parsed = ObjectPath::parse(path);
        if parsed.is_root() {
            return self.root(want_content).await;
        }
        let container = match self.open(parsed.container).await? {
            Access::Open(handle) => handle,
            Access::Missing => return Ok(Entry::Missing),
            Access::Forbidden => return Ok(Entry::Hidden),
        };
        let dir_key = if parsed.key.is_empty() {
            String::new()
        } else {
            path::with_trailing_slash(parsed.key)
        };
        self.probe_dir(container, dir_key, want_content).await
    }

    async fn root(&self, want_content: bool) -> Result<Entry> {
        let containers = if want_content {
            Some(self.containers.list_names().await?)
        } else {
            None
        };
        Ok(Entry::Root { containers })
    }

    async fn probe_dir(
        &self,
        container: Arc<dyn Container>,
        key: String,
        want_content: bool,
    ) -> Result<Entry> {
        if key.is_empty() && !want_content {
            return Ok(Entry::Directory {
                container,
                key,
                listing: None,
            });
        }
        let mut marker = false;
        if !key.is_empty() {
            marker = self.head(container.as_ref(), &key).await?.is_some();
            if marker && !want_content {
                return Ok(Entry::Directory {
                    container,
                    key,
                    listing: None,
                });
            }
        }
        let limit = if want_content { self.page_size } else { 1 };
        let Some(listing) = self.list(container.as_ref(), &key, limit).await? else {
            return Ok(Entry::Missing);
        };
        if !(marker || key.is_empty() || !listing.is_empty()) {
            return Ok(Entry::Missing);
        }
        let listing = want_content.then_some(listing);
        Ok(Entry::Directory {
            container,
            key,
            listing,
        })
    }

    /// True when an object exists at exactly the path's key
    pub async fn file_exists(&self, path: &str) -> Result<bool> {
        let parsed = ObjectPath::parse(path);
        if parsed.is_root() || parsed.is_dir_key() {
            return Ok(false);
        }
        match self.open(parsed.container).await? {
            Access::Open(container) => Ok(self.head(container.as_ref(), parsed.key).await?.is_some()),
            Access::Missing => Ok(false),
            Access::Forbidden => Ok(true),
        }
    }

    pub async fn dir_exists(&self, path: &str) -> Result<bool> {
        Ok(self.lookup_dir(path, false).await?.exists())
    }

    /// Missing and forbidden containers are hidden, as are dotted names
    /// when `visibility` hides them
    pub async fn is_hidden(&self, path: &str, visibility: &Visibility) -> Result<bool> {
        let parsed = ObjectPath::parse(path);
        if parsed.is_root() {
            return Ok(false);
        }
        match self.open(parsed.container).await? {
            Access::Open(_) => Ok(visibility.is_dotted(path::basename(parsed.key))),
            Access::Missing | Access::Forbidden => Ok(true),
        }
    }
}
