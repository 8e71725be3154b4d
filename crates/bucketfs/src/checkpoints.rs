// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Point-in-time copies of documents
//!
//! A checkpoint of `bucket/dir/report.ipynb` with id `ID` is stored as
//! `bucket/dir/.ipynb_checkpoints/report-ID.ipynb`. Ids are UUIDv7 strings,
//! which lets listings recover them from key names unambiguously.

use crate::codec::NotebookCodec;
use crate::error::{Error, Result};
use crate::listing::{Access, Navigator};
use crate::model::{self, ContentKind, ContentModel};
use crate::mutation::move_object;
use crate::path::{self, ObjectPath};
use crate::store::Container;
use chrono::{DateTime, Utc};
use diagnostics::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub last_modified: DateTime<Utc>,
}

/// Where the checkpoints of one document live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLocation {
    pub container: String,
    /// Directory part of the document key, empty or ending with `/`
    pub parent: String,
    pub stem: String,
    /// Extension including its dot, possibly empty
    pub ext: String,
    checkpoint_dir: String,
}

impl CheckpointLocation {
    /// Derive the location for the document at `path`
    pub fn for_path(
        path: &str,
        checkpoint_dir: &str,
        container_override: Option<&str>,
    ) -> Result<Self> {
        let parsed = ObjectPath::parse(path);
        if parsed.key.is_empty() || parsed.is_dir_key() {
            return Err(Error::invalid_path(format!(
                "Checkpoints are kept for files only: {path}"
            )));
        }
        let (stem, ext) = path::split_ext(path::basename(parsed.key));
        Ok(Self {
            container: container_override.unwrap_or(parsed.container).to_string(),
            parent: path::parent_prefix(parsed.key).to_string(),
            stem: stem.to_string(),
            ext: ext.to_string(),
            checkpoint_dir: checkpoint_dir.to_string(),
        })
    }

    /// Prefix shared by every checkpoint of the document
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}{}/{}-", self.parent, self.checkpoint_dir, self.stem)
    }

    #[must_use]
    pub fn key(&self, id: &str) -> String {
        format!("{}{id}{}", self.prefix(), self.ext)
    }

    /// Recover the id from a checkpoint key; `None` for keys that belong
    /// to another document
    #[must_use]
    pub fn parse_id(&self, key: &str) -> Option<String> {
        let id = key
            .strip_prefix(&self.prefix())?
            .strip_suffix(self.ext.as_str())?;
        id.parse::<uuid7::Uuid>().ok().map(|_| id.to_string())
    }
}

/// Checkpoint operations, keyed by document path
#[derive(Debug, Clone)]
pub struct Checkpoints {
    checkpoint_dir: String,
    container: Option<String>,
}

impl Checkpoints {
    pub fn new<S: Into<String>>(checkpoint_dir: S, container: Option<String>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            container,
        }
    }

    pub fn location(&self, path: &str) -> Result<CheckpointLocation> {
        CheckpointLocation::for_path(path, &self.checkpoint_dir, self.container.as_deref())
    }

    /// Checkpoint container, if it exists
    async fn open(&self, nav: &Navigator, loc: &CheckpointLocation) -> Result<Option<Arc<dyn Container>>> {
        match nav.open(&loc.container).await? {
            Access::Open(handle) => Ok(Some(handle)),
            Access::Missing => Ok(None),
            Access::Forbidden => Err(Error::forbidden(&loc.container)),
        }
    }

    /// Copy the current document into a new checkpoint
    pub async fn create(&self, nav: &Navigator, path: &str) -> Result<Checkpoint> {
        let parsed = ObjectPath::parse(path);
        let loc = self.location(path)?;
        let src = nav.require(parsed.container).await?;
        let dst = nav.require(&loc.container).await?;
        let id = uuid7::uuid7().to_string();
        let key = loc.key(&id);
        let stored = src
            .copy_to(parsed.key, dst.as_ref(), &key)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::not_found(format!("No such file: {path}"))
                } else {
                    e.into()
                }
            })?;
        debug!("created checkpoint {id} for {path}", id: id, path: path);
        Ok(Checkpoint {
            id,
            last_modified: stored.last_modified,
        })
    }

    /// Checkpoints of `path`, newest first
    pub async fn list(&self, nav: &Navigator, path: &str) -> Result<Vec<Checkpoint>> {
        let loc = self.location(path)?;
        let Some(container) = self.open(nav, &loc).await? else {
            return Ok(Vec::new());
        };
        let Some(listing) = nav
            .list(container.as_ref(), &loc.prefix(), nav.page_size())
            .await?
        else {
            return Ok(Vec::new());
        };
        let mut checkpoints: Vec<Checkpoint> = listing
            .objects
            .iter()
            .filter_map(|obj| {
                loc.parse_id(&obj.key).map(|id| Checkpoint {
                    id,
                    last_modified: obj.last_modified,
                })
            })
            .collect();
        checkpoints.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(checkpoints)
    }

    /// Content of one checkpoint, shaped like the document it was taken of
    pub async fn get(
        &self,
        nav: &Navigator,
        id: &str,
        path: &str,
        codec: &dyn NotebookCodec,
    ) -> Result<ContentModel> {
        let loc = self.location(path)?;
        let missing = || Error::not_found(format!("No such checkpoint: {id} for {path}"));
        let container = self.open(nav, &loc).await?.ok_or_else(missing)?;
        let (info, data) = nav
            .fetch(container.as_ref(), &loc.key(id))
            .await?
            .ok_or_else(missing)?;
        match ContentKind::for_name(path) {
            ContentKind::Notebook => {
                model::notebook_model(&loc.container, &info, Some(&data), codec)
            }
            _ => model::file_model(&loc.container, &info, Some(&data), None),
        }
    }

    /// Copy a checkpoint back over its document
    pub async fn restore(&self, nav: &Navigator, id: &str, path: &str) -> Result<()> {
        let parsed = ObjectPath::parse(path);
        let loc = self.location(path)?;
        let missing = || Error::not_found(format!("No such checkpoint: {id} for {path}"));
        let src = self.open(nav, &loc).await?.ok_or_else(missing)?;
        let dst = nav.require(parsed.container).await?;
        let key = loc.key(id);
        if nav.head(src.as_ref(), &key).await?.is_none() {
            return Err(missing());
        }
        _ = src.copy_to(&key, dst.as_ref(), parsed.key).await?;
        info!("restored {path} from checkpoint {id}", path: path, id: id);
        Ok(())
    }

    pub async fn rename(
        &self,
        nav: &Navigator,
        id: &str,
        old_path: &str,
        new_path: &str,
    ) -> Result<()> {
        let old = self.location(old_path)?;
        let new = self.location(new_path)?;
        let missing = || Error::not_found(format!("No such checkpoint: {id} for {old_path}"));
        let src = self.open(nav, &old).await?.ok_or_else(missing)?;
        let (old_key, new_key) = (old.key(id), new.key(id));
        if old.container == new.container && old_key == new_key {
            return Ok(());
        }
        let dst = nav.require(&new.container).await?;
        _ = move_object(src.as_ref(), &old_key, dst.as_ref(), &new_key).await?;
        Ok(())
    }

    /// Carry every checkpoint of `old_path` over to `new_path`
    pub async fn rename_all(&self, nav: &Navigator, old_path: &str, new_path: &str) -> Result<()> {
        for checkpoint in self.list(nav, old_path).await? {
            self.rename(nav, &checkpoint.id, old_path, new_path).await?;
        }
        Ok(())
    }

    /// Remove one checkpoint; removing an absent checkpoint succeeds
    pub async fn delete(&self, nav: &Navigator, id: &str, path: &str) -> Result<()> {
        let loc = self.location(path)?;
        if let Some(container) = self.open(nav, &loc).await? {
            container.delete(&loc.key(id)).await?;
        }
        Ok(())
    }

    pub async fn delete_all(&self, nav: &Navigator, path: &str) -> Result<()> {
        let loc = self.location(path)?;
        let Some(container) = self.open(nav, &loc).await? else {
            return Ok(());
        };
        let keys: Vec<String> = self
            .list(nav, path)
            .await?
            .iter()
            .map(|c| loc.key(&c.id))
            .collect();
        if !keys.is_empty() {
            container.delete_many(&keys).await?;
        }
        Ok(())
    }
}
