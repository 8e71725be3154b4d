// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The contents manager: filesystem-style operations over an object store
//!
//! Paths are virtual: `container/dir/file`. The empty path is the root,
//! whose children are the containers. Only directories (containers) may be
//! created at the root.

use crate::checkpoints::{Checkpoint, Checkpoints};
use crate::codec::{JsonNotebookCodec, NotebookCodec};
use crate::config::{ConfigError, ContentsConfig};
use crate::containers::ContainerDirectory;
use crate::error::{Error, Result};
use crate::listing::{Children, Entry, Navigator, Visibility};
use crate::model::{self, Content, ContentKind, ContentModel, Format, SaveModel};
use crate::mutation;
use crate::path::{self, ObjectPath};
use crate::store::StoreClient;
use diagnostics::{debug, error};
use std::sync::Arc;

/// Error type returned by a post-save hook
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Called with the saved path and its content-less model after every save.
/// Failures are logged and do not fail the save.
pub type PostSaveHook =
    Arc<dyn Fn(&str, &ContentModel) -> std::result::Result<(), HookError> + Send + Sync>;

pub struct ContentsManagerBuilder {
    client: Arc<dyn StoreClient>,
    config: ContentsConfig,
    codec: Arc<dyn NotebookCodec>,
    post_save_hook: Option<PostSaveHook>,
}

impl ContentsManagerBuilder {
    #[must_use]
    pub fn config(mut self, config: ContentsConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn NotebookCodec>) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn post_save_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &ContentModel) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        self.post_save_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> std::result::Result<ContentsManager, ConfigError> {
        self.config.validate()?;
        let visibility = Visibility::new(self.config.hide_set()?, self.config.hide_dotted_objects);
        let containers = ContainerDirectory::new(
            self.client,
            self.config.cache_containers,
            self.config.retry.clone(),
        );
        let nav = Navigator::new(
            containers,
            self.config.retry.clone(),
            self.config.max_list_size,
        );
        let checkpoints = Checkpoints::new(
            self.config.checkpoint_dir.clone(),
            self.config.checkpoint_container.clone(),
        );
        Ok(ContentsManager {
            nav,
            visibility,
            checkpoints,
            codec: self.codec,
            post_save_hook: self.post_save_hook,
            config: self.config,
        })
    }
}

pub struct ContentsManager {
    nav: Navigator,
    visibility: Visibility,
    checkpoints: Checkpoints,
    codec: Arc<dyn NotebookCodec>,
    post_save_hook: Option<PostSaveHook>,
    config: ContentsConfig,
}

impl std::fmt::Debug for ContentsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentsManager")
            .field("config", &self.config)
            .field("has_post_save_hook", &self.post_save_hook.is_some())
            .finish_non_exhaustive()
    }
}

/// Join a virtual directory and a child name
fn child_path(dir: &str, name: &str) -> String {
    let dir = path::without_trailing_slash(path::strip_root(dir));
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// `report-Copy3` becomes `report`
fn strip_copy_suffix(stem: &str) -> &str {
    match stem.rfind("-Copy") {
        Some(idx) if stem[idx + 5..].chars().all(|c| c.is_ascii_digit()) => &stem[..idx],
        _ => stem,
    }
}

impl ContentsManager {
    pub fn builder(client: Arc<dyn StoreClient>) -> ContentsManagerBuilder {
        ContentsManagerBuilder {
            client,
            config: ContentsConfig::default(),
            codec: Arc::new(JsonNotebookCodec),
            post_save_hook: None,
        }
    }

    pub fn new(
        client: Arc<dyn StoreClient>,
        config: ContentsConfig,
    ) -> std::result::Result<Self, ConfigError> {
        Self::builder(client).config(config).build()
    }

    #[must_use]
    pub fn config(&self) -> &ContentsConfig {
        &self.config
    }

    /// True when an object exists at exactly `path`
    #[emit::debug_span("file_exists {path}")]
    pub async fn file_exists(&self, path: &str) -> Result<bool> {
        self.nav.file_exists(path).await
    }

    #[emit::debug_span("dir_exists {path}")]
    pub async fn dir_exists(&self, path: &str) -> Result<bool> {
        self.nav.dir_exists(path).await
    }

    #[emit::debug_span("exists {path}")]
    pub async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.nav.file_exists(path).await? || self.nav.dir_exists(path).await?)
    }

    #[emit::debug_span("is_hidden {path}")]
    pub async fn is_hidden(&self, path: &str) -> Result<bool> {
        if path.is_empty() {
            return Ok(false);
        }
        self.nav.is_hidden(path, &self.visibility).await
    }

    /// Model for `path`
    ///
    /// Paths without a `/`, paths ending in `/` and requests for a
    /// directory are answered as directories. Otherwise an object at the
    /// exact key wins, then a directory of the same name.
    #[emit::debug_span("get {path}")]
    pub async fn get(
        &self,
        path: &str,
        content: bool,
        kind: Option<ContentKind>,
        format: Option<Format>,
    ) -> Result<ContentModel> {
        let path = path::strip_root(path);
        let dir_route =
            !path.contains('/') || path.ends_with('/') || kind == Some(ContentKind::Directory);
        if dir_route {
            if let Some(kind) = kind.filter(|k| *k != ContentKind::Directory) {
                return Err(Error::type_conflict(format!(
                    "{path} is not a directory, cannot read it as a {kind}"
                )));
            }
            if kind == Some(ContentKind::Directory)
                && !path.ends_with('/')
                && self.nav.file_exists(path).await?
            {
                return Err(Error::type_conflict(format!("{path} is not a directory")));
            }
            let entry = self.nav.lookup_dir(path, content).await?;
            return self.directory(path, entry, content);
        }

        match self.nav.lookup(path, content).await? {
            Entry::File { container, info } => {
                let data = if content {
                    let (_, data) = self
                        .nav
                        .fetch(container.as_ref(), &info.key)
                        .await?
                        .ok_or_else(|| Error::not_found(format!("No such file: {path}")))?;
                    Some(data)
                } else {
                    None
                };
                let as_notebook = match kind {
                    Some(kind) => kind == ContentKind::Notebook,
                    None => ContentKind::for_name(path) == ContentKind::Notebook,
                };
                if as_notebook {
                    model::notebook_model(container.name(), &info, data.as_ref(), self.codec.as_ref())
                } else {
                    model::file_model(container.name(), &info, data.as_ref(), format)
                }
            }
            Entry::Missing => Err(Error::not_found(format!("No such file: {path}"))),
            entry => {
                if let Some(kind) = kind {
                    return Err(Error::type_conflict(format!(
                        "{path} is a directory, not a {kind}"
                    )));
                }
                self.directory(path, entry, content)
            }
        }
    }

    fn directory(&self, path: &str, entry: Entry, content: bool) -> Result<ContentModel> {
        match entry {
            Entry::Missing => Err(Error::not_found(format!("No such directory: {path}"))),
            Entry::File { .. } => Err(Error::type_conflict(format!("{path} is not a directory"))),
            Entry::Hidden if content => Err(Error::forbidden(format!(
                "Permission denied listing {path}"
            ))),
            Entry::Hidden => Ok(model::directory_model(path, None, false)),
            Entry::Root { containers } => {
                let members = containers.map(|names| {
                    names
                        .iter()
                        .filter(|name| self.visibility.should_list(name))
                        .map(|name| model::directory_model(name, None, true))
                        .collect()
                });
                Ok(model::directory_model("", members, true))
            }
            Entry::Directory {
                container,
                key,
                listing,
            } => {
                let hidden = self.visibility.is_dotted(path::basename(&key));
                let writable = listing.is_some() || !hidden;
                let members = listing.map(|listing| {
                    let children = Children::from_listing(&key, &listing, &self.visibility);
                    let mut members: Vec<ContentModel> = children
                        .files
                        .iter()
                        .map(|info| model::entry_model(container.name(), info))
                        .collect();
                    members.extend(children.dirs.iter().map(|sub| {
                        model::directory_model(&path::join(container.name(), sub), None, true)
                    }));
                    members
                });
                let count = members.as_ref().map_or(0, Vec::len);
                debug!("directory {path} has {count} visible members", path: path, count: count);
                Ok(model::directory_model(path, members, writable))
            }
        }
    }

    /// Write `model` at `path` and return the saved model without content
    #[emit::debug_span("save {path}")]
    pub async fn save(&self, model: SaveModel, path: &str) -> Result<ContentModel> {
        let path = path::strip_root(path);
        let parsed = ObjectPath::parse(path);
        if model.kind != ContentKind::Directory && model.content.is_none() {
            return Err(Error::bad_format("No file content provided"));
        }
        if parsed.key.is_empty() && model.kind != ContentKind::Directory {
            return Err(Error::forbidden(
                "You may only create directories (containers) at the root level",
            ));
        }
        let path = if model.kind == ContentKind::Directory && !parsed.key.is_empty() {
            path::with_trailing_slash(path)
        } else {
            path.to_string()
        };
        debug!("saving {path}", path: path);

        if let Err(e) = self.write(&model, &path).await {
            if e.is_classified() {
                return Err(e);
            }
            let err = e.to_string();
            error!("Error while saving file: {path} {error}", path: path, error: err);
            return Err(Error::unexpected(&path, e));
        }

        let saved = self.get(&path, false, Some(model.kind), None).await?;
        if let Some(hook) = &self.post_save_hook
            && let Err(e) = hook(&path, &saved)
        {
            let err = e.to_string();
            error!("Post-save hook failed for {path}: {error}", path: path, error: err);
        }
        Ok(saved)
    }

    async fn write(&self, model: &SaveModel, path: &str) -> Result<()> {
        match model.kind {
            ContentKind::Notebook => {
                let Some(Content::Notebook(doc)) = &model.content else {
                    return Err(Error::bad_format(format!(
                        "Notebook content for {path} must be a JSON object"
                    )));
                };
                _ = mutation::save_notebook(&self.nav, path, doc, self.codec.as_ref()).await?;
                // Every saved notebook keeps at least one checkpoint
                if self.checkpoints.list(&self.nav, path).await?.is_empty() {
                    _ = self.checkpoints.create(&self.nav, path).await?;
                }
                Ok(())
            }
            ContentKind::File => {
                let data = mutation::encode_file(path, model.content.as_ref(), model.format)?;
                _ = mutation::save_file(&self.nav, path, data).await?;
                Ok(())
            }
            ContentKind::Directory => mutation::save_directory(&self.nav, path).await,
        }
    }

    /// Delete a file or directory tree without touching checkpoints
    #[emit::debug_span("delete_file {path}")]
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        mutation::delete_path(&self.nav, path).await
    }

    /// Delete a file or directory tree and the checkpoints of a file
    #[emit::debug_span("delete {path}")]
    pub async fn delete(&self, path: &str) -> Result<()> {
        mutation::delete_path(&self.nav, path).await?;
        if self.checkpoints.location(path).is_ok() {
            self.checkpoints.delete_all(&self.nav, path).await?;
        }
        Ok(())
    }

    /// Move a file or directory tree without touching checkpoints
    #[emit::debug_span("rename_file {old_path} to {new_path}")]
    pub async fn rename_file(&self, old_path: &str, new_path: &str) -> Result<()> {
        mutation::rename_path(&self.nav, old_path, new_path).await
    }

    /// Move a file or directory tree, carrying a file's checkpoints along
    #[emit::debug_span("rename {old_path} to {new_path}")]
    pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        mutation::rename_path(&self.nav, old_path, new_path).await?;
        if self.checkpoints.location(old_path).is_ok() && self.checkpoints.location(new_path).is_ok()
        {
            self.checkpoints
                .rename_all(&self.nav, old_path, new_path)
                .await?;
        }
        Ok(())
    }

    #[emit::debug_span("create_checkpoint {path}")]
    pub async fn create_checkpoint(&self, path: &str) -> Result<Checkpoint> {
        self.checkpoints.create(&self.nav, path).await
    }

    #[emit::debug_span("get_checkpoint {id} {path}")]
    pub async fn get_checkpoint(&self, id: &str, path: &str) -> Result<ContentModel> {
        self.checkpoints
            .get(&self.nav, id, path, self.codec.as_ref())
            .await
    }

    /// Checkpoints of `path`, newest first
    #[emit::debug_span("list_checkpoints {path}")]
    pub async fn list_checkpoints(&self, path: &str) -> Result<Vec<Checkpoint>> {
        self.checkpoints.list(&self.nav, path).await
    }

    #[emit::debug_span("restore_checkpoint {id} {path}")]
    pub async fn restore_checkpoint(&self, id: &str, path: &str) -> Result<()> {
        self.checkpoints.restore(&self.nav, id, path).await
    }

    #[emit::debug_span("delete_checkpoint {id} {path}")]
    pub async fn delete_checkpoint(&self, id: &str, path: &str) -> Result<()> {
        self.checkpoints.delete(&self.nav, id, path).await
    }

    #[emit::debug_span("rename_checkpoint {id} {old_path} to {new_path}")]
    pub async fn rename_checkpoint(&self, id: &str, old_path: &str, new_path: &str) -> Result<()> {
        self.checkpoints
            .rename(&self.nav, id, old_path, new_path)
            .await
    }

    #[emit::debug_span("rename_all_checkpoints {old_path} to {new_path}")]
    pub async fn rename_all_checkpoints(&self, old_path: &str, new_path: &str) -> Result<()> {
        self.checkpoints
            .rename_all(&self.nav, old_path, new_path)
            .await
    }

    #[emit::debug_span("delete_all_checkpoints {path}")]
    pub async fn delete_all_checkpoints(&self, path: &str) -> Result<()> {
        self.checkpoints.delete_all(&self.nav, path).await
    }

    /// First free name in `dir`: `{stem}{ext}`, then `{stem}{insert}1{ext}`, ...
    async fn increment_name(&self, dir: &str, stem: &str, ext: &str, insert: &str) -> Result<String> {
        let mut n = 0usize;
        loop {
            let name = if n == 0 {
                format!("{stem}{ext}")
            } else {
                format!("{stem}{insert}{n}{ext}")
            };
            if !self.exists(&child_path(dir, &name)).await? {
                return Ok(name);
            }
            n += 1;
        }
    }

    /// Create an empty file, notebook or directory under a fresh name
    #[emit::debug_span("new_untitled {dir}")]
    pub async fn new_untitled(
        &self,
        dir: &str,
        kind: ContentKind,
        ext: &str,
    ) -> Result<ContentModel> {
        if !self.dir_exists(dir).await? {
            return Err(Error::not_found(format!("No such directory: {dir}")));
        }
        let (stem, ext, model) = match kind {
            ContentKind::Directory => (&self.config.untitled_directory, "", SaveModel::directory()),
            ContentKind::Notebook => (
                &self.config.untitled_notebook,
                model::NOTEBOOK_SUFFIX,
                SaveModel::notebook(self.codec.empty()),
            ),
            ContentKind::File => (&self.config.untitled_file, ext, SaveModel::text("")),
        };
        let name = self.increment_name(dir, stem, ext, "").await?;
        self.save(model, &child_path(dir, &name)).await
    }

    /// Copy a file or notebook
    ///
    /// When `to` is an existing directory the copy lands inside it, named
    /// after the source (`{stem}-Copy{n}{ext}` if that name is taken).
    #[emit::debug_span("copy {from} to {to}")]
    pub async fn copy(&self, from: &str, to: &str) -> Result<ContentModel> {
        let from = path::strip_root(from);
        let source = self.get(from, true, None, None).await?;
        if source.kind == ContentKind::Directory {
            return Err(Error::invalid_path(format!("Can't copy directories: {from}")));
        }
        let target = if self.dir_exists(to).await? {
            let (stem, ext) = path::split_ext(path::basename(from));
            let name = self
                .increment_name(to, strip_copy_suffix(stem), ext, "-Copy")
                .await?;
            child_path(to, &name)
        } else {
            path::strip_root(to).to_string()
        };
        let model = SaveModel {
            kind: source.kind,
            content: source.content,
            format: source.format,
        };
        self.save(model, &target).await
    }
}
