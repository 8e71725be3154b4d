// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Virtual path handling
//!
//! A virtual path is `container/key`. The empty path and `/` are the root,
//! which lists containers. A trailing `/` marks a directory even when no
//! object exists at that key.

/// A virtual path split into its container and object key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath<'a> {
    pub container: &'a str,
    pub key: &'a str,
}

impl<'a> ObjectPath<'a> {
    /// Split a virtual path; never fails and performs no I/O
    #[must_use]
    pub fn parse(path: &'a str) -> Self {
        let path = strip_root(path);
        match path.split_once('/') {
            Some((container, key)) => ObjectPath { container, key },
            None => ObjectPath {
                container: path,
                key: "",
            },
        }
    }

    /// The root has no container
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.container.is_empty()
    }

    /// An empty key addresses the container's own root directory
    #[must_use]
    pub fn is_container(&self) -> bool {
        !self.container.is_empty() && self.key.is_empty()
    }

    #[must_use]
    pub fn is_dir_key(&self) -> bool {
        self.key.is_empty() || self.key.ends_with('/')
    }
}

/// Strips at most one leading `/`
#[must_use]
pub fn strip_root(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Appends a trailing `/` when missing
#[must_use]
pub fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Removes one trailing `/`, if present
#[must_use]
pub fn without_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

/// Last segment of a path, ignoring one trailing `/`
#[must_use]
pub fn basename(path: &str) -> &str {
    let path = without_trailing_slash(path);
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Everything up to and including the last `/` before the base name
#[must_use]
pub fn parent_prefix(path: &str) -> &str {
    let trimmed = without_trailing_slash(path);
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[..=idx],
        None => "",
    }
}

/// Join a container and key back into a virtual path
#[must_use]
pub fn join(container: &str, key: &str) -> String {
    if key.is_empty() {
        container.to_string()
    } else {
        format!("{container}/{key}")
    }
}

/// Split a file name into stem and extension
///
/// The extension keeps its dot. Leading dots belong to the stem, so
/// `.bashrc` has no extension.
#[must_use]
pub fn split_ext(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(idx) => name.split_at(leading + idx),
        None => (name, ""),
    }
}
