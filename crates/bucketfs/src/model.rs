// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Content models returned to hosts
//!
//! A model describes one file, notebook or directory. Content is only
//! filled in when the caller asked for it; entries inside a directory
//! listing never carry content.

use crate::codec::NotebookCodec;
use crate::error::{Error, Result};
use crate::path;
use crate::store::{
    BINARY_CONTENT_TYPE, DEFAULT_CONTENT_TYPE, DIRECTORY_CONTENT_TYPE, NOTEBOOK_CONTENT_TYPE,
    ObjectInfo,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Suffix that marks an object as a notebook
pub const NOTEBOOK_SUFFIX: &str = ".ipynb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Directory,
    Notebook,
}

impl ContentKind {
    /// Kind implied by a name when the caller gave none
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        if name.ends_with(NOTEBOOK_SUFFIX) {
            ContentKind::Notebook
        } else {
            ContentKind::File
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentKind::File => "file",
            ContentKind::Directory => "directory",
            ContentKind::Notebook => "notebook",
        };
        f.pad(s)
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(ContentKind::File),
            "directory" => Ok(ContentKind::Directory),
            "notebook" => Ok(ContentKind::Notebook),
            other => Err(Error::bad_format(format!("Unknown content type: {other}"))),
        }
    }
}

/// Encoding of [`ContentModel::content`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Text,
    Base64,
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Text => "text",
            Format::Base64 => "base64",
            Format::Json => "json",
        };
        f.pad(s)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Format::Text),
            "base64" => Ok(Format::Base64),
            "json" => Ok(Format::Json),
            other => Err(Error::bad_format(format!("Unknown format: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Text or base64, depending on the model's format
    Text(String),
    /// Directory members without content
    Directory(Vec<ContentModel>),
    /// A parsed notebook document
    Notebook(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentModel {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub name: String,
    /// Virtual path, never ending with `/`
    pub path: String,
    pub created: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub content: Option<Content>,
    pub format: Option<Format>,
    pub mimetype: Option<String>,
    pub writable: bool,
}

impl ContentModel {
    /// Text content, when this model carries text or base64
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(Content::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Directory members, when this is a listed directory
    #[must_use]
    pub fn members(&self) -> Option<&[ContentModel]> {
        match &self.content {
            Some(Content::Directory(members)) => Some(members),
            _ => None,
        }
    }

    #[must_use]
    pub fn notebook(&self) -> Option<&Value> {
        match &self.content {
            Some(Content::Notebook(doc)) => Some(doc),
            _ => None,
        }
    }
}

/// What a host submits to save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveModel {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub format: Option<Format>,
}

impl SaveModel {
    pub fn directory() -> Self {
        Self {
            kind: ContentKind::Directory,
            content: None,
            format: None,
        }
    }

    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            kind: ContentKind::File,
            content: Some(Content::Text(text.into())),
            format: Some(Format::Text),
        }
    }

    /// A file whose bytes are sent base64-encoded
    pub fn binary(data: &[u8]) -> Self {
        Self {
            kind: ContentKind::File,
            content: Some(Content::Text(STANDARD.encode(data))),
            format: Some(Format::Base64),
        }
    }

    pub fn notebook(doc: Value) -> Self {
        Self {
            kind: ContentKind::Notebook,
            content: Some(Content::Notebook(doc)),
            format: Some(Format::Json),
        }
    }
}

/// Decode base64 text, tolerating the line breaks some encoders insert
pub fn decode_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

/// Decode object bytes for a file model
///
/// Without a format, or with `text`, the bytes must be UTF-8; only an
/// explicit `text` request turns a decoding failure into an error.
pub fn read_file(path: &str, data: &[u8], format: Option<Format>) -> Result<(String, Format)> {
    match format {
        Some(Format::Base64) => Ok((STANDARD.encode(data), Format::Base64)),
        Some(Format::Json) => Err(Error::bad_format(format!(
            "{path} cannot be read as json"
        ))),
        Some(Format::Text) => match std::str::from_utf8(data) {
            Ok(text) => Ok((text.to_string(), Format::Text)),
            Err(_) => Err(Error::bad_format(format!("{path} is not UTF-8 encoded"))),
        },
        None => match std::str::from_utf8(data) {
            Ok(text) => Ok((text.to_string(), Format::Text)),
            Err(_) => Ok((STANDARD.encode(data), Format::Base64)),
        },
    }
}

fn base_model(kind: ContentKind, container: &str, info: &ObjectInfo) -> ContentModel {
    ContentModel {
        kind,
        name: info.name().to_string(),
        path: path::join(container, &info.key),
        created: Some(info.last_modified),
        last_modified: Some(info.last_modified),
        content: None,
        format: None,
        mimetype: Some(info.content_type.clone()),
        writable: true,
    }
}

/// Model for a listed object, kind taken from its name
#[must_use]
pub fn entry_model(container: &str, info: &ObjectInfo) -> ContentModel {
    base_model(ContentKind::for_name(&info.key), container, info)
}

pub fn file_model(
    container: &str,
    info: &ObjectInfo,
    data: Option<&Bytes>,
    format: Option<Format>,
) -> Result<ContentModel> {
    let mut model = base_model(ContentKind::File, container, info);
    if let Some(data) = data {
        let (text, format) = read_file(&model.path, data, format)?;
        if info.content_type == DEFAULT_CONTENT_TYPE {
            let mimetype = match format {
                Format::Base64 => BINARY_CONTENT_TYPE,
                _ => DEFAULT_CONTENT_TYPE,
            };
            model.mimetype = Some(mimetype.to_string());
        }
        model.content = Some(Content::Text(text));
        model.format = Some(format);
    }
    Ok(model)
}

pub fn notebook_model(
    container: &str,
    info: &ObjectInfo,
    data: Option<&Bytes>,
    codec: &dyn NotebookCodec,
) -> Result<ContentModel> {
    let mut model = base_model(ContentKind::Notebook, container, info);
    if let Some(data) = data {
        let doc = codec.parse(data)?;
        model.content = Some(Content::Notebook(doc));
        model.format = Some(Format::Json);
        model.mimetype = Some(NOTEBOOK_CONTENT_TYPE.to_string());
    }
    Ok(model)
}

/// Directory model; `members` is present when content was requested
#[must_use]
pub fn directory_model(
    virtual_path: &str,
    members: Option<Vec<ContentModel>>,
    writable: bool,
) -> ContentModel {
    let trimmed = path::without_trailing_slash(path::strip_root(virtual_path));
    let format = members.as_ref().map(|_| Format::Json);
    ContentModel {
        kind: ContentKind::Directory,
        name: path::basename(trimmed).to_string(),
        path: trimmed.to_string(),
        created: None,
        last_modified: None,
        content: members.map(Content::Directory),
        format,
        mimetype: Some(DIRECTORY_CONTENT_TYPE.to_string()),
        writable,
    }
}
