// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::{Result, anyhow};
use bucketfs::{ContentKind, ContentsManager, Format, SaveModel};

use crate::common::to_json;

/// Where the bytes to store come from
#[derive(Debug, Clone, Copy)]
pub enum PutSource<'a> {
    Content(&'a str),
    File(&'a Path),
}

/// Build the save request for `data` written at `path`
///
/// Notebook paths are parsed as JSON documents unless a text or base64
/// format is requested. Without a format, UTF-8 data is saved as text and
/// anything else as base64.
pub fn save_model_for(path: &str, data: Vec<u8>, format: Option<Format>) -> Result<SaveModel> {
    let notebook = ContentKind::for_name(path) == ContentKind::Notebook;
    match format {
        Some(Format::Json) if !notebook => Err(anyhow!("json format is only for notebooks")),
        Some(Format::Json) | None if notebook => {
            let doc = serde_json::from_slice(&data)
                .map_err(|e| anyhow!("Failed to parse notebook for {}: {}", path, e))?;
            Ok(SaveModel::notebook(doc))
        }
        Some(Format::Base64) => Ok(SaveModel::binary(&data)),
        Some(Format::Text) => {
            let text = String::from_utf8(data)
                .map_err(|_| anyhow!("Content for {} is not valid UTF-8", path))?;
            Ok(SaveModel::text(text))
        }
        _ => match String::from_utf8(data) {
            Ok(text) => Ok(SaveModel::text(text)),
            Err(e) => Ok(SaveModel::binary(e.as_bytes())),
        },
    }
}

pub async fn put_command(
    cm: &ContentsManager,
    path: &str,
    source: PutSource<'_>,
    format: Option<Format>,
) -> Result<String> {
    let data = match source {
        PutSource::Content(text) => text.as_bytes().to_vec(),
        PutSource::File(file) => tokio::fs::read(file)
            .await
            .map_err(|e| anyhow!("Failed to read '{}': {}", file.display(), e))?,
    };
    let model = save_model_for(path, data, format)?;
    let saved = cm.save(model, path).await?;
    to_json(&saved)
}
