// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, anyhow};
use bucketfs::{Content, ContentsManager, Format};

/// File content as text or base64; notebooks as their JSON document
pub async fn cat_command(cm: &ContentsManager, path: &str, format: Option<Format>) -> Result<String> {
    let model = cm.get(path, true, None, format).await?;
    match model.content {
        Some(Content::Text(text)) => Ok(text),
        Some(Content::Notebook(doc)) => crate::common::to_json(&doc),
        Some(Content::Directory(_)) | None => Err(anyhow!("{path} is a directory")),
    }
}
