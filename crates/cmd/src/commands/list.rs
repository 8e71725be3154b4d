// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bucketfs::{ContentKind, ContentsManager};

use crate::common::format_entry;

/// Directory members, one per line, or the entry itself for a file
pub async fn list_command(cm: &ContentsManager, path: &str) -> Result<String> {
    let entry = cm.get(path, false, None, None).await?;
    if entry.kind != ContentKind::Directory {
        return Ok(format_entry(&entry));
    }
    let model = cm.get(path, true, None, None).await?;
    let mut members = model.members().unwrap_or_default().to_vec();
    members.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(members.iter().map(format_entry).collect())
}
