// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bucketfs::ContentsManager;
use diagnostics::info;

use crate::common::to_json;

pub async fn checkpoint_create_command(cm: &ContentsManager, path: &str) -> Result<String> {
    let checkpoint = cm.create_checkpoint(path).await?;
    to_json(&checkpoint)
}

/// `{id} {last_modified}` per checkpoint, newest first
pub async fn checkpoint_list_command(cm: &ContentsManager, path: &str) -> Result<String> {
    let checkpoints = cm.list_checkpoints(path).await?;
    Ok(checkpoints
        .iter()
        .map(|c| format!("{} {}\n", c.id, c.last_modified.to_rfc3339()))
        .collect())
}

pub async fn checkpoint_restore_command(cm: &ContentsManager, path: &str, id: &str) -> Result<String> {
    cm.restore_checkpoint(id, path).await?;
    info!("Restored {path} from checkpoint {id}", path: path, id: id);
    Ok(String::new())
}

pub async fn checkpoint_delete_command(cm: &ContentsManager, path: &str, id: &str) -> Result<String> {
    cm.delete_checkpoint(id, path).await?;
    Ok(String::new())
}
