// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bucketfs::ContentsManager;
use diagnostics::info;

pub async fn remove_command(cm: &ContentsManager, path: &str, keep_checkpoints: bool) -> Result<String> {
    if keep_checkpoints {
        cm.delete_file(path).await?;
    } else {
        cm.delete(path).await?;
    }
    info!("Removed {path}", path: path);
    Ok(String::new())
}
