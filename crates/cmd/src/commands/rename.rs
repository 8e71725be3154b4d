// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bucketfs::ContentsManager;
use diagnostics::info;

/// Move a file or directory; checkpoints of a file move with it
pub async fn rename_command(cm: &ContentsManager, from: &str, to: &str) -> Result<String> {
    cm.rename(from, to).await?;
    info!("Moved {from} to {to}", from: from, to: to);
    Ok(String::new())
}
