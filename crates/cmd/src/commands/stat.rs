// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bucketfs::ContentsManager;

use crate::common::to_json;

/// The model of `path` without its content, as JSON
pub async fn stat_command(cm: &ContentsManager, path: &str) -> Result<String> {
    let model = cm.get(path, false, None, None).await?;
    to_json(&model)
}
