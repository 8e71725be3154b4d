// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bucketfs::{ContentsManager, SaveModel};
use diagnostics::info;

use crate::common::to_json;

/// Create a directory, or a container when `path` has a single segment
pub async fn mkdir_command(cm: &ContentsManager, path: &str) -> Result<String> {
    let model = cm.save(SaveModel::directory(), path).await?;
    info!("Directory created: {path}", path: path);
    to_json(&model)
}
