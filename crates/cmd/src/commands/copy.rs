// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bucketfs::ContentsManager;

use crate::common::to_json;

pub async fn copy_command(cm: &ContentsManager, from: &str, to: &str) -> Result<String> {
    let model = cm.copy(from, to).await?;
    to_json(&model)
}
