// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bucketfs::{ContentKind, ContentsManager};

use crate::common::to_json;

/// Create an untitled file, notebook or directory inside `dir`
pub async fn touch_command(
    cm: &ContentsManager,
    dir: &str,
    kind: ContentKind,
    ext: &str,
) -> Result<String> {
    let model = cm.new_untitled(dir, kind, ext).await?;
    to_json(&model)
}
