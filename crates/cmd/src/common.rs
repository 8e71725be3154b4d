// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use bucketfs::{ContentKind, ContentModel, ContentsConfig, ContentsManager, LocalStoreClient};

/// Environment variable naming the store root when `--store` is absent
pub const STORE_ENV: &str = "BUCKETFS_STORE";

/// Store root from the command line, falling back to `BUCKETFS_STORE`
pub fn get_store_path_with_override(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }
    env::var(STORE_ENV)
        .map(PathBuf::from)
        .map_err(|_| anyhow!("{STORE_ENV} environment variable not set and no --store given"))
}

pub fn load_config(path: Option<&Path>) -> Result<ContentsConfig> {
    match path {
        Some(path) => ContentsConfig::from_file(path)
            .map_err(|e| anyhow!("Failed to load config {}: {}", path.display(), e)),
        None => Ok(ContentsConfig::default()),
    }
}

/// Contents manager over the local-disk store rooted at `root`
pub fn open_manager(root: &Path, config: ContentsConfig) -> Result<ContentsManager> {
    let client = LocalStoreClient::new(root)
        .map_err(|e| anyhow!("Failed to open store at {}: {}", root.display(), e))?;
    ContentsManager::new(Arc::new(client), config)
        .map_err(|e| anyhow!("Invalid configuration: {}", e))
}

pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// One line of `ls` output: kind, modification time and name
pub fn format_entry(model: &ContentModel) -> String {
    let time = model
        .last_modified
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let suffix = if model.kind == ContentKind::Directory {
        "/"
    } else {
        ""
    };
    format!("{:<9} {:<19} {}{}\n", model.kind, time, model.name, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_path_override_wins() -> Result<()> {
        let path = get_store_path_with_override(Some(PathBuf::from("/tmp/elsewhere")))?;
        assert_eq!(path, PathBuf::from("/tmp/elsewhere"));
        Ok(())
    }

    #[test]
    fn test_load_config_from_yaml() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("bucketfs.yaml");
        std::fs::write(&path, "max_list_size: 7\ncache_containers: false\n")?;
        let config = load_config(Some(&path))?;
        assert_eq!(config.max_list_size, 7);
        assert!(!config.cache_containers);
        assert_eq!(load_config(None)?.max_list_size, 1024);

        std::fs::write(&path, "max_list_size: 0\n")?;
        let tmp_store = tmp.path().join("store");
        let bad = load_config(Some(&path)).and_then(|c| open_manager(&tmp_store, c));
        assert!(bad.is_err());
        Ok(())
    }
}
