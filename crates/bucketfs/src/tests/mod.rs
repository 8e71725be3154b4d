// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

mod checkpoints;
mod get;

use crate::config::{ContentsConfig, RetryConfig};
use crate::manager::ContentsManager;
use crate::memory::MemoryStore;
use crate::store::StoreClient;
use std::sync::Arc;

pub(crate) const BUCKET: &str = "bucket";

/// Configuration with retries that do not sleep
pub(crate) fn test_config() -> ContentsConfig {
    ContentsConfig {
        retry: RetryConfig {
            max_retries: 1,
            min_delay_ms: 0,
            max_delay_ms: 0,
        },
        ..ContentsConfig::default()
    }
}

/// A manager over a memory store holding one empty container
pub(crate) async fn setup() -> (Arc<MemoryStore>, ContentsManager) {
    setup_with(test_config()).await
}

pub(crate) async fn setup_with(config: ContentsConfig) -> (Arc<MemoryStore>, ContentsManager) {
    let store = Arc::new(MemoryStore::new());
    _ = store
        .create_container(BUCKET)
        .await
        .expect("create container");
    let manager = ContentsManager::new(store.clone(), config).expect("valid config");
    (store, manager)
}

pub(crate) fn notebook() -> serde_json::Value {
    serde_json::json!({
        "cells": [{"cell_type": "markdown", "metadata": {}, "source": "# hi"}],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5
    })
}

/// Sorted keys stored in `container`
pub(crate) async fn keys(store: &MemoryStore, container: &str) -> Vec<String> {
    match store.memory_container(container).await {
        Some(c) => c.keys().await,
        None => Vec::new(),
    }
}
