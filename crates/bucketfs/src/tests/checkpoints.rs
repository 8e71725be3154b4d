// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{BUCKET, keys, notebook, setup, setup_with, test_config};
use crate::*;

const NB: &str = "bucket/dir/nb.ipynb";

fn version(n: u64) -> serde_json::Value {
    let mut doc = notebook();
    doc["metadata"]["version"] = serde_json::json!(n);
    doc
}

#[tokio::test]
async fn test_checkpoints_newest_first() -> Result<()> {
    let (_store, cm) = setup().await;
    _ = cm.save(SaveModel::notebook(version(0)), NB).await?;
    let first = cm.list_checkpoints(NB).await?;
    let t2 = cm.create_checkpoint(NB).await?;
    let t3 = cm.create_checkpoint(NB).await?;

    let listed = cm.list_checkpoints(NB).await?;
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0], t3);
    assert_eq!(listed[1], t2);
    assert_eq!(listed[2], first[0]);
    assert!(listed[0].last_modified > listed[1].last_modified);
    assert!(listed[1].last_modified > listed[2].last_modified);
    Ok(())
}

#[tokio::test]
async fn test_restore_checkpoint() -> Result<()> {
    let (_store, cm) = setup().await;
    _ = cm.save(SaveModel::notebook(version(1)), NB).await?;
    let saved = cm.create_checkpoint(NB).await?;
    _ = cm.save(SaveModel::notebook(version(2)), NB).await?;

    let snapshot = cm.get_checkpoint(&saved.id, NB).await?;
    assert_eq!(snapshot.kind, ContentKind::Notebook);
    assert_eq!(snapshot.notebook(), Some(&version(1)));

    cm.restore_checkpoint(&saved.id, NB).await?;
    let current = cm.get(NB, true, None, None).await?;
    assert_eq!(current.notebook(), Some(&version(1)));
    Ok(())
}

#[tokio::test]
async fn test_file_checkpoints() -> Result<()> {
    let (store, cm) = setup().await;
    _ = cm.save(SaveModel::text("draft"), "bucket/a.txt").await?;
    // Plain files get no checkpoint on save
    assert!(cm.list_checkpoints("bucket/a.txt").await?.is_empty());

    let cp = cm.create_checkpoint("bucket/a.txt").await?;
    assert!(store.object_exists(BUCKET, &format!(".ipynb_checkpoints/a-{}.txt", cp.id)).await);

    let snapshot = cm.get_checkpoint(&cp.id, "bucket/a.txt").await?;
    assert_eq!(snapshot.kind, ContentKind::File);
    assert_eq!(snapshot.text(), Some("draft"));
    Ok(())
}

#[tokio::test]
async fn test_missing_checkpoints() -> Result<()> {
    let (_store, cm) = setup().await;
    _ = cm.save(SaveModel::notebook(notebook()), NB).await?;
    let bogus = "018f2b4e-0000-7000-8000-000000000000";

    let err = cm.get_checkpoint(bogus, NB).await.expect_err("missing");
    assert!(matches!(err, Error::NotFound(_)));
    assert!(err.to_string().contains(bogus));
    assert!(matches!(
        cm.restore_checkpoint(bogus, NB).await,
        Err(Error::NotFound(_))
    ));
    // Deleting an absent checkpoint succeeds
    cm.delete_checkpoint(bogus, NB).await?;

    assert!(matches!(
        cm.create_checkpoint("bucket/never-saved.ipynb").await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        cm.create_checkpoint("bucket/dir/").await,
        Err(Error::InvalidPath(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_delete_checkpoint() -> Result<()> {
    let (_store, cm) = setup().await;
    _ = cm.save(SaveModel::notebook(notebook()), NB).await?;
    let extra = cm.create_checkpoint(NB).await?;
    cm.delete_checkpoint(&extra.id, NB).await?;
    let remaining = cm.list_checkpoints(NB).await?;
    assert_eq!(remaining.len(), 1);
    assert_ne!(remaining[0].id, extra.id);

    cm.delete_all_checkpoints(NB).await?;
    assert!(cm.list_checkpoints(NB).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sibling_checkpoints_are_separate() -> Result<()> {
    let (_store, cm) = setup().await;
    _ = cm.save(SaveModel::notebook(notebook()), "bucket/a.ipynb").await?;
    _ = cm.save(SaveModel::notebook(notebook()), "bucket/a-b.ipynb").await?;
    assert_eq!(cm.list_checkpoints("bucket/a.ipynb").await?.len(), 1);
    assert_eq!(cm.list_checkpoints("bucket/a-b.ipynb").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rename_checkpoint() -> Result<()> {
    let (_store, cm) = setup().await;
    _ = cm.save(SaveModel::notebook(notebook()), NB).await?;
    let cp = cm.create_checkpoint(NB).await?;

    cm.rename_checkpoint(&cp.id, NB, "bucket/other.ipynb").await?;
    let moved = cm.list_checkpoints("bucket/other.ipynb").await?;
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].id, cp.id);
    assert_eq!(cm.list_checkpoints(NB).await?.len(), 1);

    cm.rename_all_checkpoints(NB, "bucket/other.ipynb").await?;
    assert!(cm.list_checkpoints(NB).await?.is_empty());
    assert_eq!(cm.list_checkpoints("bucket/other.ipynb").await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_checkpoint_container_override() -> Result<()> {
    let config = ContentsConfig {
        checkpoint_container: Some("archive".to_string()),
        ..test_config()
    };
    let (store, cm) = setup_with(config).await;
    _ = cm.save(SaveModel::directory(), "archive").await?;
    _ = cm.save(SaveModel::notebook(notebook()), NB).await?;

    let listed = cm.list_checkpoints(NB).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(
        keys(&store, "archive").await,
        vec![format!("dir/.ipynb_checkpoints/nb-{}.ipynb", listed[0].id)]
    );
    assert_eq!(keys(&store, BUCKET).await, vec!["dir/nb.ipynb".to_string()]);

    let snapshot = cm.get_checkpoint(&listed[0].id, NB).await?;
    assert_eq!(snapshot.notebook(), Some(&notebook()));
    Ok(())
}

#[tokio::test]
async fn test_missing_checkpoint_container_is_not_created() -> Result<()> {
    let config = ContentsConfig {
        checkpoint_container: Some("archive".to_string()),
        ..test_config()
    };
    let (store, cm) = setup_with(config).await;
    _ = store.put_object(BUCKET, "a.txt", b"hello").await;

    let err = cm
        .create_checkpoint("bucket/a.txt")
        .await
        .expect_err("archive is missing");
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(err.status_code(), 404);
    assert!(store.memory_container("archive").await.is_none());
    assert!(!cm.dir_exists("archive").await?);
    Ok(())
}

#[tokio::test]
async fn test_rename_between_containers_sharing_checkpoint_keys() -> Result<()> {
    let config = ContentsConfig {
        checkpoint_container: Some("archive".to_string()),
        ..test_config()
    };
    let (_store, cm) = setup_with(config).await;
    _ = cm.save(SaveModel::directory(), "archive").await?;
    _ = cm.save(SaveModel::directory(), "other").await?;
    _ = cm.save(SaveModel::text("hello"), "bucket/a.txt").await?;
    let cp = cm.create_checkpoint("bucket/a.txt").await?;

    cm.rename("bucket/a.txt", "other/a.txt").await?;
    let listed = cm.list_checkpoints("other/a.txt").await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, cp.id);
    Ok(())
}
