// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{BUCKET, notebook, setup};
use crate::*;

fn names(model: &ContentModel) -> Vec<String> {
    let mut names: Vec<String> = model
        .members()
        .unwrap_or_default()
        .iter()
        .map(|m| m.name.clone())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_get_text_file() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store.put_object(BUCKET, "dir/a.txt", b"hello").await;

    let model = cm.get("bucket/dir/a.txt", true, None, None).await?;
    assert_eq!(model.kind, ContentKind::File);
    assert_eq!(model.name, "a.txt");
    assert_eq!(model.path, "bucket/dir/a.txt");
    assert_eq!(model.text(), Some("hello"));
    assert_eq!(model.format, Some(Format::Text));
    assert_eq!(model.mimetype.as_deref(), Some("text/plain"));
    assert!(model.writable);
    assert!(model.created.is_some());
    assert_eq!(model.created, model.last_modified);

    let bare = cm.get("/bucket/dir/a.txt", false, None, None).await?;
    assert!(bare.content.is_none());
    assert!(bare.format.is_none());
    Ok(())
}

#[tokio::test]
async fn test_get_binary_file() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store.put_object(BUCKET, "blob.bin", &[0x00, 0x01, 0xFF]).await;

    let model = cm.get("bucket/blob.bin", true, None, None).await?;
    assert_eq!(model.format, Some(Format::Base64));
    assert_eq!(model.text(), Some("AAH/"));
    assert_eq!(model.mimetype.as_deref(), Some("application/octet-stream"));

    let err = cm
        .get("bucket/blob.bin", true, None, Some(Format::Text))
        .await
        .expect_err("not utf-8");
    assert!(matches!(err, Error::BadFormat(_)));
    assert_eq!(err.status_code(), 400);
    Ok(())
}

#[tokio::test]
async fn test_recorded_content_type_is_reported() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store
        .put_object_with_type(BUCKET, "page.html", b"<p/>", "text/html")
        .await;
    let model = cm.get("bucket/page.html", true, None, Some(Format::Base64)).await?;
    assert_eq!(model.mimetype.as_deref(), Some("text/html"));
    assert_eq!(model.format, Some(Format::Base64));
    Ok(())
}

#[tokio::test]
async fn test_get_notebook() -> Result<()> {
    let (store, cm) = setup().await;
    let data = serde_json::to_vec(&notebook()).expect("json");
    _ = store.put_object(BUCKET, "nb.ipynb", &data).await;

    let model = cm.get("bucket/nb.ipynb", true, None, None).await?;
    assert_eq!(model.kind, ContentKind::Notebook);
    assert_eq!(model.format, Some(Format::Json));
    assert_eq!(model.mimetype.as_deref(), Some("application/x-ipynb+json"));
    assert_eq!(model.notebook(), Some(&notebook()));

    // Read as a plain file on request
    let raw = cm
        .get("bucket/nb.ipynb", true, Some(ContentKind::File), None)
        .await?;
    assert_eq!(raw.kind, ContentKind::File);
    assert_eq!(raw.format, Some(Format::Text));
    Ok(())
}

#[tokio::test]
async fn test_unparsable_notebook_is_bad_format() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store.put_object(BUCKET, "broken.ipynb", b"{\"cells\": []}").await;
    assert!(matches!(
        cm.get("bucket/broken.ipynb", true, None, None).await,
        Err(Error::BadFormat(_))
    ));
    // Without content the document is never parsed
    let model = cm.get("bucket/broken.ipynb", false, None, None).await?;
    assert_eq!(model.kind, ContentKind::Notebook);
    Ok(())
}

#[tokio::test]
async fn test_directory_listing() -> Result<()> {
    let (store, cm) = setup().await;
    for key in [
        "dir/",
        "dir/a.txt",
        "dir/nb.ipynb",
        "dir/.secret",
        "dir/mod.pyc",
        "dir/backup~",
        "dir/sub/x.txt",
        "dir/__pycache__/m.pyc",
        "dir/.ipynb_checkpoints/nb-0.ipynb",
        "elsewhere.txt",
    ] {
        _ = store.put_object(BUCKET, key, b"").await;
    }

    let model = cm.get("bucket/dir", true, None, None).await?;
    assert_eq!(model.kind, ContentKind::Directory);
    assert_eq!(model.name, "dir");
    assert_eq!(model.path, "bucket/dir");
    assert_eq!(model.format, Some(Format::Json));
    assert_eq!(model.mimetype.as_deref(), Some("application/x-directory"));
    assert!(model.created.is_none() && model.last_modified.is_none());
    assert_eq!(names(&model), vec!["a.txt", "nb.ipynb", "sub"]);

    let members = model.members().unwrap_or_default();
    for member in members {
        assert!(member.content.is_none(), "{} has content", member.name);
        assert!(member.format.is_none());
        assert!(!member.path.ends_with('/'));
    }
    let kinds: Vec<_> = members.iter().map(|m| (m.name.as_str(), m.kind)).collect();
    assert!(kinds.contains(&("nb.ipynb", ContentKind::Notebook)));
    assert!(kinds.contains(&("a.txt", ContentKind::File)));
    assert!(kinds.contains(&("sub", ContentKind::Directory)));
    Ok(())
}

#[tokio::test]
async fn test_container_listing() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store.put_object(BUCKET, "top.txt", b"").await;
    _ = store.put_object(BUCKET, "d/x", b"").await;

    let model = cm.get(BUCKET, true, None, None).await?;
    assert_eq!(model.path, BUCKET);
    assert_eq!(model.name, BUCKET);
    assert_eq!(names(&model), vec!["d", "top.txt"]);

    let members = model.members().unwrap_or_default();
    let paths: Vec<_> = members.iter().map(|m| m.path.as_str()).collect();
    assert!(paths.contains(&"bucket/d"));
    assert!(paths.contains(&"bucket/top.txt"));
    Ok(())
}

#[tokio::test]
async fn test_root_listing() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store.create_container("second").await?;

    let root = cm.get("", true, None, None).await?;
    assert_eq!(root.kind, ContentKind::Directory);
    assert_eq!(root.path, "");
    assert_eq!(names(&root), vec!["bucket", "second"]);
    for member in root.members().unwrap_or_default() {
        assert_eq!(member.kind, ContentKind::Directory);
        assert!(member.content.is_none());
    }

    let bare = cm.get("/", false, None, None).await?;
    assert!(bare.content.is_none());
    Ok(())
}

#[tokio::test]
async fn test_object_first_then_directory() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store.put_object(BUCKET, "test/other", b"").await;

    let dir = cm.get("bucket/test", false, None, None).await?;
    assert_eq!(dir.kind, ContentKind::Directory);
    assert_eq!(dir.path, "bucket/test");

    _ = store.put_object(BUCKET, "test", b"plain").await;
    let file = cm.get("bucket/test", true, None, None).await?;
    assert_eq!(file.kind, ContentKind::File);
    assert_eq!(file.text(), Some("plain"));
    assert!(cm.dir_exists("bucket/test").await?);

    let listed = cm.get("bucket/test/", true, None, None).await?;
    assert_eq!(names(&listed), vec!["other"]);
    Ok(())
}

#[tokio::test]
async fn test_type_conflicts() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store.put_object(BUCKET, "a", b"file").await;
    _ = store.put_object(BUCKET, "d/x", b"").await;

    let err = cm
        .get("bucket/a", true, Some(ContentKind::Directory), None)
        .await
        .expect_err("file read as directory");
    assert!(matches!(err, Error::TypeConflict(_)));

    assert!(matches!(
        cm.get("bucket/d/", true, Some(ContentKind::File), None).await,
        Err(Error::TypeConflict(_))
    ));
    assert!(matches!(
        cm.get(BUCKET, true, Some(ContentKind::Notebook), None).await,
        Err(Error::TypeConflict(_))
    ));
    assert!(matches!(
        cm.get("bucket/d", true, Some(ContentKind::File), None).await,
        Err(Error::TypeConflict(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_missing_paths() -> Result<()> {
    let (_store, cm) = setup().await;
    let err = cm
        .get("bucket/nope.txt", true, None, None)
        .await
        .expect_err("missing");
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(err.status_code(), 404);
    assert!(matches!(
        cm.get("bucket/nope/", true, None, None).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        cm.get("absent", false, None, None).await,
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_forbidden_container() -> Result<()> {
    let (store, cm) = setup().await;
    store.forbid(BUCKET).await;

    let placeholder = cm.get(BUCKET, false, None, None).await?;
    assert_eq!(placeholder.kind, ContentKind::Directory);
    assert!(!placeholder.writable);

    assert!(matches!(
        cm.get(BUCKET, true, None, None).await,
        Err(Error::Forbidden(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_dotted_directory_writable_only_when_listed() -> Result<()> {
    let (store, cm) = setup().await;
    _ = store.put_object(BUCKET, ".cache/", b"").await;
    let bare = cm.get("bucket/.cache/", false, None, None).await?;
    assert!(!bare.writable);
    let listed = cm.get("bucket/.cache/", true, None, None).await?;
    assert!(listed.writable);
    Ok(())
}

#[tokio::test]
async fn test_listing_page_size() -> Result<()> {
    let config = ContentsConfig {
        max_list_size: 2,
        ..super::test_config()
    };
    let (store, cm) = super::setup_with(config).await;
    for key in ["d/1", "d/2", "d/3", "d/4"] {
        _ = store.put_object(BUCKET, key, b"").await;
    }
    let model = cm.get("bucket/d", true, None, None).await?;
    assert_eq!(model.members().map(<[ContentModel]>::len), Some(2));
    Ok(())
}
