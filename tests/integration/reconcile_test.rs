//! Integration tests for directory listing and metadata self-heal.

mod helpers;

use cloudfm_core::error::ErrorKind;
use cloudfm_core::path;
use cloudfm_entity::{FileDoc, MetadataDocument};
use cloudfm_service::DirectoryState;
use cloudfm_storage::FaultOp;

#[tokio::test]
async fn test_listing_merges_blobs_and_docs_in_date_order() {
    let app = helpers::TestApp::new();
    app.seed_file("", "report", b"r").await;
    app.seed_file("", "15oct", b"o").await;
    app.seed_file("", "a", b"a").await;
    app.seed_file("", "3nov", b"n").await;
    app.mkdir("projects").await;
    app.put_blob("uid/implicit/deep/x.txt", b"x").await;

    let listing = app.list("").await;
    let files: Vec<&str> = listing.files.iter().map(|f| f.name()).collect();
    assert_eq!(files, vec!["a", "report", "15oct", "3nov"]);
    let folders: Vec<&str> = listing.folders.iter().map(|f| f.name()).collect();
    assert_eq!(folders, vec!["implicit", "projects"]);
    assert!(listing.files.iter().all(|f| !path::is_placeholder(f.name())));
}

#[tokio::test]
async fn test_doc_attributes_win_over_synthesized_ones() {
    let app = helpers::TestApp::new();
    let note = app
        .services
        .files
        .create_note(&app.ctx, "", "todo", "milk")
        .await
        .unwrap();
    app.clock.advance(chrono::Duration::hours(1));

    let listed = app.file("todo").await;
    assert!(listed.is_clipboard);
    assert_eq!(listed.base.created_at, note.base.created_at);
}

#[tokio::test]
async fn test_self_heal_writes_once() {
    let app = helpers::TestApp::new();
    app.put_blob("uid/docs/orphan.txt", b"lost").await;

    let (first, second) = tokio::join!(app.list("docs"), app.list("docs"));
    assert_eq!(first.files.len(), 1);
    assert_eq!(second.files.len(), 1);
    app.services.flush_heals().await;

    let third = app.list("docs").await;
    app.services.flush_heals().await;

    assert_eq!(third.files[0].full_path(), "uid/docs/orphan.txt");
    assert_eq!(app.metadata.faults().calls(FaultOp::Set), 1);
    assert_eq!(app.file_doc_paths().await, vec!["uid/docs/orphan.txt"]);
}

#[tokio::test]
async fn test_heal_failure_is_not_raised() {
    let app = helpers::TestApp::new();
    app.put_blob("uid/orphan.txt", b"lost").await;
    app.metadata.faults().fail_on(FaultOp::Set, "files/uid/orphan.txt");

    let listing = app.list("").await;
    app.services.flush_heals().await;

    assert_eq!(listing.files.len(), 1);
    assert!(app.file_doc_paths().await.is_empty());

    app.metadata.faults().clear();
    app.list("").await;
    app.services.flush_heals().await;
    assert_eq!(app.file_doc_paths().await, vec!["uid/orphan.txt"]);
}

#[tokio::test]
async fn test_listing_failure_propagates() {
    let app = helpers::TestApp::new();
    app.files.faults().fail_on(FaultOp::List, "uid/");
    let err = app
        .services
        .reconciler
        .list_directory(&app.ctx, "")
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Storage));
}

#[tokio::test]
async fn test_starred_flag_is_merged() {
    let app = helpers::TestApp::new();
    let file = app.seed_file("", "share.txt", b"s").await;
    app.seed_file("", "private.txt", b"p").await;
    app.services
        .shares
        .toggle_star(&app.ctx, &file)
        .await
        .unwrap();

    let listing = app.list("").await;
    assert!(listing.find_file("share.txt").unwrap().starred);
    assert!(!listing.find_file("private.txt").unwrap().starred);
}

#[tokio::test]
async fn test_directory_state_navigation() {
    let app = helpers::TestApp::new();
    app.mkdir("a").await;
    app.mkdir("a/b").await;
    app.seed_file("a/b", "c.txt", b"c").await;
    let reconciler = &app.services.reconciler;

    let state = DirectoryState::new();
    state.navigate(reconciler, &app.ctx, "a/b").await.unwrap();
    assert_eq!(state.current_directory().await, "a/b");
    assert_eq!(state.snapshot().await.files.len(), 1);

    app.seed_file("a/b", "d.txt", b"d").await;
    assert_eq!(state.snapshot().await.files.len(), 1);
    state.refresh(reconciler, &app.ctx).await.unwrap();
    assert_eq!(state.snapshot().await.files.len(), 2);

    let up = state.back(reconciler, &app.ctx).await.unwrap();
    assert_eq!(up.directory, "a");
    assert_eq!(up.folders[0].name(), "b");

    app.files.faults().fail_on(FaultOp::List, "uid/missing");
    assert!(state.navigate(reconciler, &app.ctx, "missing").await.is_err());
    assert_eq!(state.current_directory().await, "a");
}

#[tokio::test]
async fn test_malformed_doc_id_is_rejected() {
    assert!(path::decode_doc_id("%%%").is_err());
    let doc = FileDoc::new("uid", "x", "y.txt", 0, false);
    assert_eq!(path::decode_doc_id(&doc.doc_id()).unwrap(), "uid/x/y.txt");
}
