//! Integration tests for the recycle-bin view and bin actions.

mod helpers;

use cloudfm_core::error::ErrorKind;
use cloudfm_entity::BinKind;
use cloudfm_storage::FaultOp;

use helpers::{TestApp, progress};

fn names(items: &[cloudfm_entity::BinItem]) -> Vec<(&str, BinKind)> {
    items.iter().map(|i| (i.name.as_str(), i.kind)).collect()
}

#[tokio::test]
async fn test_collapse_thin_chain_and_expand_fork_once() {
    let app = TestApp::new();
    for key in [
        "uid/Chain/Mid/p.txt",
        "uid/Chain/Mid/q.txt",
        "uid/Old/Deep/file.txt",
        "uid/Proj/a.txt",
        "uid/Proj/lib/deep/z.rs",
        "uid/Proj/src/x.rs",
        "uid/Proj/src/y.rs",
    ] {
        app.put_recycled(key).await;
    }

    let items = app.services.resolver.resolve_bin("uid").await.unwrap();

    assert_eq!(
        names(&items),
        vec![
            ("Chain/Mid/p.txt", BinKind::File),
            ("Chain/Mid/q.txt", BinKind::File),
            ("Old/Deep/file.txt", BinKind::File),
            ("Proj/a.txt", BinKind::File),
            ("Proj/lib/deep/z.rs", BinKind::File),
            ("Proj/src", BinKind::Folder),
        ]
    );
    assert_eq!(items[0].full_path, "uid/Chain/Mid/p.txt");
    assert_eq!(items[2].full_path, "uid/Old/Deep/file.txt");
    assert_eq!(items[5].full_path, "uid/Proj/src");
}

#[tokio::test]
async fn test_chain_then_fork_of_files() {
    let app = TestApp::new();
    app.put_recycled("uid/A/B/C/D").await;
    app.put_recycled("uid/A/B/C/E").await;

    let items = app.services.resolver.resolve_bin("uid").await.unwrap();
    let got: Vec<(&str, &str)> = items
        .iter()
        .map(|i| (i.name.as_str(), i.full_path.as_str()))
        .collect();
    assert_eq!(
        got,
        vec![("A/B/C/D", "uid/A/B/C/D"), ("A/B/C/E", "uid/A/B/C/E")]
    );
}

#[tokio::test]
async fn test_chain_then_fork_keeps_grouped_branch() {
    let app = TestApp::new();
    app.put_recycled("uid/A/B/X/f1").await;
    app.put_recycled("uid/A/B/X/f2").await;
    app.put_recycled("uid/A/B/Y").await;

    let items = app.services.resolver.resolve_bin("uid").await.unwrap();
    let got: Vec<(&str, &str, BinKind)> = items
        .iter()
        .map(|i| (i.name.as_str(), i.full_path.as_str(), i.kind))
        .collect();
    assert_eq!(
        got,
        vec![
            ("A/B/X", "uid/A/B/X", BinKind::Folder),
            ("A/B/Y", "uid/A/B/Y", BinKind::File),
        ]
    );
}

#[tokio::test]
async fn test_placeholder_only_folder_is_one_item() {
    let app = TestApp::new();
    app.put_recycled("uid/Empty/.placeholder").await;
    app.put_recycled("uid/.placeholder").await;

    let items = app.services.resolver.resolve_bin("uid").await.unwrap();
    assert_eq!(names(&items), vec![("Empty", BinKind::Folder)]);
}

#[tokio::test]
async fn test_branch_listing_error_degrades_to_item() {
    let app = TestApp::new();
    app.put_recycled("uid/Proj/a.txt").await;
    app.put_recycled("uid/Proj/src/x.rs").await;
    app.put_recycled("uid/Proj/src/y.rs").await;
    app.recycle.faults().fail_on(FaultOp::List, "uid/Proj/src");

    let items = app.services.resolver.resolve_bin("uid").await.unwrap();
    assert_eq!(
        names(&items),
        vec![("Proj/a.txt", BinKind::File), ("Proj/src", BinKind::Folder)]
    );
}

#[tokio::test]
async fn test_top_level_listing_error_is_returned() {
    let app = TestApp::new();
    app.recycle.faults().fail_on(FaultOp::List, "uid");
    let err = app.services.resolver.resolve_bin("uid").await.unwrap_err();
    assert!(err.is(ErrorKind::Storage));
}

#[tokio::test]
async fn test_deleted_folder_shows_up_then_purges() {
    let app = TestApp::new();
    app.mkdir("album").await;
    app.seed_file("album", "one.jpg", b"1").await;
    app.seed_file("album/raw", "two.jpg", b"2").await;
    let folder = app.folder("album").await;
    app.services
        .folders
        .delete_folder(&app.ctx, &folder, &progress())
        .await
        .unwrap();

    let items = app.services.resolver.resolve_bin("uid").await.unwrap();
    assert_eq!(
        names(&items),
        vec![
            ("album/one.jpg", BinKind::File),
            ("album/raw/two.jpg", BinKind::File)
        ]
    );

    let mut downloaded = app.services.bin.download(&app.ctx, &items[1]).await.unwrap();
    assert_eq!(downloaded.len(), 1);
    let file = downloaded.remove(0);
    assert_eq!(file.relative_path, "two.jpg");
    assert_eq!(&file.data[..], b"2");

    let report = app.services.bin.purge(&app.ctx, &items[1]).await.unwrap();
    assert_eq!(report.message(), "\"album/raw/two.jpg\" permanently deleted.");
    assert_eq!(app.recycled_keys().await, vec!["uid/album/one.jpg"]);
}

#[tokio::test]
async fn test_purge_folder_item_removes_everything_beneath() {
    let app = TestApp::new();
    for key in [
        "uid/Proj/a.txt",
        "uid/Proj/src/.placeholder",
        "uid/Proj/src/x.rs",
        "uid/Proj/src/y.rs",
        "uid/Other/keep.txt",
    ] {
        app.put_recycled(key).await;
    }
    let items = app.services.resolver.resolve_bin("uid").await.unwrap();
    let src = items.iter().find(|i| i.name == "Proj/src").unwrap();

    let files = app.services.bin.download(&app.ctx, src).await.unwrap();
    let mut paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["src/x.rs", "src/y.rs"]);

    app.services.bin.purge(&app.ctx, src).await.unwrap();
    assert_eq!(
        app.recycled_keys().await,
        vec!["uid/Other/keep.txt", "uid/Proj/a.txt"]
    );
}
