//! Integration tests for upload admission and uploads.

mod helpers;

use bytes::Bytes;

use cloudfm_core::config::AppConfig;
use cloudfm_core::error::ErrorKind;
use cloudfm_core::types::ProgressReporter;
use cloudfm_service::{UploadFile, UploadNode, count_tree};
use cloudfm_storage::FaultOp;

use helpers::{TestApp, progress};

fn file(name: &str, size: usize) -> UploadNode {
    UploadNode::File(UploadFile::new(name, Bytes::from(vec![b'x'; size])))
}

fn dir(name: &str, children: Vec<UploadNode>) -> UploadNode {
    UploadNode::Directory {
        name: name.into(),
        children,
    }
}

fn project_tree() -> Vec<UploadNode> {
    vec![dir(
        "site",
        vec![
            file("index.html", 10),
            file("hero.png", 2_000_000),
            file("setup.exe", 10),
            dir(
                "css",
                vec![file("main.css", 10), file("reset.css", 10)],
            ),
            dir("assets", vec![file("logo.svg", 3_000_000), file("LICENSE", 5)]),
        ],
    )]
}

#[tokio::test]
async fn test_tree_admission_count_matches_uploads() {
    let app = TestApp::new();
    let tree = project_tree();
    let expected = count_tree(app.services.uploads.filter(), &tree);
    assert_eq!(expected.admitted, 5);
    assert_eq!(expected.oversized_images, 1);
    assert_eq!(expected.invalid_types, 1);

    let (reporter, rx) = ProgressReporter::channel();
    let report = app
        .services
        .uploads
        .upload_tree(&app.ctx, "", &tree, &reporter)
        .await
        .unwrap();

    assert_eq!(rx.borrow().total, expected.admitted);
    assert!(rx.borrow().is_done());
    assert_eq!(report.uploaded, expected.admitted);
    assert_eq!(report.folders_created, 3);
    assert_eq!(
        report.message(),
        "1 image(s) skipped (> 1MB). 1 file(s) skipped (invalid type). Upload complete!"
    );
    assert_eq!(app.file_doc_paths().await.len(), 5);
    assert_eq!(
        app.folder_doc_paths().await,
        vec!["uid/site/", "uid/site/assets/", "uid/site/css/"]
    );
    assert!(!app.files.contains("uid/site/hero.png").await);
    assert!(app.files.contains("uid/site/assets/LICENSE").await);
    assert_eq!(app.list("site").await.folders.len(), 2);
}

#[tokio::test]
async fn test_tree_with_nothing_admitted_makes_no_calls() {
    let app = TestApp::new();
    let tree = vec![dir(
        "junk",
        vec![file("a.exe", 1), dir("big", vec![file("b.jpg", 1_048_577)])],
    )];

    let err = app
        .services
        .uploads
        .upload_tree(&app.ctx, "", &tree, &progress())
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::Validation));
    assert_eq!(err.message, "No valid files found to upload.");
    assert_eq!(app.files.faults().total_calls(), 0);
    assert_eq!(app.metadata.faults().total_calls(), 0);
}

#[tokio::test]
async fn test_folder_failure_does_not_stop_children() {
    let app = TestApp::new();
    app.files.faults().fail_on(FaultOp::Upload, "uid/site/css/.placeholder");

    let report = app
        .services
        .uploads
        .upload_tree(&app.ctx, "", &project_tree(), &progress())
        .await
        .unwrap();

    assert_eq!(report.uploaded, 5);
    assert_eq!(report.folders_created, 2);
    assert!(app.files.contains("uid/site/css/main.css").await);
    assert_eq!(app.list("site").await.folders.len(), 2);
}

#[tokio::test]
async fn test_flat_upload_overwrites_existing() {
    let app = TestApp::new();
    app.seed_file("docs", "a.txt", b"old").await;

    let batch = vec![UploadFile::new("a.txt", Bytes::from_static(b"new"))];
    let report = app
        .services
        .uploads
        .upload_files(&app.ctx, "docs", &batch, &progress())
        .await
        .unwrap();

    assert_eq!(report.message(), "Upload complete!");
    let entry = app.file("docs/a.txt").await;
    assert_eq!(
        app.services.files.read_text(&app.ctx, &entry).await.unwrap(),
        "new"
    );
    assert_eq!(app.file_doc_paths().await, vec!["uid/docs/a.txt"]);
}

#[tokio::test]
async fn test_upload_reuses_name_differing_in_case() {
    let app = TestApp::new();
    app.seed_file("", "readme.md", b"old").await;

    let batch = vec![UploadFile::new("README.md", Bytes::from_static(b"new"))];
    let report = app
        .services
        .uploads
        .upload_files(&app.ctx, "", &batch, &progress())
        .await
        .unwrap();

    assert_eq!(report.uploaded, 1);
    assert_eq!(app.file_doc_paths().await, vec!["uid/readme.md"]);
    assert!(!app.files.contains("uid/README.md").await);
    let listing = app.list("").await;
    assert_eq!(listing.files.len(), 1);
    let entry = app.file("readme.md").await;
    assert_eq!(
        app.services.files.read_text(&app.ctx, &entry).await.unwrap(),
        "new"
    );
}

#[tokio::test]
async fn test_batch_names_differing_in_case_land_once() {
    let app = TestApp::new();
    let batch = vec![
        UploadFile::new("Notes.txt", Bytes::from_static(b"1")),
        UploadFile::new("notes.TXT", Bytes::from_static(b"2")),
    ];
    app.services
        .uploads
        .upload_files(&app.ctx, "", &batch, &progress())
        .await
        .unwrap();

    assert_eq!(app.file_doc_paths().await, vec!["uid/Notes.txt"]);
    assert_eq!(app.live_keys().await, vec!["uid/Notes.txt"]);
}

#[tokio::test]
async fn test_tree_merges_into_folder_differing_in_case() {
    let app = TestApp::new();
    app.mkdir("Site").await;
    app.seed_file("Site", "Index.html", b"old").await;

    let tree = vec![dir(
        "site",
        vec![file("index.html", 10), dir("css", vec![file("main.css", 10)])],
    )];
    let report = app
        .services
        .uploads
        .upload_tree(&app.ctx, "", &tree, &progress())
        .await
        .unwrap();

    assert_eq!(report.uploaded, 2);
    assert_eq!(report.folders_created, 1);
    assert_eq!(app.folder_doc_paths().await, vec!["uid/Site/", "uid/Site/css/"]);
    assert_eq!(
        app.file_doc_paths().await,
        vec!["uid/Site/Index.html", "uid/Site/css/main.css"]
    );
    assert!(!app.files.contains("uid/site/index.html").await);
    assert_eq!(app.list("").await.folders.len(), 1);
}

#[tokio::test]
async fn test_flat_upload_only_oversized_images() {
    let app = TestApp::new();
    let batch = vec![UploadFile::new("huge.jpg", Bytes::from(vec![0u8; 1_048_577]))];
    let err = app
        .services
        .uploads
        .upload_files(&app.ctx, "", &batch, &progress())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));
    assert_eq!(err.message, "1 image(s) skipped (> 1MB).");
}

#[tokio::test]
async fn test_configured_allow_list() {
    let mut config = AppConfig::default();
    config.upload.allowed_extensions = vec!["md".into()];
    let app = TestApp::with_config(config);

    let batch = vec![
        UploadFile::new("README.MD", Bytes::from_static(b"# r")),
        UploadFile::new("main.rs", Bytes::from_static(b"fn main() {}")),
    ];
    let report = app
        .services
        .uploads
        .upload_files(&app.ctx, "", &batch, &progress())
        .await
        .unwrap();
    assert_eq!(report.uploaded, 1);
    assert_eq!(report.admission.invalid_types, 1);
}
