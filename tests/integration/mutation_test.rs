//! Integration tests for folder and file mutations.

mod helpers;

use cloudfm_core::error::{BatchCounts, ErrorKind};
use cloudfm_core::traits::MetadataStore;
use cloudfm_core::types::ProgressReporter;
use cloudfm_entity::{FileDoc, MetadataDocument};
use cloudfm_service::Preview;
use cloudfm_storage::FaultOp;

use helpers::{TestApp, progress};

/// `projects` with a nested folder and an orphan blob, plus two siblings
/// whose names share its prefix.
async fn seed_projects(app: &TestApp) {
    app.mkdir("projects").await;
    app.mkdir("projects/sub").await;
    app.seed_file("projects", "a.txt", b"a").await;
    app.seed_file("projects/sub", "b.txt", b"b").await;
    app.put_blob("uid/projects/sub/c.txt", b"c").await;
    app.mkdir("projects2").await;
    app.seed_file("projects2", "x.txt", b"x").await;
    app.seed_file("projects-archive", "y.txt", b"y").await;
}

fn sorted(keys: &[&str]) -> Vec<String> {
    let mut keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_create_folder_rejects_case_insensitive_duplicate() {
    let app = TestApp::new();
    app.mkdir("Photos").await;
    let err = app
        .services
        .folders
        .create_folder(&app.ctx, "", "photos")
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));
    assert_eq!(app.folder_doc_paths().await, vec!["uid/Photos/"]);
}

#[tokio::test]
async fn test_create_folder_stops_when_placeholder_fails() {
    let app = TestApp::new();
    app.files.faults().fail_on(FaultOp::Upload, "uid/x");
    let err = app
        .services
        .folders
        .create_folder(&app.ctx, "", "x")
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Storage));
    assert!(app.folder_doc_paths().await.is_empty());
}

#[tokio::test]
async fn test_rename_folder_rewrites_only_descendants() {
    let app = TestApp::new();
    seed_projects(&app).await;
    let folder = app.folder("projects").await;

    let (reporter, rx) = ProgressReporter::channel();
    let report = app
        .services
        .folders
        .rename_folder(&app.ctx, &folder, "work", &reporter)
        .await
        .unwrap();

    assert_eq!(report.failed, 0);
    assert_eq!(report.total, 6);
    assert_eq!(
        *rx.borrow(),
        cloudfm_core::types::Progress {
            completed: 6,
            total: 6
        }
    );
    assert_eq!(
        app.live_keys().await,
        sorted(&[
            "uid/projects-archive/y.txt",
            "uid/projects2/.placeholder",
            "uid/projects2/x.txt",
            "uid/work/.placeholder",
            "uid/work/a.txt",
            "uid/work/sub/.placeholder",
            "uid/work/sub/b.txt",
            "uid/work/sub/c.txt",
        ])
    );
    assert_eq!(
        app.file_doc_paths().await,
        sorted(&[
            "uid/projects-archive/y.txt",
            "uid/projects2/x.txt",
            "uid/work/a.txt",
            "uid/work/sub/b.txt",
        ])
    );
    assert_eq!(
        app.folder_doc_paths().await,
        sorted(&["uid/projects2/", "uid/work/", "uid/work/sub/"])
    );
    let listing = app.list("work/sub").await;
    assert_eq!(listing.files.len(), 2);
}

#[tokio::test]
async fn test_rename_folder_progress_counts_root_once() {
    let app = TestApp::new();
    app.mkdir("p").await;
    app.seed_file("p", "a.txt", b"a").await;
    app.seed_file("p", "b.txt", b"b").await;
    let folder = app.folder("p").await;

    let (reporter, rx) = ProgressReporter::channel();
    let report = app
        .services
        .folders
        .rename_folder(&app.ctx, &folder, "q", &reporter)
        .await
        .unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(
        *rx.borrow(),
        cloudfm_core::types::Progress {
            completed: 4,
            total: 4
        }
    );
    assert_eq!(report.message(), "Folder \"p\" renamed to \"q\".");
}

#[tokio::test]
async fn test_delete_folder_respects_range_bound() {
    let app = TestApp::new();
    seed_projects(&app).await;
    let folder = app.folder("projects").await;

    let report = app
        .services
        .folders
        .delete_folder(&app.ctx, &folder, &progress())
        .await
        .unwrap();

    assert_eq!(report.total, 5);
    assert_eq!(report.failed, 0);
    assert_eq!(
        app.recycled_keys().await,
        sorted(&[
            "uid/projects/a.txt",
            "uid/projects/sub/b.txt",
            "uid/projects/sub/c.txt",
        ])
    );
    assert_eq!(
        app.live_keys().await,
        sorted(&[
            "uid/projects-archive/y.txt",
            "uid/projects2/.placeholder",
            "uid/projects2/x.txt",
        ])
    );
    assert_eq!(
        app.file_doc_paths().await,
        sorted(&["uid/projects-archive/y.txt", "uid/projects2/x.txt"])
    );
    assert_eq!(app.folder_doc_paths().await, vec!["uid/projects2/"]);
}

#[tokio::test]
async fn test_delete_folder_continues_past_backup_failure() {
    let app = TestApp::new();
    app.mkdir("p").await;
    app.seed_file("p", "a.txt", b"a").await;
    app.seed_file("p", "b.txt", b"b").await;
    app.recycle.faults().fail_on(FaultOp::Upload, "uid/p/b.txt");
    let folder = app.folder("p").await;

    let report = app
        .services
        .folders
        .delete_folder(&app.ctx, &folder, &progress())
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.message(), "Folder \"p\" deleted. (3 of 4 completed, 1 failed)");
    assert!(app.live_keys().await.is_empty());
    assert_eq!(app.recycled_keys().await, vec!["uid/p/a.txt"]);
}

#[tokio::test]
async fn test_rename_protection_for_public_files() {
    let app = TestApp::new();
    app.mkdir("shared").await;
    let file = app.seed_file("shared", "deck.pdf", b"%PDF").await;
    app.services.shares.toggle_star(&app.ctx, &file).await.unwrap();
    let before = app.live_keys().await;

    let folder = app.folder("shared").await;
    let err = app
        .services
        .folders
        .rename_folder(&app.ctx, &folder, "moved", &progress())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Forbidden));
    assert_eq!(
        err.message,
        "Cannot rename folder: contains a public file (deck.pdf). Make it private first."
    );

    let file = app.file("shared/deck.pdf").await;
    let err = app
        .services
        .files
        .rename_file(&app.ctx, &file, "slides.pdf", &progress())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Forbidden));
    assert_eq!(err.message, "Cannot rename a public file. Make it private first.");
    assert_eq!(app.live_keys().await, before);

    app.services.shares.toggle_star(&app.ctx, &file).await.unwrap();
    app.services
        .files
        .rename_file(&app.ctx, &file, "slides.pdf", &progress())
        .await
        .unwrap();
    assert_eq!(app.file_doc_paths().await, vec!["uid/shared/slides.pdf"]);
}

#[tokio::test]
async fn test_rename_folder_partial_failure_keeps_old_docs() {
    let app = TestApp::new();
    app.mkdir("p").await;
    app.seed_file("p", "a.txt", b"a").await;
    app.seed_file("p", "b.txt", b"b").await;
    app.files.faults().fail_on(FaultOp::Move, "uid/p/b.txt");
    let folder = app.folder("p").await;

    let err = app
        .services
        .folders
        .rename_folder(&app.ctx, &folder, "q", &progress())
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::PartialFailure));
    assert_eq!(
        err.counts,
        Some(BatchCounts {
            completed: 2,
            failed: 1,
            total: 3
        })
    );
    assert_eq!(
        app.file_doc_paths().await,
        sorted(&["uid/p/b.txt", "uid/q/a.txt"])
    );
    assert!(app.files.contains("uid/p/b.txt").await);
    assert!(app.files.contains("uid/q/a.txt").await);
    assert_eq!(app.folder_doc_paths().await, vec!["uid/q/"]);
}

#[tokio::test]
async fn test_move_folder_into_itself_is_rejected() {
    let app = TestApp::new();
    app.mkdir("a").await;
    app.mkdir("a/b").await;
    let folder = app.folder("a").await;
    let err = app
        .services
        .folders
        .move_folder(&app.ctx, &folder, "a/b", &progress())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));
}

#[tokio::test]
async fn test_move_folder_under_new_parent() {
    let app = TestApp::new();
    app.mkdir("src").await;
    app.mkdir("dest").await;
    app.seed_file("src", "f.txt", b"f").await;
    let folder = app.folder("src").await;

    app.services
        .folders
        .move_folder(&app.ctx, &folder, "dest", &progress())
        .await
        .unwrap();

    assert_eq!(app.file_doc_paths().await, vec!["uid/dest/src/f.txt"]);
    assert_eq!(
        app.folder_doc_paths().await,
        sorted(&["uid/dest/", "uid/dest/src/"])
    );
    assert_eq!(app.list("dest").await.folders[0].name(), "src");
}

#[tokio::test]
async fn test_overlapping_operation_fails_fast() {
    let app = TestApp::new();
    app.mkdir("p").await;
    app.mkdir("p/sub").await;
    let folder = app.folder("p").await;

    let held = app.services.locks.acquire(&["uid/p/sub"]).unwrap();
    let err = app
        .services
        .folders
        .delete_folder(&app.ctx, &folder, &progress())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));
    assert!(app.recycled_keys().await.is_empty());

    drop(held);
    assert_eq!(app.services.locks.held_count(), 0);
    app.services
        .folders
        .delete_folder(&app.ctx, &folder, &progress())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rename_file_moves_doc_and_refreshes_created_at() {
    let app = TestApp::new();
    let file = app.seed_file("", "notes.txt", b"n").await;
    app.seed_file("", "other.txt", b"o").await;
    app.clock.advance(chrono::Duration::minutes(5));

    let err = app
        .services
        .files
        .rename_file(&app.ctx, &file, "OTHER.TXT", &progress())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));

    let (reporter, rx) = ProgressReporter::channel();
    app.services
        .files
        .rename_file(&app.ctx, &file, "ideas.txt", &reporter)
        .await
        .unwrap();
    assert_eq!(*rx.borrow(), cloudfm_core::types::Progress { completed: 1, total: 1 });

    let renamed = app
        .metadata
        .get(FileDoc::COLLECTION, &FileDoc::new("uid", "", "ideas.txt", 0, false).doc_id())
        .await
        .unwrap()
        .map(FileDoc::from_document)
        .unwrap()
        .unwrap();
    assert!(renamed.created_at > file.base.created_at);
    assert!(!app.files.contains("uid/notes.txt").await);
    assert_eq!(
        app.file_doc_paths().await,
        sorted(&["uid/ideas.txt", "uid/other.txt"])
    );
}

#[tokio::test]
async fn test_rename_file_without_doc_synthesizes_one() {
    let app = TestApp::new();
    app.put_blob("uid/orphan.md", b"o").await;
    let file = app.file("orphan.md").await;
    app.metadata.faults().fail_on(FaultOp::Set, "files/uid/orphan.md");
    app.services.flush_heals().await;
    app.metadata.faults().clear();

    app.services
        .files
        .move_file(&app.ctx, &file, "kept", &progress())
        .await
        .unwrap();
    assert_eq!(app.file_doc_paths().await, vec!["uid/kept/orphan.md"]);
}

#[tokio::test]
async fn test_delete_file_backs_up_and_revokes_share() {
    let app = TestApp::new();
    let file = app.seed_file("", "photo.png", b"png").await;
    app.services.shares.toggle_star(&app.ctx, &file).await.unwrap();

    let report = app
        .services
        .files
        .delete_file(&app.ctx, &file, &progress())
        .await
        .unwrap();

    assert_eq!(report.message(), "File \"photo.png\" deleted.");
    assert_eq!(app.recycled_keys().await, vec!["uid/photo.png"]);
    assert!(app.live_keys().await.is_empty());
    assert!(app.file_doc_paths().await.is_empty());
    assert!(app.services.shares.list_active(&app.ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_notes_pick_free_names() {
    let app = TestApp::new();
    let first = app
        .services
        .files
        .create_note(&app.ctx, "", "  ", "one")
        .await
        .unwrap();
    let second = app
        .services
        .files
        .create_note(&app.ctx, "", "", "two")
        .await
        .unwrap();
    assert_eq!(first.name(), "file1");
    assert_eq!(second.name(), "file2");

    let err = app
        .services
        .files
        .create_note(&app.ctx, "", "FILE1", "dup")
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));
    assert_eq!(
        app.services.files.read_text(&app.ctx, &second).await.unwrap(),
        "two"
    );
}

#[tokio::test]
async fn test_preview_by_type() {
    let app = TestApp::new();
    let text = app.seed_file("", "readme.md", b"# hi").await;
    let image = app.seed_file("", "logo.PNG", b"png").await;
    let doc = app.seed_file("", "cv.docx", b"doc").await;
    let files = &app.services.files;

    assert_eq!(
        files.preview(&app.ctx, &text).await.unwrap(),
        Preview::Text("# hi".into())
    );
    assert_eq!(
        files.preview(&app.ctx, &image).await.unwrap(),
        Preview::Url("memory://files/uid/logo.PNG".into())
    );
    assert_eq!(
        files.preview(&app.ctx, &doc).await.unwrap(),
        Preview::Unsupported
    );
}

#[tokio::test]
async fn test_collect_files_for_download() {
    let app = TestApp::new();
    app.mkdir("trip").await;
    app.seed_file("trip", "a.txt", b"a").await;
    app.seed_file("trip/day1", "b.txt", b"b").await;
    let folder = app.folder("trip").await;

    let mut collected = app
        .services
        .folders
        .collect_files(&app.ctx, &folder, &progress())
        .await
        .unwrap();
    collected.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    let paths: Vec<&str> = collected.iter().map(|c| c.relative_path.as_str()).collect();
    assert_eq!(paths, vec!["trip/a.txt", "trip/day1/b.txt"]);
    assert_eq!(&collected[1].data[..], b"b");
}

#[tokio::test]
async fn test_operations_outside_owner_are_forbidden() {
    let app = TestApp::new();
    let foreign = FileDoc::new("someone", "", "x.txt", 0, false);
    let entry = cloudfm_entity::FileEntry::from_doc(&foreign);
    let err = app
        .services
        .files
        .delete_file(&app.ctx, &entry, &progress())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Forbidden));
}
