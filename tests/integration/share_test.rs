//! Integration tests for public shares and their expiry.

mod helpers;

use chrono::Duration;

use cloudfm_core::error::ErrorKind;
use cloudfm_core::types::Clock;
use cloudfm_entity::{FileDoc, FileEntry, StarState};
use cloudfm_service::SessionContext;

use helpers::TestApp;

#[tokio::test]
async fn test_star_toggle_round_trip() {
    let app = TestApp::new();
    let file = app.seed_file("docs", "cv.pdf", b"%PDF").await;
    let now = app.clock.now_millis();

    let state = app.services.shares.toggle_star(&app.ctx, &file).await.unwrap();
    assert_eq!(
        state,
        StarState::Starred {
            expires_at: now + Duration::hours(24).num_milliseconds()
        }
    );
    assert!(app.files.contains("public/uid/docs/cv.pdf").await);
    let active = app.services.shares.list_active(&app.ctx).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].path, "public/uid/docs/cv.pdf");
    assert_eq!(active[0].usr, "uid");

    let state = app.services.shares.toggle_star(&app.ctx, &file).await.unwrap();
    assert_eq!(state, StarState::Unstarred);
    assert!(!app.files.contains("public/uid/docs/cv.pdf").await);
    assert!(app.services.shares.list_active(&app.ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_share_is_absent_on_read_and_restars() {
    let app = TestApp::new();
    let file = app.seed_file("", "photo.png", b"png").await;
    app.services.shares.toggle_star(&app.ctx, &file).await.unwrap();

    app.clock.advance(Duration::hours(24));
    let shares = &app.services.shares;
    assert!(shares.list_active(&app.ctx).await.unwrap().is_empty());
    assert!(!shares.is_starred(&app.ctx, file.full_path()).await.unwrap());
    assert!(!app.list("").await.files[0].starred);
    assert!(shares.list_public().await.unwrap().is_empty());

    let renewed_at = app.clock.now_millis();
    let state = shares.toggle_star(&app.ctx, &file).await.unwrap();
    assert!(matches!(state, StarState::Starred { expires_at } if expires_at > renewed_at));
    assert!(shares.is_starred(&app.ctx, file.full_path()).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_timer_removes_expired_share() {
    let app = TestApp::new();
    let file = app.seed_file("", "a.txt", b"a").await;
    app.services.shares.toggle_star(&app.ctx, &file).await.unwrap();
    assert_eq!(app.services.shares.pending_timers(), 1);

    app.clock.advance(Duration::hours(25));
    app.services.shares.flush_timers().await;

    assert_eq!(app.services.shares.pending_timers(), 0);
    assert!(!app.files.contains("public/uid/a.txt").await);
    assert!(app.services.shares.list_public().await.unwrap().is_empty());
    assert_eq!(app.services.shares.purge_expired().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_timer_leaves_renewed_share() {
    let app = TestApp::new();
    let file = app.seed_file("", "a.txt", b"a").await;
    let shares = &app.services.shares;
    shares.toggle_star(&app.ctx, &file).await.unwrap();
    shares.toggle_star(&app.ctx, &file).await.unwrap();
    app.clock.advance(Duration::hours(1));
    shares.toggle_star(&app.ctx, &file).await.unwrap();

    app.clock.advance(Duration::minutes(24 * 60 - 30));
    shares.flush_timers().await;

    assert!(shares.is_starred(&app.ctx, file.full_path()).await.unwrap());
    assert!(app.files.contains("public/uid/a.txt").await);
}

#[tokio::test]
async fn test_purge_sweep_and_public_listing_across_owners() {
    let app = TestApp::new();
    let mine = app.seed_file("", "old.txt", b"o").await;
    app.services.shares.toggle_star(&app.ctx, &mine).await.unwrap();

    app.clock.advance(Duration::hours(23));
    let other_ctx = SessionContext::new("other");
    let theirs = FileDoc::new("other", "", "new.txt", app.clock.now_millis(), false);
    app.put_blob(&theirs.full_path, b"n").await;
    app.services
        .shares
        .toggle_star(&other_ctx, &FileEntry::from_doc(&theirs))
        .await
        .unwrap();

    let public = app.services.shares.list_public().await.unwrap();
    let names: Vec<&str> = public.iter().map(|p| p.share.name.as_str()).collect();
    assert_eq!(names, vec!["new.txt", "old.txt"]);
    assert_eq!(public[0].url, "memory://files/public/other/new.txt");

    app.clock.advance(Duration::hours(2));
    assert_eq!(app.services.shares.purge_expired().await.unwrap(), 1);
    assert!(!app.files.contains("public/uid/old.txt").await);
    assert!(app.files.contains("public/other/new.txt").await);
    assert_eq!(
        app.services.shares.list_active(&other_ctx).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_cannot_star_another_owners_file() {
    let app = TestApp::new();
    let foreign = FileEntry::from_doc(&FileDoc::new("other", "", "x.txt", 0, false));
    let err = app
        .services
        .shares
        .toggle_star(&app.ctx, &foreign)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Forbidden));
}

#[tokio::test]
async fn test_star_missing_file_is_storage_error() {
    let app = TestApp::new();
    let ghost = FileEntry::from_doc(&FileDoc::new("uid", "", "ghost.txt", 0, false));
    let err = app
        .services
        .shares
        .toggle_star(&app.ctx, &ghost)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Storage));
    assert!(app.services.shares.list_active(&app.ctx).await.unwrap().is_empty());
}
