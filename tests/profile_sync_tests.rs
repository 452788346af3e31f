// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile reconciliation against the in-memory remote.

use screenvault::db::profile_fields;
use screenvault::error::AppError;
use screenvault::models::{ProfileEdit, ProfilePhase, RemoteProfile};
use screenvault::session::Session;
use std::io::Write;
use std::time::Duration;

mod common;
use common::{test_profile, test_profile_with_session, TEST_USER_ID};

/// Write a fake JPEG to a temp file standing in for a picked photo.
fn local_photo(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(bytes).expect("Failed to write temp file");
    file
}

// ═══════════════════════════════════════════════════════════════════════════
// SAVE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_save_offline_keeps_local_then_retry_succeeds() {
    let h = test_profile();
    let rx = h.repo.observe().await.unwrap();
    h.remote.set_reachable(false);

    let optimistic = h
        .repo
        .save(ProfileEdit::new("Ava", "Film lover"))
        .await
        .unwrap();
    assert_eq!(optimistic.display_name, "Ava");

    let local = h.repo.current().await.unwrap();
    assert_eq!(local.display_name, "Ava");
    assert_eq!(local.bio, "Film lover");
    assert_eq!(local.photo_ref, None);

    let outcome = h.repo.wait_for_sync().await.expect("A push was pending");
    assert!(matches!(outcome, Err(AppError::RemoteUnavailable(_))));
    assert!(matches!(
        rx.borrow().last_error,
        Some(AppError::RemoteUnavailable(_))
    ));

    // Local write survives the failed push
    let local = h.repo.current().await.unwrap();
    assert_eq!(local.display_name, "Ava");
    assert_eq!(local.bio, "Film lover");

    h.remote.set_reachable(true);
    h.repo
        .save(ProfileEdit::new("Ava", "Film lover"))
        .await
        .unwrap();
    let confirmed = h
        .repo
        .wait_for_sync()
        .await
        .expect("A push was pending")
        .expect("Push should succeed once reachable");

    assert_eq!(confirmed.display_name, "Ava");
    assert_eq!(confirmed.bio, "Film lover");
    assert_eq!(h.repo.current().await.unwrap(), confirmed);

    let remote = h.remote.profile(TEST_USER_ID).unwrap();
    assert_eq!(remote.display_name.as_deref(), Some("Ava"));
    assert_eq!(remote.bio.as_deref(), Some("Film lover"));
    assert_eq!(h.remote.display_name(TEST_USER_ID).as_deref(), Some("Ava"));

    let state = rx.borrow();
    assert!(state.last_error.is_none());
    assert_eq!(state.phase, ProfilePhase::Idle);
}

#[tokio::test]
async fn test_save_with_photo_replaces_local_ref_with_uploaded_url() {
    let h = test_profile();
    let photo = local_photo(b"\xFF\xD8\xFFfake-jpeg");
    let photo_path = photo.path().to_string_lossy().to_string();

    h.repo
        .save(ProfileEdit::new("Ava", "Film lover").with_photo(photo_path.clone()))
        .await
        .unwrap();
    let confirmed = h
        .repo
        .wait_for_sync()
        .await
        .expect("A push was pending")
        .expect("Push should succeed");

    let local = h.repo.current().await.unwrap();
    let url = local.photo_ref.clone().expect("Photo should be set");
    assert_ne!(url, photo_path);
    assert!(url.starts_with("https://"));
    assert_eq!(confirmed.photo_ref.as_deref(), Some(url.as_str()));

    assert_eq!(h.remote.photo(&url), Some(b"\xFF\xD8\xFFfake-jpeg".to_vec()));
    let remote = h.remote.profile(TEST_USER_ID).unwrap();
    assert_eq!(remote.photo_url.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn test_save_without_photo_keeps_server_photo_locally() {
    let h = test_profile();
    let photo = local_photo(b"jpeg");
    let photo_path = photo.path().to_string_lossy().to_string();

    h.repo
        .save(ProfileEdit::new("Ava", "a").with_photo(photo_path))
        .await
        .unwrap();
    let first = h.repo.wait_for_sync().await.unwrap().unwrap();
    let uploaded = first.photo_ref.expect("Photo should be uploaded");

    h.repo.save(ProfileEdit::new("Ava", "b")).await.unwrap();
    let confirmed = h.repo.wait_for_sync().await.unwrap().unwrap();

    let remote = h.remote.profile(TEST_USER_ID).unwrap();
    assert_eq!(remote.photo_url.as_deref(), Some(uploaded.as_str()));
    assert_eq!(confirmed.photo_ref, remote.photo_url);
    assert_eq!(h.repo.current().await.unwrap().photo_ref, remote.photo_url);

    // A later session start sees the same photo
    let synced = h.repo.sync_from_remote().await.unwrap();
    assert_eq!(synced.photo_ref, remote.photo_url);
    assert_eq!(synced.bio, "b");
}

#[tokio::test]
async fn test_upload_failure_writes_document_without_photo() {
    let h = test_profile();
    let rx = h.repo.observe().await.unwrap();
    h.remote.set_uploads_failing(true);

    let photo = local_photo(b"jpeg");
    let photo_path = photo.path().to_string_lossy().to_string();

    h.repo
        .save(ProfileEdit::new("Ava", "Film lover").with_photo(photo_path.clone()))
        .await
        .unwrap();
    let outcome = h.repo.wait_for_sync().await.expect("A push was pending");
    assert!(matches!(outcome, Err(AppError::UploadFailed(_))));

    let remote = h.remote.profile(TEST_USER_ID).unwrap();
    assert_eq!(remote.bio.as_deref(), Some("Film lover"));
    assert_eq!(remote.photo_url, None);
    assert_eq!(h.remote.document_writes(), 1);

    let local = h.repo.current().await.unwrap();
    assert_eq!(local.photo_ref.as_deref(), Some(photo_path.as_str()));
    assert!(matches!(
        rx.borrow().last_error,
        Some(AppError::UploadFailed(_))
    ));
}

#[tokio::test]
async fn test_unreadable_photo_reports_upload_failure() {
    let h = test_profile();

    h.repo
        .save(ProfileEdit::new("Ava", "").with_photo("/nonexistent/screenvault/photo.jpg"))
        .await
        .unwrap();

    let outcome = h.repo.wait_for_sync().await.expect("A push was pending");
    assert!(matches!(outcome, Err(AppError::UploadFailed(_))));
    assert_eq!(
        h.remote.profile(TEST_USER_ID).unwrap().display_name.as_deref(),
        Some("Ava")
    );
}

#[tokio::test]
async fn test_optimistic_value_visible_while_push_in_flight() {
    let h = test_profile();
    let rx = h.repo.observe().await.unwrap();
    h.remote.set_latency(Some(Duration::from_millis(200)));

    h.repo
        .save(ProfileEdit::new("Ava", "Watching"))
        .await
        .unwrap();

    {
        let state = rx.borrow();
        assert_eq!(state.phase, ProfilePhase::Saving);
        assert_eq!(state.profile.as_ref().unwrap().bio, "Watching");
    }
    assert_eq!(h.repo.current().await.unwrap().bio, "Watching");
    assert_eq!(h.repo.pending_syncs().await, 1);
    assert!(h.remote.profile(TEST_USER_ID).is_none());

    h.repo.wait_for_sync().await.unwrap().unwrap();
    assert_eq!(h.repo.pending_syncs().await, 0);
    assert_eq!(rx.borrow().phase, ProfilePhase::Idle);
    assert!(h.repo.wait_for_sync().await.is_none());
}

#[tokio::test]
async fn test_two_saves_last_write_wins() {
    let h = test_profile();

    h.repo.save(ProfileEdit::new("Ava", "first")).await.unwrap();
    h.repo.save(ProfileEdit::new("Ava", "second")).await.unwrap();

    let last = h.repo.wait_for_sync().await.unwrap().unwrap();
    assert_eq!(last.bio, "second");
    assert_eq!(h.remote.document_writes(), 2);
    assert_eq!(
        h.remote.profile(TEST_USER_ID).unwrap().bio.as_deref(),
        Some("second")
    );
}

#[tokio::test]
async fn test_push_completes_after_observer_dropped() {
    let h = test_profile();
    let rx = h.repo.observe().await.unwrap();
    h.remote.set_latency(Some(Duration::from_millis(50)));

    h.repo.save(ProfileEdit::new("Ava", "bio")).await.unwrap();
    drop(rx);

    h.repo.wait_for_sync().await.unwrap().unwrap();
    assert_eq!(
        h.store
            .get_profile_field(TEST_USER_ID, profile_fields::BIO)
            .await
            .unwrap()
            .as_deref(),
        Some("bio")
    );
}

#[tokio::test]
async fn test_bio_over_limit_rejected() {
    let h = test_profile();
    let long_bio = "x".repeat(301);

    let result = h.repo.save(ProfileEdit::new("Ava", long_bio)).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(h.store.get_profile_fields(TEST_USER_ID).await.unwrap().is_empty());
    assert_eq!(h.repo.pending_syncs().await, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// SESSION START / SYNC FROM REMOTE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_session_start_replaces_stale_cache_with_remote() {
    let h = test_profile();
    h.store
        .put_profile_fields(
            TEST_USER_ID,
            vec![
                (profile_fields::DISPLAY_NAME, Some("Ava".to_string())),
                (profile_fields::BIO, Some("stale bio".to_string())),
            ],
        )
        .await
        .unwrap();
    h.remote.insert_profile(
        TEST_USER_ID,
        RemoteProfile {
            display_name: Some("Ava".to_string()),
            bio: Some("fresh bio".to_string()),
            photo_url: Some("https://cdn.example.com/ava.jpg".to_string()),
        },
    );

    let mut rx = h.repo.observe().await.unwrap();
    assert_eq!(rx.borrow_and_update().profile.as_ref().unwrap().bio, "stale bio");

    h.repo.start_session().await.unwrap();

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update();
    let profile = state.profile.as_ref().unwrap();
    assert_eq!(profile.bio, "fresh bio");
    assert_eq!(
        profile.photo_ref.as_deref(),
        Some("https://cdn.example.com/ava.jpg")
    );
    assert_eq!(state.phase, ProfilePhase::Idle);

    let local = h.repo.current().await.unwrap();
    assert_eq!(local.bio, "fresh bio");
}

#[tokio::test]
async fn test_first_observation_uses_identity_defaults() {
    let h = test_profile();

    let rx = h.repo.observe().await.unwrap();

    let state = rx.borrow();
    let profile = state.profile.as_ref().unwrap();
    assert_eq!(profile.user_id, TEST_USER_ID);
    assert_eq!(profile.display_name, "Ava from Auth");
    assert_eq!(profile.bio, "");
    assert_eq!(profile.photo_ref, None);
    assert_eq!(profile.email.as_deref(), Some("ava@example.com"));
}

#[tokio::test]
async fn test_sync_without_remote_document_keeps_local() {
    let h = test_profile();
    h.store
        .put_profile_fields(
            TEST_USER_ID,
            vec![(profile_fields::BIO, Some("local only".to_string()))],
        )
        .await
        .unwrap();

    let record = h.repo.sync_from_remote().await.unwrap();

    assert_eq!(record.bio, "local only");
    assert_eq!(record.display_name, "Ava from Auth");
    assert!(h.remote.profile(TEST_USER_ID).is_none());
}

#[tokio::test]
async fn test_sync_failure_keeps_cache_and_records_error() {
    let h = test_profile();
    h.store
        .put_profile_fields(
            TEST_USER_ID,
            vec![(profile_fields::BIO, Some("cached".to_string()))],
        )
        .await
        .unwrap();
    h.remote.set_reachable(false);

    let rx = h.repo.observe().await.unwrap();
    let result = h.repo.start_session().await;

    assert!(matches!(result, Err(AppError::RemoteUnavailable(_))));
    {
        let state = rx.borrow();
        assert_eq!(state.profile.as_ref().unwrap().bio, "cached");
        assert!(state.last_error.as_ref().is_some_and(|e| e.is_remote()));
        assert_eq!(state.phase, ProfilePhase::Idle);
    }

    h.repo.clear_error();
    assert!(rx.borrow().last_error.is_none());

    // A failed start is retried by the next call
    h.remote.set_reachable(true);
    h.remote.insert_profile(
        TEST_USER_ID,
        RemoteProfile {
            bio: Some("remote".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(h.repo.start_session().await.unwrap().bio, "remote");
}

#[tokio::test]
async fn test_start_session_runs_once_per_user() {
    let h = test_profile();
    h.repo.start_session().await.unwrap();

    h.remote.set_reachable(false);
    h.remote.insert_profile(
        TEST_USER_ID,
        RemoteProfile {
            bio: Some("changed remotely".to_string()),
            ..Default::default()
        },
    );

    let record = h.repo.start_session().await.unwrap();
    assert_eq!(record.bio, "");
}

// ═══════════════════════════════════════════════════════════════════════════
// AUTHENTICATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_signed_out_profile_operations_do_no_work() {
    let h = test_profile_with_session(Session::new());

    assert!(matches!(
        h.repo.observe().await,
        Err(AppError::NotAuthenticated)
    ));
    assert!(matches!(
        h.repo.start_session().await,
        Err(AppError::NotAuthenticated)
    ));
    assert!(matches!(
        h.repo.save(ProfileEdit::new("Ava", "Film lover")).await,
        Err(AppError::NotAuthenticated)
    ));

    assert!(h.repo.wait_for_sync().await.is_none());
    assert_eq!(h.remote.document_writes(), 0);
    assert!(h.remote.display_name(TEST_USER_ID).is_none());
    assert!(h.store.get_profile_fields(TEST_USER_ID).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_during_sync_is_not_overwritten() {
    let h = test_profile();
    h.remote.insert_profile(
        TEST_USER_ID,
        RemoteProfile {
            display_name: Some("Ava".to_string()),
            bio: Some("old".to_string()),
            photo_url: Some("https://cdn.example.com/old.jpg".to_string()),
        },
    );
    h.remote.set_latency(Some(Duration::from_millis(200)));
    h.remote.set_uploads_failing(true);

    let photo = local_photo(b"jpeg");
    let photo_path = photo.path().to_string_lossy().to_string();

    let (synced, saved) = tokio::join!(h.repo.sync_from_remote(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.repo
            .save(ProfileEdit::new("Ava", "mine").with_photo(photo_path.clone()))
            .await
    });
    synced.unwrap();
    saved.unwrap();

    let outcome = h.repo.wait_for_sync().await.expect("A push was pending");
    assert!(matches!(outcome, Err(AppError::UploadFailed(_))));

    let local = h.repo.current().await.unwrap();
    assert_eq!(local.bio, "mine");
    assert_eq!(local.photo_ref.as_deref(), Some(photo_path.as_str()));
}
