// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use screenvault::db::{FirestoreDb, LocalStore};
use screenvault::models::FavoriteMovie;
use screenvault::repositories::{FavoritesRepository, ProfileRepository};
use screenvault::services::InMemoryProfileService;
use screenvault::session::{Identity, Session};
use std::sync::Arc;

#[allow(dead_code)]
pub const TEST_USER_ID: &str = "user-ava";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Fresh in-memory local store.
#[allow(dead_code)]
pub fn test_store() -> LocalStore {
    LocalStore::open_in_memory().expect("Failed to open in-memory store")
}

/// Identity used by most tests.
#[allow(dead_code)]
pub fn test_identity() -> Identity {
    Identity::new(TEST_USER_ID)
        .with_email("ava@example.com")
        .with_display_name("Ava from Auth")
}

/// Session signed in as the test identity.
#[allow(dead_code)]
pub fn signed_in_session() -> Session {
    Session::signed_in(test_identity())
}

/// Favorites repository over a fresh store, signed in.
#[allow(dead_code)]
pub fn test_favorites() -> (FavoritesRepository, LocalStore) {
    let store = test_store();
    let repo = FavoritesRepository::new(signed_in_session(), store.clone());
    (repo, store)
}

/// Profile repository wired to an in-memory remote.
#[allow(dead_code)]
pub struct ProfileHarness {
    pub repo: ProfileRepository,
    pub store: LocalStore,
    pub remote: InMemoryProfileService,
    pub session: Session,
}

#[allow(dead_code)]
pub fn test_profile() -> ProfileHarness {
    test_profile_with_session(signed_in_session())
}

#[allow(dead_code)]
pub fn test_profile_with_session(session: Session) -> ProfileHarness {
    let store = test_store();
    let remote = InMemoryProfileService::new();
    let repo = ProfileRepository::new(session.clone(), store.clone(), Arc::new(remote.clone()));
    ProfileHarness {
        repo,
        store,
        remote,
        session,
    }
}

/// Favorite with every field filled in.
#[allow(dead_code)]
pub fn movie(id: i64, title: &str) -> FavoriteMovie {
    FavoriteMovie {
        id,
        title: title.to_string(),
        release_year: 1999,
        genre: "Drama".to_string(),
        rating: 7.5,
        duration_minutes: 120,
        poster_path: Some(format!("/poster-{}.jpg", id)),
        added_at: None,
    }
}
