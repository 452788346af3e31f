// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screenvault: data core of a movie-browsing client
//!
//! This crate keeps a local favorites cache and a per-user profile that is
//! cached locally and reconciled with a Firebase backend, and fetches
//! catalog data from TMDB.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::{FirestoreDb, LocalStore};
use error::Result;
use repositories::{FavoritesRepository, ProfileRepository};
use services::{
    CloudProfileService, IdentityToolkitClient, InMemoryProfileService, RemoteProfileService,
    StorageClient, TmdbClient,
};
use session::Session;
use std::sync::Arc;

/// Shared application context.
pub struct AppContext {
    pub config: Config,
    pub store: LocalStore,
    pub session: Session,
    pub favorites: FavoritesRepository,
    pub profile: ProfileRepository,
    pub catalog: TmdbClient,
}

impl AppContext {
    /// Wire the repositories around an already opened store and remote.
    pub fn new(
        config: Config,
        store: LocalStore,
        session: Session,
        remote: Arc<dyn RemoteProfileService>,
    ) -> Self {
        let favorites = FavoritesRepository::new(session.clone(), store.clone());
        let profile = ProfileRepository::new(session.clone(), store.clone(), remote);
        let catalog = TmdbClient::new(&config.tmdb_api_key, &config.tmdb_base_url);
        Self {
            config,
            store,
            session,
            favorites,
            profile,
            catalog,
        }
    }

    /// Open the local store and connect the remote backend named by `config`.
    ///
    /// Offline mode uses an in-memory remote.
    pub async fn connect(config: Config, session: Session) -> Result<Self> {
        let store = LocalStore::open(&config.db_path)?;

        let remote: Arc<dyn RemoteProfileService> = if config.offline {
            tracing::info!("Offline mode, using in-memory profile service");
            Arc::new(InMemoryProfileService::new())
        } else {
            let db = FirestoreDb::new(&config.firebase_project_id).await?;
            Arc::new(CloudProfileService::new(
                db,
                StorageClient::new(&config.storage_bucket),
                IdentityToolkitClient::new(&config.firebase_api_key),
                session.clone(),
            ))
        };

        Ok(Self::new(config, store, session, remote))
    }
}
