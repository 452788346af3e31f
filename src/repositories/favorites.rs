// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorites repository: local-only CRUD scoped to the signed-in user.

use crate::db::LocalStore;
use crate::error::Result;
use crate::models::FavoriteMovie;
use crate::session::Session;
use validator::Validate;

/// Favorites list of the signed-in user.
///
/// Every operation is a single store transaction, so concurrent callers
/// need no extra locking.
#[derive(Clone)]
pub struct FavoritesRepository {
    session: Session,
    store: LocalStore,
}

impl FavoritesRepository {
    pub fn new(session: Session, store: LocalStore) -> Self {
        Self { session, store }
    }

    fn user_id(&self) -> Result<String> {
        Ok(self.session.require_identity()?.user_id)
    }

    /// All favorites, in insertion order.
    pub async fn list_favorites(&self) -> Result<Vec<FavoriteMovie>> {
        let user_id = self.user_id()?;
        self.store.list_favorites(&user_id).await
    }

    pub async fn is_favorite(&self, movie_id: i64) -> Result<bool> {
        let user_id = self.user_id()?;
        self.store.favorite_exists(&user_id, movie_id).await
    }

    /// Add or replace a favorite.
    pub async fn add(&self, movie: &FavoriteMovie) -> Result<FavoriteMovie> {
        let user_id = self.user_id()?;
        movie.validate()?;

        let stored = self.store.upsert_favorite(&user_id, movie).await?;
        tracing::info!(user_id = %user_id, movie_id = movie.id, "Favorite saved");
        Ok(stored)
    }

    /// Remove a favorite. Absent IDs are a no-op.
    pub async fn remove(&self, movie_id: i64) -> Result<()> {
        let user_id = self.user_id()?;
        if self.store.delete_favorite(&user_id, movie_id).await? {
            tracing::info!(user_id = %user_id, movie_id, "Favorite removed");
        } else {
            tracing::debug!(user_id = %user_id, movie_id, "Favorite not present, nothing to remove");
        }
        Ok(())
    }

    /// Remove every favorite. Returns how many were removed.
    pub async fn clear_all(&self) -> Result<usize> {
        let user_id = self.user_id()?;
        let count = self.store.delete_all_favorites(&user_id).await?;
        tracing::info!(user_id = %user_id, count, "Favorites cleared");
        Ok(count)
    }

    /// Flip the favorite state of a movie. Returns the new state.
    pub async fn toggle(&self, movie: &FavoriteMovie) -> Result<bool> {
        let user_id = self.user_id()?;
        movie.validate()?;
        let now_favorite = self.store.toggle_favorite(&user_id, movie).await?;
        tracing::info!(
            user_id = %user_id,
            movie_id = movie.id,
            favorite = now_favorite,
            "Favorite toggled"
        );
        Ok(now_favorite)
    }

    pub async fn count(&self) -> Result<usize> {
        let user_id = self.user_id()?;
        self.store.count_favorites(&user_id).await
    }
}
