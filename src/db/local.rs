// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Embedded SQLite store for favorites and cached profile fields.
//!
//! Provides:
//! - Favorites keyed by (user_id, movie id), replace-on-conflict
//! - Profile fields keyed by (user_id, field name)
//!
//! A single connection sits behind a mutex, so every operation is one
//! serialized transaction. Work runs on the blocking pool; callers await.

use crate::db::tables;
use crate::error::{AppError, Result};
use crate::models::FavoriteMovie;
use crate::time_utils::format_utc_rfc3339;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA_VERSION: i64 = 1;

/// Local store handle. Cloning shares the same connection.
#[derive(Clone)]
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            AppError::LocalStore(format!("Failed to open {}: {}", path.display(), e))
        })?;
        migrate(&conn)?;

        tracing::info!(path = %path.display(), "Opened local store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| AppError::LocalStore("Connection lock poisoned".to_string()))?;
            op(&mut guard)
        })
        .await?
    }

    // ─── Favorites ───────────────────────────────────────────────

    /// Insert or replace a favorite. Returns the stored record.
    pub async fn upsert_favorite(
        &self,
        user_id: &str,
        movie: &FavoriteMovie,
    ) -> Result<FavoriteMovie> {
        let user_id = user_id.to_string();
        let mut movie = movie.clone();
        self.run(move |conn| {
            let now = format_utc_rfc3339(chrono::Utc::now());
            let tx = conn.transaction()?;
            upsert_favorite_row(&tx, &user_id, &movie, &now)?;
            movie.added_at = tx
                .query_row(
                    &format!(
                        "SELECT added_at FROM {} WHERE user_id = ?1 AND id = ?2",
                        tables::FAVORITES
                    ),
                    params![user_id, movie.id],
                    |row| row.get(0),
                )
                .optional()?;
            tx.commit()?;
            Ok(movie)
        })
        .await
    }

    /// All favorites for a user, in insertion order.
    pub async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteMovie>> {
        let user_id = user_id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, title, release_year, genre, rating, duration_minutes, poster_path, added_at
                 FROM {} WHERE user_id = ?1 ORDER BY rowid",
                tables::FAVORITES
            ))?;
            let rows = stmt
                .query_map(params![user_id], read_favorite)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    pub async fn get_favorite(&self, user_id: &str, movie_id: i64) -> Result<Option<FavoriteMovie>> {
        let user_id = user_id.to_string();
        self.run(move |conn| {
            let movie = conn
                .query_row(
                    &format!(
                        "SELECT id, title, release_year, genre, rating, duration_minutes, poster_path, added_at
                         FROM {} WHERE user_id = ?1 AND id = ?2",
                        tables::FAVORITES
                    ),
                    params![user_id, movie_id],
                    read_favorite,
                )
                .optional()?;
            Ok(movie)
        })
        .await
    }

    pub async fn favorite_exists(&self, user_id: &str, movie_id: i64) -> Result<bool> {
        let user_id = user_id.to_string();
        self.run(move |conn| favorite_exists(conn, &user_id, movie_id))
            .await
    }

    /// Delete a favorite. Returns whether a row was removed.
    pub async fn delete_favorite(&self, user_id: &str, movie_id: i64) -> Result<bool> {
        let user_id = user_id.to_string();
        self.run(move |conn| {
            let removed = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE user_id = ?1 AND id = ?2",
                    tables::FAVORITES
                ),
                params![user_id, movie_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    /// Delete every favorite of a user. Returns the number removed.
    pub async fn delete_all_favorites(&self, user_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        self.run(move |conn| {
            let removed = conn.execute(
                &format!("DELETE FROM {} WHERE user_id = ?1", tables::FAVORITES),
                params![user_id],
            )?;
            Ok(removed)
        })
        .await
    }

    /// Add the movie if absent, remove it if present, in one transaction.
    ///
    /// Returns `true` if the movie is a favorite afterwards.
    pub async fn toggle_favorite(&self, user_id: &str, movie: &FavoriteMovie) -> Result<bool> {
        let user_id = user_id.to_string();
        let movie = movie.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let now_favorite = if favorite_exists(&tx, &user_id, movie.id)? {
                tx.execute(
                    &format!(
                        "DELETE FROM {} WHERE user_id = ?1 AND id = ?2",
                        tables::FAVORITES
                    ),
                    params![user_id, movie.id],
                )?;
                false
            } else {
                let now = format_utc_rfc3339(chrono::Utc::now());
                upsert_favorite_row(&tx, &user_id, &movie, &now)?;
                true
            };
            tx.commit()?;
            Ok(now_favorite)
        })
        .await
    }

    pub async fn count_favorites(&self, user_id: &str) -> Result<usize> {
        let user_id = user_id.to_string();
        self.run(move |conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", tables::FAVORITES),
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }

    // ─── Profile Fields ──────────────────────────────────────────

    /// All cached profile fields for a user.
    pub async fn get_profile_fields(&self, user_id: &str) -> Result<HashMap<String, String>> {
        let user_id = user_id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT field, value FROM {} WHERE user_id = ?1",
                tables::PROFILE_FIELDS
            ))?;
            let fields = stmt
                .query_map(params![user_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;
            Ok(fields)
        })
        .await
    }

    pub async fn get_profile_field(&self, user_id: &str, field: &str) -> Result<Option<String>> {
        let user_id = user_id.to_string();
        let field = field.to_string();
        self.run(move |conn| {
            let value = conn
                .query_row(
                    &format!(
                        "SELECT value FROM {} WHERE user_id = ?1 AND field = ?2",
                        tables::PROFILE_FIELDS
                    ),
                    params![user_id, field],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    /// Write several profile fields atomically. A `None` value deletes the field.
    pub async fn put_profile_fields(
        &self,
        user_id: &str,
        fields: Vec<(&'static str, Option<String>)>,
    ) -> Result<()> {
        let user_id = user_id.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            for (field, value) in fields {
                match value {
                    Some(value) => {
                        tx.execute(
                            &format!(
                                "INSERT INTO {} (user_id, field, value) VALUES (?1, ?2, ?3)
                                 ON CONFLICT(user_id, field) DO UPDATE SET value = excluded.value",
                                tables::PROFILE_FIELDS
                            ),
                            params![user_id, field, value],
                        )?;
                    }
                    None => {
                        tx.execute(
                            &format!(
                                "DELETE FROM {} WHERE user_id = ?1 AND field = ?2",
                                tables::PROFILE_FIELDS
                            ),
                            params![user_id, field],
                        )?;
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

/// Create or upgrade the schema, tracked through `user_version`.
fn migrate(conn: &Connection) -> Result<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {favorites} (
                user_id TEXT NOT NULL,
                id INTEGER NOT NULL,
                title TEXT NOT NULL,
                release_year INTEGER NOT NULL,
                genre TEXT NOT NULL,
                rating REAL NOT NULL,
                duration_minutes INTEGER NOT NULL,
                poster_path TEXT,
                added_at TEXT NOT NULL,
                PRIMARY KEY (user_id, id)
            );

            CREATE TABLE IF NOT EXISTS {profile_fields} (
                user_id TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (user_id, field)
            );

            PRAGMA user_version = {version};",
            favorites = tables::FAVORITES,
            profile_fields = tables::PROFILE_FIELDS,
            version = SCHEMA_VERSION,
        ))?;
        tracing::debug!(from = version, to = SCHEMA_VERSION, "Migrated local store");
    }

    Ok(())
}

/// Replace-on-conflict write that keeps the row's original position and `added_at`.
fn upsert_favorite_row(
    conn: &Connection,
    user_id: &str,
    movie: &FavoriteMovie,
    now: &str,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (user_id, id, title, release_year, genre, rating, duration_minutes, poster_path, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_id, id) DO UPDATE SET
                title = excluded.title,
                release_year = excluded.release_year,
                genre = excluded.genre,
                rating = excluded.rating,
                duration_minutes = excluded.duration_minutes,
                poster_path = excluded.poster_path",
            tables::FAVORITES
        ),
        params![
            user_id,
            movie.id,
            movie.title,
            movie.release_year,
            movie.genre,
            movie.rating,
            movie.duration_minutes,
            movie.poster_path,
            now,
        ],
    )?;
    Ok(())
}

fn favorite_exists(conn: &Connection, user_id: &str, movie_id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ?1 AND id = ?2)",
            tables::FAVORITES
        ),
        params![user_id, movie_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn read_favorite(row: &Row) -> rusqlite::Result<FavoriteMovie> {
    Ok(FavoriteMovie {
        id: row.get(0)?,
        title: row.get(1)?,
        release_year: row.get(2)?,
        genre: row.get(3)?,
        rating: row.get(4)?,
        duration_minutes: row.get(5)?,
        poster_path: row.get(6)?,
        added_at: row.get(7)?,
    })
}
