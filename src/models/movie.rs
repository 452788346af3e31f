// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorite movie model for the local store.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A movie the user marked as favorite, cached locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FavoriteMovie {
    /// Catalog movie ID (unique key per user)
    pub id: i64,
    /// Movie title
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    /// Release year (0 when unknown)
    pub release_year: i32,
    /// Primary genre name
    pub genre: String,
    /// Average rating on a 0-10 scale
    #[validate(range(min = 0.0, max = 10.0, message = "rating must be within 0-10"))]
    pub rating: f64,
    /// Runtime in minutes
    pub duration_minutes: u32,
    /// Poster image path from the catalog
    pub poster_path: Option<String>,
    /// When the record was written to the store (RFC3339, set by the store)
    #[serde(default)]
    pub added_at: Option<String>,
}

impl FavoriteMovie {
    /// Create a favorite with the required catalog fields.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            release_year: 0,
            genre: String::new(),
            rating: 0.0,
            duration_minutes: 0,
            poster_path: None,
            added_at: None,
        }
    }
}
