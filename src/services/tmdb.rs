// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TMDB catalog client for movie details, search and popular listings.
//!
//! Handles:
//! - Movie detail lookup (source of favorite records)
//! - Paged search and popular listings
//! - Rate limit and auth error detection

use crate::error::AppError;
use crate::models::FavoriteMovie;
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Deserialize;

/// Detail lookups in flight at once for batch fetches.
const MAX_CONCURRENT_LOOKUPS: usize = 4;

/// TMDB v3 API client.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Get detailed movie info by ID.
    pub async fn get_movie(&self, movie_id: i64) -> Result<MovieDetails, AppError> {
        let url = format!("{}/movie/{}", self.base_url, movie_id);
        self.get_json(&url, &[]).await
    }

    /// Get details for several movies, in the order requested.
    pub async fn get_movies(&self, movie_ids: &[i64]) -> Result<Vec<MovieDetails>, AppError> {
        stream::iter(movie_ids.iter().copied())
            .map(|movie_id| self.get_movie(movie_id))
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .try_collect()
            .await
    }

    /// Search movies by title.
    pub async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("search query is empty".to_string()));
        }

        let url = format!("{}/search/movie", self.base_url);
        self.get_json(
            &url,
            &[("query", query.to_string()), ("page", page.max(1).to_string())],
        )
        .await
    }

    /// Currently popular movies.
    pub async fn popular_movies(&self, page: u32) -> Result<MoviePage, AppError> {
        let url = format!("{}/movie/popular", self.base_url);
        self.get_json(&url, &[("page", page.max(1).to_string())])
            .await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Catalog(e.to_string()))?;

        check_status(response.status().as_u16(), url)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Catalog(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Catalog(format!("JSON parse error: {}", e)))
    }
}

/// Map the statuses that get a dedicated error.
fn check_status(status: u16, url: &str) -> Result<(), AppError> {
    match status {
        401 => Err(AppError::Catalog("unauthorized (check TMDB_API_KEY)".to_string())),
        404 => Err(AppError::NotFound(url.to_string())),
        429 => {
            tracing::warn!("TMDB rate limit hit (429)");
            Err(AppError::Catalog(AppError::CATALOG_RATE_LIMIT.to_string()))
        }
        _ => Ok(()),
    }
}

/// Detailed movie response.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl MovieDetails {
    /// Build the favorite record cached for this movie.
    pub fn to_favorite(&self) -> FavoriteMovie {
        FavoriteMovie {
            id: self.id,
            title: self.title.clone(),
            release_year: self
                .release_date
                .as_deref()
                .and_then(parse_release_year)
                .unwrap_or(0),
            genre: self
                .genres
                .first()
                .map(|g| g.name.clone())
                .unwrap_or_default(),
            rating: self.vote_average.clamp(0.0, 10.0),
            duration_minutes: self.runtime.unwrap_or(0),
            poster_path: self.poster_path.clone(),
            added_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Summary movie for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// One page of a paged list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MoviePage {
    pub page: u32,
    pub results: Vec<MovieSummary>,
    pub total_pages: u32,
    pub total_results: u32,
}

impl MoviePage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Extract the year from a "YYYY-MM-DD" date.
fn parse_release_year(date: &str) -> Option<i32> {
    date.get(..4).and_then(|year| year.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_to_favorite() {
        let details: MovieDetails = serde_json::from_value(serde_json::json!({
            "id": 603,
            "title": "The Matrix",
            "release_date": "1999-03-30",
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "vote_average": 8.2,
            "runtime": 136,
            "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg"
        }))
        .unwrap();

        let favorite = details.to_favorite();
        assert_eq!(favorite.id, 603);
        assert_eq!(favorite.release_year, 1999);
        assert_eq!(favorite.genre, "Action");
        assert_eq!(favorite.duration_minutes, 136);
        assert_eq!(
            favorite.poster_path.as_deref(),
            Some("/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg")
        );
    }

    #[test]
    fn test_missing_optional_fields() {
        let details: MovieDetails = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Untitled",
            "release_date": ""
        }))
        .unwrap();

        let favorite = details.to_favorite();
        assert_eq!(favorite.release_year, 0);
        assert_eq!(favorite.genre, "");
        assert_eq!(favorite.duration_minutes, 0);
        assert_eq!(favorite.rating, 0.0);
    }

    #[test]
    fn test_check_status_mapping() {
        assert!(check_status(200, "u").is_ok());
        assert!(matches!(check_status(404, "u"), Err(AppError::NotFound(_))));
        assert!(check_status(429, "u").unwrap_err().is_rate_limited());
        assert!(matches!(check_status(401, "u"), Err(AppError::Catalog(_))));
    }

    #[test]
    fn test_page_has_more() {
        let page: MoviePage = serde_json::from_value(serde_json::json!({
            "page": 1,
            "results": [{"id": 1, "title": "A"}],
            "total_pages": 3,
            "total_results": 41
        }))
        .unwrap();
        assert!(page.has_more());
    }
}
