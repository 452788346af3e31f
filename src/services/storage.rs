// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Storage client for profile photo uploads.

use crate::error::AppError;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0";
const PROFILE_IMAGES_PREFIX: &str = "profile_images";

/// Firebase Storage REST client.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(bucket: &str) -> Self {
        Self::with_base_url(bucket, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(bucket: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }

    /// Upload a profile photo and return its durable download URL.
    ///
    /// Each user has a single object; a new upload replaces the old one and
    /// issues a fresh download token.
    pub async fn upload_profile_photo(
        &self,
        id_token: &str,
        user_id: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let object_name = profile_object_name(user_id);
        let url = format!("{}/b/{}/o", self.base_url, self.bucket);
        let size = bytes.len();

        let response = self
            .http
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object_name.as_str())])
            .bearer_auth(id_token)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::UploadFailed(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, user_id, "Photo upload rejected");
            return Err(AppError::UploadFailed(format!("HTTP {}: {}", status, body)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::UploadFailed(format!("JSON parse error: {}", e)))?;

        let token = uploaded
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::UploadFailed("Response had no download token".to_string()))?;

        tracing::info!(user_id, bytes = size, "Profile photo uploaded");

        Ok(download_url(
            &self.base_url,
            &uploaded.bucket,
            &uploaded.name,
            token,
        ))
    }
}

/// Object metadata returned by an upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    bucket: String,
    download_tokens: Option<String>,
}

fn profile_object_name(user_id: &str) -> String {
    format!("{}/{}.jpg", PROFILE_IMAGES_PREFIX, user_id)
}

/// Public download URL for an object with a download token.
fn download_url(base_url: &str, bucket: &str, name: &str, token: &str) -> String {
    format!(
        "{}/b/{}/o/{}?alt=media&token={}",
        base_url,
        bucket,
        urlencoding::encode(name),
        urlencoding::encode(token)
    )
}
