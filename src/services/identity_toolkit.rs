// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity Toolkit client for updating the provider-held display name.

use crate::error::AppError;
use serde::Serialize;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit REST client.
#[derive(Clone)]
pub struct IdentityToolkitClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

impl IdentityToolkitClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Set the display name of the account owning `id_token`.
    pub async fn update_display_name(
        &self,
        id_token: &str,
        display_name: &str,
    ) -> Result<(), AppError> {
        let url = format!("{}/accounts:update", self.base_url);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&UpdateAccountRequest {
                id_token,
                display_name,
                return_secure_token: false,
            })
            .send()
            .await
            .map_err(|e| AppError::RemoteUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // Expired or revoked ID token
            if body.contains("INVALID_ID_TOKEN") || body.contains("TOKEN_EXPIRED") {
                return Err(AppError::NotAuthenticated);
            }

            return Err(AppError::RemoteUnavailable(format!(
                "Display name update failed: HTTP {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_camel_case() {
        let body = serde_json::to_value(UpdateAccountRequest {
            id_token: "tok",
            display_name: "Ava",
            return_secure_token: false,
        })
        .unwrap();

        assert_eq!(body["idToken"], "tok");
        assert_eq!(body["displayName"], "Ava");
        assert_eq!(body["returnSecureToken"], false);
    }
}
