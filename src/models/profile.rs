// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile models: the locally cached record, the edit submitted by a save,
//! the remote document, and the observable state.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Profile cached in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Identity provider user ID (key)
    pub user_id: String,
    /// Display name
    pub display_name: String,
    /// Short biography
    pub bio: String,
    /// Photo reference: a durable URL, or a local file path before upload
    pub photo_ref: Option<String>,
    /// Email from the identity (read-only)
    pub email: Option<String>,
}

/// Fields submitted by an edit-profile save.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ProfileEdit {
    pub display_name: String,
    #[validate(length(max = 300, message = "bio must be at most 300 characters"))]
    pub bio: String,
    pub photo_ref: Option<String>,
}

impl ProfileEdit {
    pub fn new(display_name: impl Into<String>, bio: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            bio: bio.into(),
            photo_ref: None,
        }
    }

    pub fn with_photo(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = Some(photo_ref.into());
        self
    }

    /// Local photo path that must be uploaded before the document write.
    pub fn local_photo(&self) -> Option<&str> {
        self.photo_ref
            .as_deref()
            .filter(|photo| !is_remote_url(photo))
    }
}

/// Profile fields as returned by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteProfile {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

/// Fields written to the remote profile document with merge semantics.
///
/// `None` fields are left untouched on the remote side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ProfileDocument {
    /// Names of the fields present in this document, for the update mask.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::with_capacity(4);
        if self.display_name.is_some() {
            fields.push("display_name");
        }
        if self.bio.is_some() {
            fields.push("bio");
        }
        if self.photo_url.is_some() {
            fields.push("photo_url");
        }
        if self.updated_at.is_some() {
            fields.push("updated_at");
        }
        fields
    }

    /// Merge this document over an existing one.
    pub fn merge_into(&self, existing: &mut RemoteProfile) {
        if let Some(name) = &self.display_name {
            existing.display_name = Some(name.clone());
        }
        if let Some(bio) = &self.bio {
            existing.bio = Some(bio.clone());
        }
        if let Some(url) = &self.photo_url {
            existing.photo_url = Some(url.clone());
        }
    }
}

impl From<ProfileDocument> for RemoteProfile {
    fn from(doc: ProfileDocument) -> Self {
        Self {
            display_name: doc.display_name,
            bio: doc.bio,
            photo_url: doc.photo_url,
        }
    }
}

/// Where the profile flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfilePhase {
    #[default]
    Uninitialized,
    Idle,
    SyncingFromRemote,
    Saving,
}

/// Value published to profile observers.
#[derive(Debug, Clone, Default)]
pub struct ProfileState {
    pub profile: Option<ProfileRecord>,
    pub phase: ProfilePhase,
    /// Last remote failure, kept until cleared or a later sync succeeds
    pub last_error: Option<AppError>,
}

/// Whether a photo reference is already a durable remote URL.
pub fn is_remote_url(photo_ref: &str) -> bool {
    photo_ref.starts_with("https://") || photo_ref.starts_with("http://")
}
