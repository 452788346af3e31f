// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote profile service contract and its Firebase-backed implementation.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{ProfileDocument, RemoteProfile};
use crate::services::{IdentityToolkitClient, StorageClient};
use crate::session::Session;
use async_trait::async_trait;

/// Durable copy of profile data and uploaded photos.
#[async_trait]
pub trait RemoteProfileService: Send + Sync {
    /// Fetch the remote profile, `None` if the user has no document yet.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RemoteProfile>>;

    /// Update the display name held by the identity provider.
    async fn update_display_name(&self, user_id: &str, display_name: &str) -> Result<()>;

    /// Upload a photo and return its durable URL.
    async fn upload_photo(&self, user_id: &str, bytes: Vec<u8>) -> Result<String>;

    /// Write the present fields of `doc` with merge semantics.
    async fn write_profile_document(&self, user_id: &str, doc: &ProfileDocument) -> Result<()>;
}

/// Remote profile service backed by Firestore, Firebase Storage and the
/// Identity Toolkit.
///
/// Authenticated calls use the ID token of the session's identity.
#[derive(Clone)]
pub struct CloudProfileService {
    db: FirestoreDb,
    storage: StorageClient,
    identity: IdentityToolkitClient,
    session: Session,
}

impl CloudProfileService {
    pub fn new(
        db: FirestoreDb,
        storage: StorageClient,
        identity: IdentityToolkitClient,
        session: Session,
    ) -> Self {
        Self {
            db,
            storage,
            identity,
            session,
        }
    }

    /// ID token for `user_id`, which must be the signed-in user.
    fn bearer_token(&self, user_id: &str) -> Result<String> {
        let identity = self.session.require_identity()?;
        if identity.user_id != user_id {
            tracing::warn!(
                requested = user_id,
                signed_in = %identity.user_id,
                "Remote call for a user other than the signed-in one"
            );
            return Err(AppError::NotAuthenticated);
        }
        identity.id_token.ok_or(AppError::NotAuthenticated)
    }
}

#[async_trait]
impl RemoteProfileService for CloudProfileService {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RemoteProfile>> {
        Ok(self.db.get_profile(user_id).await?.map(RemoteProfile::from))
    }

    async fn update_display_name(&self, user_id: &str, display_name: &str) -> Result<()> {
        let token = self.bearer_token(user_id)?;
        self.identity
            .update_display_name(&token, display_name)
            .await
    }

    async fn upload_photo(&self, user_id: &str, bytes: Vec<u8>) -> Result<String> {
        let token = self.bearer_token(user_id)?;
        self.storage
            .upload_profile_photo(&token, user_id, bytes)
            .await
    }

    async fn write_profile_document(&self, user_id: &str, doc: &ProfileDocument) -> Result<()> {
        self.db.merge_profile(user_id, doc).await
    }
}
