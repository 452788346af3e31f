// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile repository: local cache plus remote reconciliation.
//!
//! Reads come from the local store. A session start pulls the remote copy
//! over the local one. A save writes locally first, publishes the optimistic
//! record, then pushes to the remote service from a background task whose
//! handle the repository keeps.

use crate::db::{profile_fields, LocalStore};
use crate::error::{AppError, Result};
use crate::models::{ProfileDocument, ProfileEdit, ProfilePhase, ProfileRecord, ProfileState};
use crate::services::RemoteProfileService;
use crate::session::{Identity, Session};
use crate::time_utils::format_utc_rfc3339;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use validator::Validate;

/// Profile of the signed-in user.
pub struct ProfileRepository {
    session: Session,
    sync: SyncContext,
    pending: Mutex<Vec<JoinHandle<Result<ProfileRecord>>>>,
    synced_user: Mutex<Option<String>>,
    /// Bumped by every local save; a sync that saw it change keeps the cache.
    save_generation: Mutex<u64>,
}

/// State shared with background pushes.
#[derive(Clone)]
struct SyncContext {
    store: LocalStore,
    remote: Arc<dyn RemoteProfileService>,
    state: Arc<watch::Sender<ProfileState>>,
    in_flight: Arc<AtomicUsize>,
}

impl ProfileRepository {
    pub fn new(session: Session, store: LocalStore, remote: Arc<dyn RemoteProfileService>) -> Self {
        let (state, _) = watch::channel(ProfileState::default());
        Self {
            session,
            sync: SyncContext {
                store,
                remote,
                state: Arc::new(state),
                in_flight: Arc::new(AtomicUsize::new(0)),
            },
            pending: Mutex::new(Vec::new()),
            synced_user: Mutex::new(None),
            save_generation: Mutex::new(0),
        }
    }

    /// Subscribe to profile state.
    ///
    /// The first observation for a user loads the cached profile (or the
    /// identity defaults) and publishes it. The receiver sees the latest
    /// value immediately and every later update.
    pub async fn observe(&self) -> Result<watch::Receiver<ProfileState>> {
        let identity = self.session.require_identity()?;

        let needs_load = {
            let state = self.sync.state.borrow();
            state.phase == ProfilePhase::Uninitialized
                || state.profile.as_ref().map(|p| p.user_id.as_str())
                    != Some(identity.user_id.as_str())
        };

        if needs_load {
            let record = load_cached(&self.sync.store, &identity).await?;
            tracing::debug!(user_id = %identity.user_id, "Loaded cached profile");
            self.sync.state.send_modify(|state| {
                let switched_user = state
                    .profile
                    .as_ref()
                    .is_some_and(|p| p.user_id != record.user_id);
                if switched_user {
                    state.last_error = None;
                }
                state.profile = Some(record);
                if state.phase == ProfilePhase::Uninitialized {
                    state.phase = ProfilePhase::Idle;
                }
            });
        }

        Ok(self.sync.state.subscribe())
    }

    /// Locally cached profile, or the identity defaults if none is cached.
    pub async fn current(&self) -> Result<ProfileRecord> {
        let identity = self.session.require_identity()?;
        load_cached(&self.sync.store, &identity).await
    }

    /// Publish the cached profile and pull the remote copy, once per user.
    pub async fn start_session(&self) -> Result<ProfileRecord> {
        let identity = self.session.require_identity()?;

        let mut synced_user = self.synced_user.lock().await;
        if synced_user.as_deref() == Some(identity.user_id.as_str()) {
            tracing::debug!(user_id = %identity.user_id, "Session already started");
            return self.current().await;
        }

        self.observe().await?;
        let record = self.sync_from_remote().await?;
        *synced_user = Some(identity.user_id);
        Ok(record)
    }

    /// Fetch the remote profile and overwrite the local cache with it.
    ///
    /// Without a remote document the cached profile is kept. On failure the
    /// cached values stay published and the error is recorded in state.
    pub async fn sync_from_remote(&self) -> Result<ProfileRecord> {
        let identity = self.session.require_identity()?;
        self.sync.set_phase(ProfilePhase::SyncingFromRemote);

        let result = self.pull_remote(&identity).await;
        match &result {
            Ok(record) => {
                tracing::info!(user_id = %identity.user_id, "Profile synced from remote");
                self.sync.state.send_modify(|state| {
                    state.profile = Some(record.clone());
                    state.last_error = None;
                });
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %identity.user_id,
                    error = %e,
                    "Profile sync from remote failed, keeping cached values"
                );
                self.sync
                    .state
                    .send_modify(|state| state.last_error = Some(e.clone()));
            }
        }
        self.sync.settle_phase();
        result
    }

    async fn pull_remote(&self, identity: &Identity) -> Result<ProfileRecord> {
        let started = *self.save_generation.lock().await;
        let remote = self.sync.remote.fetch_profile(&identity.user_id).await?;

        // Held until the write-through so a save cannot slip in between.
        let generation = self.save_generation.lock().await;
        let cached = load_cached(&self.sync.store, identity).await?;

        let Some(remote) = remote else {
            tracing::debug!(user_id = %identity.user_id, "No remote profile, keeping local");
            return Ok(cached);
        };
        if *generation != started {
            tracing::debug!(
                user_id = %identity.user_id,
                "Profile saved during sync, keeping local"
            );
            return Ok(cached);
        }

        let record = ProfileRecord {
            display_name: remote.display_name.unwrap_or(cached.display_name),
            bio: remote.bio.unwrap_or(cached.bio),
            photo_ref: remote.photo_url.or(cached.photo_ref),
            ..cached
        };
        write_record(&self.sync.store, &record).await?;
        Ok(record)
    }

    /// Save an edit: local write now, remote push in the background.
    ///
    /// Returns the optimistic record. The push outcome is published through
    /// the state channel and returned by [`ProfileRepository::wait_for_sync`].
    pub async fn save(&self, edit: ProfileEdit) -> Result<ProfileRecord> {
        let identity = self.session.require_identity()?;
        edit.validate()?;

        let optimistic = ProfileRecord {
            user_id: identity.user_id.clone(),
            display_name: edit.display_name.clone(),
            bio: edit.bio.clone(),
            photo_ref: edit.photo_ref.clone(),
            email: identity.email.clone(),
        };
        {
            let mut generation = self.save_generation.lock().await;
            write_record(&self.sync.store, &optimistic).await?;
            *generation += 1;
        }

        self.sync.in_flight.fetch_add(1, Ordering::SeqCst);
        self.sync.state.send_modify(|state| {
            state.profile = Some(optimistic.clone());
            state.phase = ProfilePhase::Saving;
        });
        tracing::info!(user_id = %identity.user_id, "Profile saved locally");

        let sync = self.sync.clone();
        let Identity { user_id, email, .. } = identity;
        let handle = tokio::spawn(async move {
            let result = sync.push(edit, user_id, email).await;
            sync.in_flight.fetch_sub(1, Ordering::SeqCst);
            sync.settle_phase();
            result
        });
        let mut pending = self.pending.lock().await;
        // Outcomes of finished pushes are already published
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);

        Ok(optimistic)
    }

    /// Await every pending push in spawn order and return the last outcome.
    pub async fn wait_for_sync(&self) -> Option<Result<ProfileRecord>> {
        let handles = std::mem::take(&mut *self.pending.lock().await);

        let mut last = None;
        for handle in handles {
            last = Some(match handle.await {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            });
        }
        last
    }

    /// Pushes spawned and not yet finished.
    pub async fn pending_syncs(&self) -> usize {
        self.pending
            .lock()
            .await
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Drop the recorded remote error once it has been shown.
    pub fn clear_error(&self) {
        self.sync.state.send_modify(|state| state.last_error = None);
    }
}

impl SyncContext {
    fn set_phase(&self, phase: ProfilePhase) {
        self.state.send_modify(|state| state.phase = phase);
    }

    /// Back to idle unless a push is still running.
    fn settle_phase(&self) {
        let phase = if self.in_flight.load(Ordering::SeqCst) > 0 {
            ProfilePhase::Saving
        } else {
            ProfilePhase::Idle
        };
        self.set_phase(phase);
    }

    /// Push one saved edit and record the outcome.
    async fn push(
        &self,
        edit: ProfileEdit,
        user_id: String,
        email: Option<String>,
    ) -> Result<ProfileRecord> {
        let result = self.push_remote(&edit, &user_id, email).await;
        match &result {
            Ok(confirmed) => {
                tracing::info!(user_id = %user_id, "Profile confirmed by remote");
                self.state.send_modify(|state| {
                    if state
                        .profile
                        .as_ref()
                        .map_or(true, |p| p.user_id == confirmed.user_id)
                    {
                        state.profile = Some(confirmed.clone());
                    }
                    state.last_error = None;
                });
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Profile push failed, keeping local values"
                );
                self.state
                    .send_modify(|state| state.last_error = Some(e.clone()));
            }
        }
        result
    }

    async fn push_remote(
        &self,
        edit: &ProfileEdit,
        user_id: &str,
        email: Option<String>,
    ) -> Result<ProfileRecord> {
        let mut upload_error = None;
        let photo_url = match edit.local_photo() {
            Some(path) => match self.upload_photo(user_id, path).await {
                Ok(url) => Some(url),
                Err(e) => {
                    upload_error = Some(e);
                    None
                }
            },
            None => edit.photo_ref.clone(),
        };

        self.remote
            .update_display_name(user_id, &edit.display_name)
            .await?;

        let doc = ProfileDocument {
            display_name: Some(edit.display_name.clone()),
            bio: Some(edit.bio.clone()),
            photo_url: photo_url.clone(),
            updated_at: Some(format_utc_rfc3339(chrono::Utc::now())),
        };
        self.remote.write_profile_document(user_id, &doc).await?;

        if let Some(e) = upload_error {
            return Err(e);
        }

        // The document write leaves an absent photo untouched, so read back
        // whatever photo the server still holds.
        let photo_url = match photo_url {
            Some(url) => Some(url),
            None => self
                .remote
                .fetch_profile(user_id)
                .await?
                .and_then(|remote| remote.photo_url),
        };

        let confirmed = ProfileRecord {
            user_id: user_id.to_string(),
            display_name: edit.display_name.clone(),
            bio: edit.bio.clone(),
            photo_ref: photo_url,
            email,
        };
        write_record(&self.store, &confirmed).await?;
        Ok(confirmed)
    }

    async fn upload_photo(&self, user_id: &str, path: &str) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::UploadFailed(format!("Failed to read {}: {}", path, e)))?;
        let url = self.remote.upload_photo(user_id, bytes).await?;
        tracing::debug!(user_id = %user_id, url = %url, "Photo upload confirmed");
        Ok(url)
    }
}

/// Cached profile fields over the identity defaults.
async fn load_cached(store: &LocalStore, identity: &Identity) -> Result<ProfileRecord> {
    let mut fields = store.get_profile_fields(&identity.user_id).await?;
    Ok(ProfileRecord {
        user_id: identity.user_id.clone(),
        display_name: fields
            .remove(profile_fields::DISPLAY_NAME)
            .or_else(|| identity.display_name.clone())
            .unwrap_or_default(),
        bio: fields.remove(profile_fields::BIO).unwrap_or_default(),
        photo_ref: fields.remove(profile_fields::PHOTO_REF),
        email: identity.email.clone(),
    })
}

async fn write_record(store: &LocalStore, record: &ProfileRecord) -> Result<()> {
    store
        .put_profile_fields(
            &record.user_id,
            vec![
                (profile_fields::DISPLAY_NAME, Some(record.display_name.clone())),
                (profile_fields::BIO, Some(record.bio.clone())),
                (profile_fields::PHOTO_REF, record.photo_ref.clone()),
            ],
        )
        .await
}
