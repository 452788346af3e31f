// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process remote profile service for offline mode and tests.
//!
//! Reachability, upload failures and latency can be switched at runtime to
//! drive the reconciliation flow through its failure paths.

use crate::error::{AppError, Result};
use crate::models::{ProfileDocument, RemoteProfile};
use crate::services::RemoteProfileService;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PHOTO_BASE_URL: &str = "https://storage.local/profile_images";

#[derive(Default)]
struct Inner {
    profiles: DashMap<String, RemoteProfile>,
    display_names: DashMap<String, String>,
    photos: DashMap<String, Vec<u8>>,
    unreachable: AtomicBool,
    uploads_failing: AtomicBool,
    upload_seq: AtomicU64,
    document_writes: AtomicU64,
    latency: Mutex<Option<Duration>>,
}

/// In-memory remote profile service. Cloning shares the same state.
#[derive(Clone, Default)]
pub struct InMemoryProfileService {
    inner: Arc<Inner>,
}

impl InMemoryProfileService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle network reachability. Unreachable calls fail with `RemoteUnavailable`.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.unreachable.store(!reachable, Ordering::SeqCst);
    }

    /// Make photo uploads fail with `UploadFailed` while other calls succeed.
    pub fn set_uploads_failing(&self, failing: bool) {
        self.inner.uploads_failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut guard) = self.inner.latency.lock() {
            *guard = latency;
        }
    }

    /// Seed a remote profile document.
    pub fn insert_profile(&self, user_id: &str, profile: RemoteProfile) {
        self.inner.profiles.insert(user_id.to_string(), profile);
    }

    /// Current remote profile document.
    pub fn profile(&self, user_id: &str) -> Option<RemoteProfile> {
        self.inner.profiles.get(user_id).map(|p| p.clone())
    }

    /// Display name last set through `update_display_name`.
    pub fn display_name(&self, user_id: &str) -> Option<String> {
        self.inner.display_names.get(user_id).map(|n| n.clone())
    }

    /// Bytes stored behind a URL returned by `upload_photo`.
    pub fn photo(&self, url: &str) -> Option<Vec<u8>> {
        self.inner.photos.get(url).map(|p| p.clone())
    }

    /// Number of document writes accepted so far.
    pub fn document_writes(&self) -> u64 {
        self.inner.document_writes.load(Ordering::SeqCst)
    }

    async fn simulate_network(&self) -> Result<()> {
        let latency = self.inner.latency.lock().ok().and_then(|guard| *guard);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.inner.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::RemoteUnavailable(
                "Remote profile service unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteProfileService for InMemoryProfileService {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RemoteProfile>> {
        self.simulate_network().await?;
        Ok(self.profile(user_id))
    }

    async fn update_display_name(&self, user_id: &str, display_name: &str) -> Result<()> {
        self.simulate_network().await?;
        self.inner
            .display_names
            .insert(user_id.to_string(), display_name.to_string());
        Ok(())
    }

    async fn upload_photo(&self, user_id: &str, bytes: Vec<u8>) -> Result<String> {
        self.simulate_network()
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;

        if self.inner.uploads_failing.load(Ordering::SeqCst) {
            return Err(AppError::UploadFailed("Upload rejected".to_string()));
        }

        let version = self.inner.upload_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let url = format!("{}/{}.jpg?v={}", PHOTO_BASE_URL, user_id, version);
        self.inner.photos.insert(url.clone(), bytes);
        Ok(url)
    }

    async fn write_profile_document(&self, user_id: &str, doc: &ProfileDocument) -> Result<()> {
        self.simulate_network().await?;
        let mut entry = self
            .inner
            .profiles
            .entry(user_id.to_string())
            .or_default();
        doc.merge_into(&mut entry);
        self.inner.document_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
