// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in session passed explicitly to the repositories.
//!
//! The identity is owned by the identity provider; this type only observes
//! login/logout transitions and hands out the current identity.

use crate::error::{AppError, Result};
use std::sync::Arc;
use tokio::sync::watch;

/// Identity resolved from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider user ID
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Raw ID token, used as bearer credential for remote calls
    pub id_token: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            display_name: None,
            id_token: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }
}

/// Shared session handle. Cloning shares the same underlying state.
#[derive(Clone)]
pub struct Session {
    identity: Arc<watch::Sender<Option<Identity>>>,
}

impl Session {
    /// Create a signed-out session.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            identity: Arc::new(tx),
        }
    }

    /// Create a session that is already signed in.
    pub fn signed_in(identity: Identity) -> Self {
        let session = Self::new();
        session.sign_in(identity);
        session
    }

    pub fn sign_in(&self, identity: Identity) {
        tracing::info!(user_id = %identity.user_id, "Session signed in");
        self.identity.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.identity.send_replace(None) {
            tracing::info!(user_id = %previous.user_id, "Session signed out");
        }
    }

    /// Current identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.identity.borrow().as_ref().map(|i| i.user_id.clone())
    }

    /// Current identity, or `NotAuthenticated`.
    pub fn require_identity(&self) -> Result<Identity> {
        self.identity().ok_or(AppError::NotAuthenticated)
    }

    /// Observe login/logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
