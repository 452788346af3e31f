// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screenvault bootstrap
//!
//! Opens the local store, resolves the signed-in identity from an ID token,
//! and reconciles the cached profile with the remote copy.

use screenvault::{
    config::Config,
    services::IdTokenVerifier,
    session::{Identity, Session},
    AppContext,
};
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        db_path = %config.db_path.display(),
        offline = config.offline,
        "Starting screenvault"
    );

    let session = Session::new();
    let ctx = AppContext::connect(config, session.clone()).await?;

    let Some(identity) = resolve_identity(&ctx.config).await? else {
        tracing::warn!("No identity configured (set SCREENVAULT_ID_TOKEN), nothing to sync");
        return Ok(());
    };
    session.sign_in(identity);

    match ctx.profile.start_session().await {
        Ok(profile) => tracing::info!(
            user_id = %profile.user_id,
            display_name = %profile.display_name,
            "Profile ready"
        ),
        Err(e) if e.is_remote() => {
            tracing::warn!(error = %e, "Profile sync failed, using cached profile")
        }
        Err(e) => return Err(e.into()),
    }

    let count = ctx.favorites.count().await?;
    tracing::info!(count, "Favorites loaded");

    if let Some(Err(e)) = ctx.profile.wait_for_sync().await {
        tracing::warn!(error = %e, "Pending profile push failed");
    }
    Ok(())
}

/// Identity from `SCREENVAULT_ID_TOKEN`, or `SCREENVAULT_USER_ID` when offline.
async fn resolve_identity(config: &Config) -> Result<Option<Identity>, Box<dyn std::error::Error>> {
    if let Ok(token) = env::var("SCREENVAULT_ID_TOKEN") {
        let verifier = IdTokenVerifier::new(&config.firebase_project_id)?;
        let identity = verifier.verify(token.trim()).await?;
        return Ok(Some(identity));
    }

    if config.offline {
        if let Ok(user_id) = env::var("SCREENVAULT_USER_ID") {
            return Ok(Some(Identity::new(user_id.trim())));
        }
    }

    Ok(None)
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("screenvault=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
