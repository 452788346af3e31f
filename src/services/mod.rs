// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - remote collaborators.

pub mod id_token;
pub mod identity_toolkit;
pub mod memory;
pub mod remote;
pub mod storage;
pub mod tmdb;

pub use id_token::IdTokenVerifier;
pub use identity_toolkit::IdentityToolkitClient;
pub use memory::InMemoryProfileService;
pub use remote::{CloudProfileService, RemoteProfileService};
pub use storage::StorageClient;
pub use tmdb::{MovieDetails, MoviePage, MovieSummary, TmdbClient};
