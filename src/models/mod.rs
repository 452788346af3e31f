// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod movie;
pub mod profile;

pub use movie::FavoriteMovie;
pub use profile::{
    ProfileDocument, ProfileEdit, ProfilePhase, ProfileRecord, ProfileState, RemoteProfile,
};
