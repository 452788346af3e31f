// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Repositories - what callers talk to.

pub mod favorites;
pub mod profile;

pub use favorites::FavoritesRepository;
pub use profile::ProfileRepository;
