//! Database layer: embedded SQLite store and remote Firestore documents.

pub mod firestore;
pub mod local;

pub use firestore::FirestoreDb;
pub use local::LocalStore;

/// Firestore collection names as constants.
pub mod collections {
    /// Profile documents (keyed by user_id)
    pub const USERS: &str = "users";
}

/// Local store table names.
pub mod tables {
    pub const FAVORITES: &str = "favorites";
    /// Profile fields keyed by (user_id, field)
    pub const PROFILE_FIELDS: &str = "profile_fields";
}

/// Local profile field names.
pub mod profile_fields {
    pub const DISPLAY_NAME: &str = "display_name";
    pub const BIO: &str = "bio";
    pub const PHOTO_REF: &str = "photo_ref";
}
