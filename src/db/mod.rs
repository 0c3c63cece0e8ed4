//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Phase progression (keyed by user_id)
    pub const PHASE_STATES: &str = "phase_states";
    /// Per-day earnings (keyed by `{user_id}_{date}`)
    pub const DAILY_EARNINGS: &str = "daily_earnings";
}
