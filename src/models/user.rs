// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// Created on the user's first step sync; identity itself lives with the
/// external auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Auth subject (also used as document ID)
    pub user_id: String,
    /// Name shown on the leaderboard
    pub display_name: Option<String>,
    /// When the user first synced steps
    pub created_at: DateTime<Utc>,
    /// Last sync timestamp
    pub last_active: DateTime<Utc>,
}

impl User {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            created_at: now,
            last_active: now,
        }
    }
}
