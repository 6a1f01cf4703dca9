use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::movie::MovieId;

/// Chat user identifier (Telegram user ids exceed 32 bits)
pub type UserId = i64;

/// A saved title. `(user_id, movie_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub title: String,
    pub year: String, // Empty when unknown
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    /// "Title (Year)", or just the title when the year is unknown
    pub fn label(&self) -> String {
        if self.year.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.year)
        }
    }
}
