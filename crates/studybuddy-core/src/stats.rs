//! Study statistics and leaderboard ranking.

use serde::{Deserialize, Serialize};

/// One user's accumulated study minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub total_minutes: f64,
}

/// Order entries the way the buddy screen shows them: most minutes first,
/// user id as the tie-break.
pub fn rank_by_minutes(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.total_minutes
            .partial_cmp(&a.total_minutes)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    entries
}
