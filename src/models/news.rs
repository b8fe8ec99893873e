// ============================================================================
// Structure : NewsArticle
// ============================================================================
// Un article de la section "Market News & Analysis"
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl NewsArticle {
    /// Âge de l'article relatif à `now`, en texte
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        format_time_ago(self.published_at, now)
    }
}

/// "Just now", "12 minutes ago", "3 hours ago", "2 days ago"
///
/// Une date dans le futur compte comme "Just now".
pub fn format_time_ago(published_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - published_at).num_minutes();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} minutes ago", minutes)
    } else if minutes < 1440 {
        format!("{} hours ago", minutes / 60)
    } else {
        format!("{} days ago", minutes / 1440)
    }
}
