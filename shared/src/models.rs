//! Shared data models for the events API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Category tags an event can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Academic,
    Athletic,
    Club,
    Social,
    Cultural,
    Arts,
    Volunteer,
    Other,
}

impl EventCategory {
    /// Every category, in display order.
    pub const ALL: [EventCategory; 8] = [
        EventCategory::Academic,
        EventCategory::Athletic,
        EventCategory::Club,
        EventCategory::Social,
        EventCategory::Cultural,
        EventCategory::Arts,
        EventCategory::Volunteer,
        EventCategory::Other,
    ];

    /// Canonical lowercase tag, as stored in `event_categories`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Academic => "academic",
            EventCategory::Athletic => "athletic",
            EventCategory::Club => "club",
            EventCategory::Social => "social",
            EventCategory::Cultural => "cultural",
            EventCategory::Arts => "arts",
            EventCategory::Volunteer => "volunteer",
            EventCategory::Other => "other",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Academic => "Academic",
            EventCategory::Athletic => "Athletic",
            EventCategory::Club => "Club",
            EventCategory::Social => "Social",
            EventCategory::Cultural => "Cultural",
            EventCategory::Arts => "Arts",
            EventCategory::Volunteer => "Volunteer",
            EventCategory::Other => "Other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "academic" => Ok(EventCategory::Academic),
            "athletic" => Ok(EventCategory::Athletic),
            "club" => Ok(EventCategory::Club),
            "social" => Ok(EventCategory::Social),
            "cultural" => Ok(EventCategory::Cultural),
            "arts" => Ok(EventCategory::Arts),
            "volunteer" => Ok(EventCategory::Volunteer),
            "other" => Ok(EventCategory::Other),
            _ => Err(Error::Validation(format!("Unknown category: {}", s))),
        }
    }
}

/// Event row from the database, with its category tags aggregated into
/// a text array.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub categories: Vec<String>,
}

impl EventRow {
    /// Category tags parsed to the known set; unknown tags are dropped.
    pub fn parsed_categories(&self) -> Vec<EventCategory> {
        self.categories
            .iter()
            .filter_map(|tag| tag.parse().ok())
            .collect()
    }
}

/// Event API response.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub categories: Vec<EventCategory>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<EventRow> for EventResponse {
    fn from(row: EventRow) -> Self {
        let categories = row.parsed_categories();
        Self {
            id: row.id.to_string(),
            title: row.title,
            description: row.description,
            start_time: row.start_time.to_rfc3339(),
            end_time: row.end_time.map(|dt| dt.to_rfc3339()),
            categories,
            location: row.location,
            organizer: row.organizer,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
        }
    }
}
