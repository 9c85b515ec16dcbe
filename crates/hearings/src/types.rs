use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_STATUS: &str = "Scheduled";

#[derive(Debug, thiserror::Error)]
#[error("Invalid chamber '{0}'. Accepted values: 'house', 'senate'")]
pub struct ChamberParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Chamber {
    #[serde(alias = "House", alias = "HOUSE", alias = "hrep")]
    House,
    #[serde(alias = "Senate", alias = "SENATE")]
    Senate,
}

impl FromStr for Chamber {
    type Err = ChamberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "house" | "hrep" => Ok(Chamber::House),
            "senate" => Ok(Chamber::Senate),
            _ => Err(ChamberParseError(s.to_string())),
        }
    }
}

impl Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chamber::House => write!(f, "House of Representatives"),
            Chamber::Senate => write!(f, "Senate"),
        }
    }
}

/// One committee hearing, normalized so records from either chamber compare
/// field for field.
///
/// `iso_date` and `search_text` are derived caches; see
/// [`crate::assemble::decorate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    #[serde(default)]
    pub id: String,
    pub chamber: Chamber,
    #[serde(default)]
    pub committee: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub agenda: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub iso_date: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub search_text: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    #[schemars(with = "Option<DateTime<Utc>>")]
    pub first_seen_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    #[schemars(with = "Option<DateTime<Utc>>")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl CanonicalRecord {
    pub fn new(chamber: Chamber, source: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            chamber,
            committee: String::new(),
            date: String::new(),
            time: String::new(),
            venue: String::new(),
            agenda: String::new(),
            status: default_status(),
            notes: String::new(),
            iso_date: String::new(),
            source: source.into(),
            search_text: String::new(),
            first_seen_at: None,
            last_seen_at: None,
        }
    }

    /// `committee` and `date` are the two fields a record cannot exist without.
    pub fn is_complete(&self) -> bool {
        !self.committee.is_empty() && !self.date.is_empty()
    }
}

impl Display for CanonicalRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let time = if self.time.is_empty() { "TBD" } else { &self.time };
        write!(f, "[{}] {} {} - {}", self.chamber, self.date, time, self.committee)?;
        if !self.venue.is_empty() {
            write!(f, "\n   Venue:  {}", self.venue)?;
        }
        if self.status != DEFAULT_STATUS {
            write!(f, "\n   Status: {}", self.status)?;
        }
        if !self.agenda.is_empty() {
            let preview: String = self.agenda.chars().take(120).collect();
            write!(f, "\n   Agenda: {}", preview)?;
        }
        Ok(())
    }
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

// A bad timestamp on one history entry must not make the whole file unreadable.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
