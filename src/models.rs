// Data models for the print inbox

use crate::error::ValidationError;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single print job request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub dev_notes: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default = "default_synced")]
    pub synced: bool,
}

fn default_synced() -> bool {
    true
}

/// Spreadsheet rows carry blank cells and sometimes full timestamps where a date is expected
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_due_date(raw).map(Some).map_err(serde::de::Error::custom)
}

/// Timestamps name an instant, so their calendar day is the local one
fn parse_due_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(stamp) => Ok(stamp.with_timezone(&Local).date_naive()),
        Err(_) => NaiveDate::parse_from_str(raw, "%Y-%m-%d"),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Normal, Priority::High, Priority::Urgent];

    /// Ordering weight used by the priority sort
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown priority: {} (expected low, normal, high or urgent)", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    New,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Done,
    Archived,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::New, Status::InProgress, Status::Done, Status::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "New",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
            Status::Archived => "Archived",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();
        Status::ALL
            .into_iter()
            .find(|st| st.as_str().replace(' ', "").eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| format!("unknown status: {} (expected new, in-progress, done or archived)", s))
    }
}

/// Input for creating a request
#[derive(Debug, Clone, Default)]
pub struct NewRequest {
    pub name: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl NewRequest {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Trim the required fields and reject blanks
    pub(crate) fn validate(&self) -> Result<(String, String), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        Ok((name.to_string(), description.to_string()))
    }
}

/// Partial update of the mutable fields of a request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestChanges {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub dev_notes: Option<String>,
    pub pinned: Option<bool>,
    pub synced: Option<bool>,
}

impl RequestChanges {
    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn dev_notes(mut self, notes: impl Into<String>) -> Self {
        self.dev_notes = Some(notes.into());
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    pub fn synced(mut self, synced: bool) -> Self {
        self.synced = Some(synced);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the present fields into `request`
    pub fn apply_to(&self, request: &mut Request) {
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(priority) = self.priority {
            request.priority = priority;
        }
        if let Some(notes) = &self.dev_notes {
            request.dev_notes = notes.clone();
        }
        if let Some(pinned) = self.pinned {
            request.pinned = pinned;
        }
        if let Some(synced) = self.synced {
            request.synced = synced;
        }
    }
}
