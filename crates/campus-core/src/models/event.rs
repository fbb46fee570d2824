//! Event domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CampusError, CampusResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "rejected" => Ok(EventStatus::Rejected),
            other => Err(CampusError::validation(format!(
                "unknown event status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub venue_id: Option<Uuid>,
    /// Free-text request for equipment or services.
    pub resources_needed: Option<String>,
    pub organizer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `None` means unbounded.
    pub max_participants: Option<u32>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_organized_by(&self, account_id: Uuid) -> bool {
        self.organizer_id == account_id
    }
}

/// The editable content of an event.
///
/// Status and organizer are deliberately absent: a payload carrying
/// them has those fields ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventFields {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub venue_id: Option<Uuid>,
    #[serde(default)]
    pub resources_needed: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub max_participants: Option<u32>,
}

impl EventFields {
    /// Checks the content rules that do not need storage.
    pub fn validate(&self) -> CampusResult<()> {
        if self.title.trim().is_empty() {
            return Err(CampusError::validation("event title must not be empty"));
        }
        if self.start_time >= self.end_time {
            return Err(CampusError::InvalidSchedule);
        }
        if self.max_participants == Some(0) {
            return Err(CampusError::validation(
                "max_participants must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

/// Read filter for event listings. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub organizer_id: Option<Uuid>,
    /// Inclusive lower bound on `start_time`.
    pub starts_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `start_time`.
    pub starts_before: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn organized_by(mut self, organizer_id: Uuid) -> Self {
        self.organizer_id = Some(organizer_id);
        self
    }

    pub fn starting_from(mut self, from: DateTime<Utc>) -> Self {
        self.starts_after = Some(from);
        self
    }

    pub fn starting_before(mut self, until: DateTime<Utc>) -> Self {
        self.starts_before = Some(until);
        self
    }
}

/// Number of events in each review state.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct EventStatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

impl EventStatusCounts {
    pub fn add(&mut self, status: EventStatus, count: u64) {
        match status {
            EventStatus::Pending => self.pending += count,
            EventStatus::Approved => self.approved += count,
            EventStatus::Rejected => self.rejected += count,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.approved + self.rejected
    }
}

/// An event joined with the display data listings need.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event: Event,
    pub organizer_name: Option<String>,
    pub venue_name: Option<String>,
    pub registered: u64,
}
