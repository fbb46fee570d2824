//! Resource (venue / equipment) domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CampusError, CampusResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Venue,
    MusicInstruments,
    Projector,
    Chairs,
    Tables,
    Microphone,
    Speakers,
    Other,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Venue => "venue",
            ResourceKind::MusicInstruments => "music_instruments",
            ResourceKind::Projector => "projector",
            ResourceKind::Chairs => "chairs",
            ResourceKind::Tables => "tables",
            ResourceKind::Microphone => "microphone",
            ResourceKind::Speakers => "speakers",
            ResourceKind::Other => "other",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "venue" => Ok(ResourceKind::Venue),
            "music_instruments" => Ok(ResourceKind::MusicInstruments),
            "projector" => Ok(ResourceKind::Projector),
            "chairs" => Ok(ResourceKind::Chairs),
            "tables" => Ok(ResourceKind::Tables),
            "microphone" => Ok(ResourceKind::Microphone),
            "speakers" => Ok(ResourceKind::Speakers),
            "other" => Ok(ResourceKind::Other),
            other => Err(CampusError::validation(format!(
                "unknown resource kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub kind: ResourceKind,
    pub description: Option<String>,
    /// Building or room, for venues.
    pub location: Option<String>,
    pub capacity: Option<u32>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceFields {
    pub name: String,
    pub kind: ResourceKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl ResourceFields {
    pub fn validate(&self) -> CampusResult<()> {
        if self.name.trim().is_empty() {
            return Err(CampusError::validation("resource name must not be empty"));
        }
        if self.capacity == Some(0) {
            return Err(CampusError::validation(
                "resource capacity must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_storage_names() {
        for kind in [
            ResourceKind::Venue,
            ResourceKind::MusicInstruments,
            ResourceKind::Projector,
            ResourceKind::Chairs,
            ResourceKind::Tables,
            ResourceKind::Microphone,
            ResourceKind::Speakers,
            ResourceKind::Other,
        ] {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn availability_defaults_to_true() {
        let fields: ResourceFields =
            serde_json::from_str(r#"{"name": "Main Hall", "kind": "venue"}"#).unwrap();
        assert!(fields.is_available);
        assert!(fields.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let fields = ResourceFields {
            name: "Projector A".into(),
            kind: ResourceKind::Projector,
            description: None,
            location: None,
            capacity: Some(0),
            is_available: true,
        };
        assert!(fields.validate().is_err());
    }
}
