//! Status transition targets
//!
//! Callers may only ask for a version to go ONLINE or OFFLINE. ERROR is
//! reached by failing a transition, never requested.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use common::error::Error;
use common::models::VersionStatus;

/// Status a caller may request for a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetStatus {
    /// Load the ensemble artifact
    Online,
    /// Unload the ensemble artifact
    Offline,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Online => "ONLINE",
            TargetStatus::Offline => "OFFLINE",
        }
    }

    /// Stored status after a successful transition
    pub fn settled(&self) -> VersionStatus {
        match self {
            TargetStatus::Online => VersionStatus::Online,
            TargetStatus::Offline => VersionStatus::Offline,
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetStatus {
    type Err = Error;

    /// Accepts exactly `ONLINE` or `OFFLINE`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(TargetStatus::Online),
            "OFFLINE" => Ok(TargetStatus::Offline),
            other => Err(Error::Validation(format!(
                "Wrong status value. Status should be ONLINE or OFFLINE, got '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<VersionStatus> for TargetStatus {
    type Error = Error;

    fn try_from(status: VersionStatus) -> Result<Self, Self::Error> {
        match status {
            VersionStatus::Online => Ok(TargetStatus::Online),
            VersionStatus::Offline => Ok(TargetStatus::Offline),
            VersionStatus::Error => Err(Error::Validation("ERROR cannot be requested".to_string())),
        }
    }
}
