use crate::{CoreError, Result as CoreResult};

use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Category of organisational unit a role is scoped to.
///
/// Declaration order is the processing order used by the group reconciler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Organisation,
    Region,
    Project,
    Network,
    Corps,
    District,
    Group,
    Troop,
    Patrol,
}

impl RoleType {
    pub const ALL: [RoleType; 9] = [
        Self::Organisation,
        Self::Region,
        Self::Project,
        Self::Network,
        Self::Corps,
        Self::District,
        Self::Group,
        Self::Troop,
        Self::Patrol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organisation => "organisation",
            Self::Region => "region",
            Self::Project => "project",
            Self::Network => "network",
            Self::Corps => "corps",
            Self::District => "district",
            Self::Group => "group",
            Self::Troop => "troop",
            Self::Patrol => "patrol",
        }
    }
}

impl FromStr for RoleType {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|role_type| role_type.as_str() == s)
            .ok_or_else(|| CoreError::InvalidRoleType {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl std::fmt::Display for RoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
