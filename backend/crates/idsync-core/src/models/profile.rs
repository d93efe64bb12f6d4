use crate::models::lenient;
use crate::name_normalizer::first_last;
use crate::{CoreError, Result as CoreResult};

use std::collections::BTreeMap;
use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Member profile as returned by the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub member_no: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub addresses: Option<BTreeMap<String, Address>>,
    #[serde(default, deserialize_with = "lenient")]
    pub memberships: Option<Memberships>,
    #[serde(default, deserialize_with = "lenient")]
    pub contact_info: Option<BTreeMap<String, ContactEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Memberships {
    /// Keyed by membership key, which is also the local group name.
    #[serde(default, deserialize_with = "lenient")]
    pub group: Option<BTreeMap<String, GroupMembership>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupMembership {
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub group: Option<RegistryGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group_no: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactEntry {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl Profile {
    #[track_caller]
    pub fn parse(payload: &str) -> CoreResult<Self> {
        serde_json::from_str(payload).map_err(|source| CoreError::MalformedPayload {
            payload: "profile",
            source,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Membership map, empty when the registry sent none.
    pub fn group_memberships(&self) -> impl Iterator<Item = (&String, &GroupMembership)> {
        self.memberships
            .iter()
            .filter_map(|m| m.group.as_ref())
            .flat_map(|groups| groups.iter())
    }

    pub fn has_memberships(&self) -> bool {
        self.memberships
            .as_ref()
            .is_some_and(|m| m.group.is_some())
    }

    /// First membership flagged primary, in membership-key order.
    pub fn primary_membership(&self) -> Option<(&String, &GroupMembership)> {
        self.group_memberships().find(|(_, m)| m.is_primary)
    }

    /// Non-blank display name of the registry group behind a membership key.
    pub fn group_display_name(&self, membership_key: &str) -> Option<&str> {
        self.group_memberships()
            .find(|(key, _)| key.as_str() == membership_key)
            .and_then(|(_, m)| m.group.as_ref())
            .and_then(|g| g.name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }

    /// String value of the contact entry with the given key.
    pub fn contact_value(&self, key: &str) -> Option<&str> {
        self.contact_info
            .iter()
            .flat_map(|entries| entries.values())
            .find(|entry| entry.key.as_deref() == Some(key))
            .and_then(|entry| entry.value.as_ref())
            .and_then(|value| value.as_str())
    }

    /// Synthetic address for systems that require an email per user.
    pub fn local_email(&self, domain: &str) -> String {
        format!("{}@{}", self.member_no, domain)
    }

    pub fn first_last(&self) -> Option<String> {
        first_last(self.first_name.as_deref(), self.last_name.as_deref())
    }
}
