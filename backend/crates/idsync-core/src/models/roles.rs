use crate::{CoreError, Result as CoreResult, RoleType};

use std::collections::BTreeMap;
use std::panic::Location;
use std::result::Result as StdResult;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Instance id -> (role id -> role name).
pub type RoleAssignments = BTreeMap<String, BTreeMap<String, String>>;

/// Role assignments grouped by role type.
///
/// Reads the registry's loose JSON shape: empty levels may arrive as `[]`,
/// unknown role types are ignored and numeric role names are stringified.
/// Any other shape is rejected so callers can treat the document as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    by_type: BTreeMap<RoleType, RoleAssignments>,
}

impl Roles {
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    pub fn parse(payload: &str) -> CoreResult<Self> {
        serde_json::from_str(payload).map_err(|source| CoreError::MalformedPayload {
            payload: "roles",
            source,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Build roles from an already-parsed document.
    ///
    /// Fails when the document or a known role type has the wrong shape; unknown
    /// role types are skipped without inspection.
    pub fn from_value(value: &Value) -> StdResult<Self, String> {
        let mut roles = Self::new();
        let Some(types) = object_or_empty(value) else {
            return Err(format!("expected an object of role types, found {}", kind(value)));
        };

        for (type_key, instances) in types.into_iter().flatten() {
            let Ok(role_type) = RoleType::from_str(type_key) else {
                continue;
            };
            let Some(instances) = object_or_empty(instances) else {
                return Err(format!("{type_key}: expected an object, found {}", kind(instances)));
            };

            let mut assignments = RoleAssignments::new();
            for (instance_id, assigned) in instances.into_iter().flatten() {
                let Some(assigned) = object_or_empty(assigned) else {
                    return Err(format!(
                        "{type_key}.{instance_id}: expected an object, found {}",
                        kind(assigned)
                    ));
                };
                assignments.insert(instance_id.clone(), role_names(assigned));
            }

            if !assignments.is_empty() {
                roles.by_type.insert(role_type, assignments);
            }
        }

        Ok(roles)
    }

    /// Builder used by callers assembling roles by hand.
    pub fn with_role(
        mut self,
        role_type: RoleType,
        instance_id: impl Into<String>,
        role_id: impl Into<String>,
        role_name: impl Into<String>,
    ) -> Self {
        self.by_type
            .entry(role_type)
            .or_default()
            .entry(instance_id.into())
            .or_default()
            .insert(role_id.into(), role_name.into());
        self
    }

    pub fn get(&self, role_type: RoleType) -> Option<&RoleAssignments> {
        self.by_type.get(&role_type)
    }

    /// Role types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (RoleType, &RoleAssignments)> {
        self.by_type.iter().map(|(role_type, a)| (*role_type, a))
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl<'de> Deserialize<'de> for Roles {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(D::Error::custom)
    }
}

/// `Some(None)` for the registry's `[]` placeholder, `None` for any other non-object.
fn object_or_empty(value: &Value) -> Option<Option<&Map<String, Value>>> {
    match value {
        Value::Object(map) => Some(Some(map)),
        Value::Array(items) if items.is_empty() => Some(None),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn role_names(assigned: Option<&Map<String, Value>>) -> BTreeMap<String, String> {
    assigned
        .into_iter()
        .flatten()
        .filter_map(|(role_id, name)| {
            let name = match name {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((role_id.clone(), name))
        })
        .collect()
}
