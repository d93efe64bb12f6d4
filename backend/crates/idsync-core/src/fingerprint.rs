use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Matches the login timestamp, which changes on every login and must not
/// affect the digest.
static VOLATILE_FIELDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#",?\s*"last_login"\s*:\s*"[^"]*""#).expect("volatile field pattern is valid")
});

const COMPONENT_SEPARATOR: [u8; 1] = [0x00];

/// One `(group, attribute, value)` triple read from a group the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrackedAttribute {
    pub group: String,
    pub attribute: String,
    pub value: String,
}

impl TrackedAttribute {
    pub fn new(
        group: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FingerprintInput<'a> {
    /// Bumped whenever derived attributes change so every user resyncs.
    pub format_version: &'a str,
    pub profile_payload: &'a str,
    pub roles_payload: Option<&'a str>,
    /// Only the length is hashed.
    pub image: Option<&'a [u8]>,
    pub tracked_attributes: &'a [TrackedAttribute],
}

/// Remove fields that change on every login from a raw profile payload.
pub fn strip_volatile_fields(payload: &str) -> Cow<'_, str> {
    VOLATILE_FIELDS.replace_all(payload, "")
}

/// Hex-encoded SHA-256 over every input that influences the synced state.
pub fn fingerprint(input: &FingerprintInput<'_>) -> String {
    let mut hasher = Sha256::new();

    hasher.update(input.format_version.as_bytes());
    hasher.update(COMPONENT_SEPARATOR);

    hasher.update(strip_volatile_fields(input.profile_payload).as_bytes());
    hasher.update(COMPONENT_SEPARATOR);

    if let Some(roles) = input.roles_payload {
        hasher.update(roles.as_bytes());
    }
    hasher.update(COMPONENT_SEPARATOR);

    if let Some(image) = input.image {
        hasher.update(image.len().to_string().as_bytes());
    }
    hasher.update(COMPONENT_SEPARATOR);

    let mut tracked: Vec<&TrackedAttribute> = input.tracked_attributes.iter().collect();
    tracked.sort();
    for attribute in tracked {
        hasher.update(
            format!(
                "{}:{}:{}",
                attribute.group, attribute.attribute, attribute.value
            )
            .as_bytes(),
        );
        hasher.update(COMPONENT_SEPARATOR);
    }

    hex::encode(hasher.finalize())
}
