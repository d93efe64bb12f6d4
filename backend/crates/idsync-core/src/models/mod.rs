pub mod auth_response;
pub mod profile;
pub mod role_type;
pub mod roles;

use serde::{Deserialize, Deserializer, de::IgnoredAny};

#[derive(Deserialize)]
#[serde(untagged)]
enum ArrayOr<T> {
    Array(#[allow(dead_code)] Vec<IgnoredAny>),
    Value(T),
}

/// Deserialize an optional JSON object, reading `null` or an array as absent.
///
/// The registry serializes empty objects as `[]`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<ArrayOr<T>>::deserialize(deserializer)? {
        Some(ArrayOr::Value(value)) => Some(value),
        Some(ArrayOr::Array(_)) | None => None,
    })
}
