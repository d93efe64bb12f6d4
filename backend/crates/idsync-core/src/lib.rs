pub mod clock;
pub mod error;
pub mod fingerprint;
pub mod login_identifier;
pub mod models;
pub mod name_normalizer;
pub mod role_flattener;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, Result};
pub use error_location::ErrorLocation;
pub use fingerprint::{FingerprintInput, TrackedAttribute, fingerprint, strip_volatile_fields};
pub use login_identifier::normalize_login_identifier;
pub use models::auth_response::{AuthResponse, Member};
pub use models::profile::{Address, ContactEntry, GroupMembership, Memberships, Profile, RegistryGroup};
pub use models::role_type::RoleType;
pub use models::roles::{RoleAssignments, Roles};
pub use name_normalizer::{first_last, normalize_name};
pub use role_flattener::flatten_roles;

#[cfg(test)]
mod tests;
