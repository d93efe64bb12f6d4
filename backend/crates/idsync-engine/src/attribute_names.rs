// User attributes
pub const MEMBER_NO: &str = "member_no";
pub const DATE_OF_BIRTH: &str = "dob";
pub const LOCAL_EMAIL: &str = "local_email";
pub const FIRST_LAST: &str = "firstlast";
pub const GROUP_EMAIL_PREFIX: &str = "group_email_";
pub const REGISTRY_EMAIL: &str = "registry_email";
pub const PICTURE: &str = "picture";
pub const ROLES: &str = "roles";
pub const PRIMARY_GROUP_NAME: &str = "primary_group_name";
pub const PRIMARY_GROUP_NO: &str = "primary_group_no";
pub const PROFILE_HASH: &str = "profile_hash";

// Group attributes
pub const GROUP_TYPE: &str = "registry_type";
pub const GROUP_DISPLAY_NAME: &str = "registry_name";
pub const DOMAIN: &str = "domain";

/// Type tag for groups that come from profile memberships
pub const MEMBERSHIP_GROUP_TYPE: &str = "group";

pub fn group_email(group_name: &str) -> String {
    format!("{GROUP_EMAIL_PREFIX}{group_name}")
}
