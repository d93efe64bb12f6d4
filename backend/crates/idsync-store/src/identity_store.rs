use crate::{Result, StoredGroup, StoredUser, UserBasics};

use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

/// Key-value attribute store holding local users and their group graph.
///
/// Attributes are multi-valued and ordered; an empty value list means the
/// attribute is absent. Writes that would break a uniqueness rule fail with
/// [`StoreError::Conflict`](crate::StoreError::Conflict) so callers can re-check
/// and retry.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create an enabled user. Conflicts when the username is taken.
    async fn create_user(&self, username: &str) -> Result<StoredUser>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<StoredUser>>;

    async fn update_user_basics(&self, user_id: Uuid, basics: &UserBasics) -> Result<()>;

    async fn get_user_attribute(&self, user_id: Uuid, name: &str) -> Result<Vec<String>>;

    async fn list_user_attributes(&self, user_id: Uuid) -> Result<BTreeMap<String, Vec<String>>>;

    /// Replace all values of an attribute. Releases any claim the user held on it.
    async fn set_user_attribute(&self, user_id: Uuid, name: &str, values: &[String])
    -> Result<()>;

    async fn remove_user_attribute(&self, user_id: Uuid, name: &str) -> Result<()>;

    /// Set `name` to the single `value` and reserve `(name, value)` for this user.
    ///
    /// Conflicts when another user already holds the claim. Re-claiming a value the
    /// user already holds succeeds; the user's previous claim on `name` is released.
    async fn claim_unique_user_attribute(&self, user_id: Uuid, name: &str, value: &str)
    -> Result<()>;

    /// Whether any user other than `except_user` has `value` among the values of `name`.
    async fn is_attribute_value_taken(
        &self,
        name: &str,
        value: &str,
        except_user: Uuid,
    ) -> Result<bool>;

    /// Create a group. Conflicts when a sibling with the same name exists.
    async fn create_group(&self, name: &str, parent_id: Option<Uuid>) -> Result<StoredGroup>;

    async fn find_root_group(&self, name: &str) -> Result<Option<StoredGroup>>;

    async fn find_subgroup(&self, parent_id: Uuid, name: &str) -> Result<Option<StoredGroup>>;

    async fn list_subgroups(&self, parent_id: Uuid) -> Result<Vec<StoredGroup>>;

    async fn get_group_attribute(&self, group_id: Uuid, name: &str) -> Result<Vec<String>>;

    async fn set_group_attribute(&self, group_id: Uuid, name: &str, values: &[String])
    -> Result<()>;

    /// Idempotent.
    async fn join_group(&self, user_id: Uuid, group_id: Uuid) -> Result<()>;

    /// Idempotent.
    async fn leave_group(&self, user_id: Uuid, group_id: Uuid) -> Result<()>;

    /// Groups the user belongs to, ordered by name.
    async fn list_user_groups(&self, user_id: Uuid) -> Result<Vec<StoredGroup>>;
}
