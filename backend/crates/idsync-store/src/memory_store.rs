use crate::{IdentityStore, Result, StoreError, StoredGroup, StoredUser, UserBasics};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, StoredUser>,
    user_attributes: HashMap<Uuid, BTreeMap<String, Vec<String>>>,
    claims: HashMap<(String, String), Uuid>,
    groups: HashMap<Uuid, StoredGroup>,
    group_attributes: HashMap<Uuid, BTreeMap<String, Vec<String>>>,
    memberships: HashSet<(Uuid, Uuid)>,
}

impl MemoryState {
    fn require_user(&self, user_id: Uuid) -> Result<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StoreError::not_found("user", user_id.to_string()))
        }
    }

    fn require_group(&self, group_id: Uuid) -> Result<()> {
        if self.groups.contains_key(&group_id) {
            Ok(())
        } else {
            Err(StoreError::not_found("group", group_id.to_string()))
        }
    }

    fn release_claims(&mut self, user_id: Uuid, name: &str) {
        self.claims
            .retain(|(claim_name, _), holder| !(claim_name == name && *holder == user_id));
    }

    fn sorted_groups<'a>(groups: impl Iterator<Item = &'a StoredGroup>) -> Vec<StoredGroup> {
        let mut groups: Vec<StoredGroup> = groups.cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }
}

/// In-process store for tests and embedding.
///
/// Clones share state. Every mutating call bumps a write counter so callers can
/// assert that an operation was a no-op.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    writes: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating calls made so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_user(&self, username: &str) -> Result<StoredUser> {
        self.record_write();
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == username) {
            return Err(StoreError::conflict("user", username));
        }

        let user = StoredUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            first_name: None,
            last_name: None,
            email: None,
            enabled: true,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<StoredUser>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user_basics(&self, user_id: Uuid, basics: &UserBasics) -> Result<()> {
        self.record_write();
        let mut state = self.state.write().await;

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::not_found("user", user_id.to_string()))?;
        user.first_name = basics.first_name.clone();
        user.last_name = basics.last_name.clone();
        user.email = basics.email.clone();
        Ok(())
    }

    async fn get_user_attribute(&self, user_id: Uuid, name: &str) -> Result<Vec<String>> {
        let state = self.state.read().await;
        state.require_user(user_id)?;
        Ok(state
            .user_attributes
            .get(&user_id)
            .and_then(|attributes| attributes.get(name))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_user_attributes(&self, user_id: Uuid) -> Result<BTreeMap<String, Vec<String>>> {
        let state = self.state.read().await;
        state.require_user(user_id)?;
        Ok(state
            .user_attributes
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_user_attribute(
        &self,
        user_id: Uuid,
        name: &str,
        values: &[String],
    ) -> Result<()> {
        self.record_write();
        let mut state = self.state.write().await;
        state.require_user(user_id)?;

        state.release_claims(user_id, name);
        let attributes = state.user_attributes.entry(user_id).or_default();
        if values.is_empty() {
            attributes.remove(name);
        } else {
            attributes.insert(name.to_string(), values.to_vec());
        }
        Ok(())
    }

    async fn remove_user_attribute(&self, user_id: Uuid, name: &str) -> Result<()> {
        self.record_write();
        let mut state = self.state.write().await;
        state.require_user(user_id)?;

        state.release_claims(user_id, name);
        if let Some(attributes) = state.user_attributes.get_mut(&user_id) {
            attributes.remove(name);
        }
        Ok(())
    }

    async fn claim_unique_user_attribute(
        &self,
        user_id: Uuid,
        name: &str,
        value: &str,
    ) -> Result<()> {
        self.record_write();
        let mut state = self.state.write().await;
        state.require_user(user_id)?;

        let key = (name.to_string(), value.to_string());
        if let Some(holder) = state.claims.get(&key)
            && *holder != user_id
        {
            return Err(StoreError::conflict("user_attribute_claim", format!("{name}={value}")));
        }

        state.release_claims(user_id, name);
        state.claims.insert(key, user_id);
        state
            .user_attributes
            .entry(user_id)
            .or_default()
            .insert(name.to_string(), vec![value.to_string()]);
        Ok(())
    }

    async fn is_attribute_value_taken(
        &self,
        name: &str,
        value: &str,
        except_user: Uuid,
    ) -> Result<bool> {
        let state = self.state.read().await;

        let claimed = state
            .claims
            .get(&(name.to_string(), value.to_string()))
            .is_some_and(|holder| *holder != except_user);
        let held = state.user_attributes.iter().any(|(user_id, attributes)| {
            *user_id != except_user
                && attributes
                    .get(name)
                    .is_some_and(|values| values.iter().any(|v| v == value))
        });

        Ok(claimed || held)
    }

    async fn create_group(&self, name: &str, parent_id: Option<Uuid>) -> Result<StoredGroup> {
        self.record_write();
        let mut state = self.state.write().await;

        if let Some(parent_id) = parent_id {
            state.require_group(parent_id)?;
        }
        if state
            .groups
            .values()
            .any(|g| g.parent_id == parent_id && g.name == name)
        {
            return Err(StoreError::conflict("group", name));
        }

        let group = StoredGroup {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id,
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_root_group(&self, name: &str) -> Result<Option<StoredGroup>> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .values()
            .find(|g| g.is_root() && g.name == name)
            .cloned())
    }

    async fn find_subgroup(&self, parent_id: Uuid, name: &str) -> Result<Option<StoredGroup>> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .values()
            .find(|g| g.parent_id == Some(parent_id) && g.name == name)
            .cloned())
    }

    async fn list_subgroups(&self, parent_id: Uuid) -> Result<Vec<StoredGroup>> {
        let state = self.state.read().await;
        Ok(MemoryState::sorted_groups(
            state
                .groups
                .values()
                .filter(|g| g.parent_id == Some(parent_id)),
        ))
    }

    async fn get_group_attribute(&self, group_id: Uuid, name: &str) -> Result<Vec<String>> {
        let state = self.state.read().await;
        state.require_group(group_id)?;
        Ok(state
            .group_attributes
            .get(&group_id)
            .and_then(|attributes| attributes.get(name))
            .cloned()
            .unwrap_or_default())
    }

    async fn set_group_attribute(
        &self,
        group_id: Uuid,
        name: &str,
        values: &[String],
    ) -> Result<()> {
        self.record_write();
        let mut state = self.state.write().await;
        state.require_group(group_id)?;

        let attributes = state.group_attributes.entry(group_id).or_default();
        if values.is_empty() {
            attributes.remove(name);
        } else {
            attributes.insert(name.to_string(), values.to_vec());
        }
        Ok(())
    }

    async fn join_group(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
        self.record_write();
        let mut state = self.state.write().await;
        state.require_user(user_id)?;
        state.require_group(group_id)?;

        state.memberships.insert((user_id, group_id));
        Ok(())
    }

    async fn leave_group(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
        self.record_write();
        let mut state = self.state.write().await;

        state.memberships.remove(&(user_id, group_id));
        Ok(())
    }

    async fn list_user_groups(&self, user_id: Uuid) -> Result<Vec<StoredGroup>> {
        let state = self.state.read().await;
        state.require_user(user_id)?;
        Ok(MemoryState::sorted_groups(
            state
                .memberships
                .iter()
                .filter(|(member, _)| *member == user_id)
                .filter_map(|(_, group_id)| state.groups.get(group_id)),
        ))
    }
}
