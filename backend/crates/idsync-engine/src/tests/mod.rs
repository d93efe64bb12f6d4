mod retry;

use crate::SyncSettings;

use idsync_store::{IdentityStore, MemoryStore, StoreError, StoredGroup, StoredUser, UserBasics};

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

pub(crate) const PROFILE: &str = r#"{
    "member_no": 3169207,
    "first_name": "Anna",
    "last_name": "Öberg",
    "email": "anna@example.org",
    "dob": "1990-01-01",
    "last_login": "2026-10-01 08:15:00",
    "memberships": {
        "group": {
            "1001": {"is_primary": true, "group": {"name": "Forest Scouts", "group_no": 1001}}
        }
    },
    "contact_info": {
        "7": {"key": "registry-email", "value": "anna.oberg@registry.se"}
    }
}"#;

pub(crate) const ROLES: &str = r#"{
    "organisation": {"692": {"68": "board_member"}},
    "troop": {"5501": {"12": "leader"}},
    "district": []
}"#;

pub(crate) fn shared(store: &MemoryStore) -> Arc<dyn IdentityStore> {
    Arc::new(store.clone())
}

pub(crate) fn settings() -> SyncSettings {
    SyncSettings {
        format_version: "test-1".to_string(),
        ..SyncSettings::default()
    }
}

/// Subgroup names under any parent the user belongs to.
pub(crate) async fn subgroup_names(store: &MemoryStore, user_id: Uuid) -> Vec<String> {
    store
        .list_user_groups(user_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|g| !g.is_root())
        .map(|g| g.name)
        .collect()
}

pub(crate) async fn subgroup(store: &MemoryStore, parent: &str, name: &str) -> StoredGroup {
    let parent = store.find_root_group(parent).await.unwrap().unwrap();
    store.find_subgroup(parent.id, name).await.unwrap().unwrap()
}

/// Memory store that loses selected races against a concurrent writer once.
///
/// A claim listed with [`RacingStore::lose_next_claim`] fails as if another user
/// got there first. A group listed with [`RacingStore::lose_group_create`] is
/// created but the caller sees a conflict, as if a concurrent login created it.
pub(crate) struct RacingStore {
    inner: MemoryStore,
    lose_claim: AtomicBool,
    lose_creates: Mutex<HashSet<String>>,
}

impl RacingStore {
    pub(crate) fn new(inner: &MemoryStore) -> Self {
        Self {
            inner: inner.clone(),
            lose_claim: AtomicBool::new(false),
            lose_creates: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn lose_next_claim(self) -> Self {
        self.lose_claim.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn lose_group_create(self, name: &str) -> Self {
        self.lose_creates.lock().unwrap().insert(name.to_string());
        self
    }

    pub(crate) fn shared(self) -> Arc<dyn IdentityStore> {
        Arc::new(self)
    }
}

#[async_trait]
impl IdentityStore for RacingStore {
    async fn create_user(&self, username: &str) -> idsync_store::Result<StoredUser> {
        self.inner.create_user(username).await
    }

    async fn find_user_by_username(&self, username: &str) -> idsync_store::Result<Option<StoredUser>> {
        self.inner.find_user_by_username(username).await
    }

    async fn update_user_basics(&self, user_id: Uuid, basics: &UserBasics) -> idsync_store::Result<()> {
        self.inner.update_user_basics(user_id, basics).await
    }

    async fn get_user_attribute(&self, user_id: Uuid, name: &str) -> idsync_store::Result<Vec<String>> {
        self.inner.get_user_attribute(user_id, name).await
    }

    async fn list_user_attributes(
        &self,
        user_id: Uuid,
    ) -> idsync_store::Result<BTreeMap<String, Vec<String>>> {
        self.inner.list_user_attributes(user_id).await
    }

    async fn set_user_attribute(
        &self,
        user_id: Uuid,
        name: &str,
        values: &[String],
    ) -> idsync_store::Result<()> {
        self.inner.set_user_attribute(user_id, name, values).await
    }

    async fn remove_user_attribute(&self, user_id: Uuid, name: &str) -> idsync_store::Result<()> {
        self.inner.remove_user_attribute(user_id, name).await
    }

    async fn claim_unique_user_attribute(
        &self,
        user_id: Uuid,
        name: &str,
        value: &str,
    ) -> idsync_store::Result<()> {
        if self.lose_claim.swap(false, Ordering::SeqCst) {
            return Err(StoreError::conflict("user attribute", format!("{name}={value}")));
        }
        self.inner.claim_unique_user_attribute(user_id, name, value).await
    }

    async fn is_attribute_value_taken(
        &self,
        name: &str,
        value: &str,
        except_user: Uuid,
    ) -> idsync_store::Result<bool> {
        self.inner.is_attribute_value_taken(name, value, except_user).await
    }

    async fn create_group(&self, name: &str, parent_id: Option<Uuid>) -> idsync_store::Result<StoredGroup> {
        let group = self.inner.create_group(name, parent_id).await?;
        if self.lose_creates.lock().unwrap().remove(name) {
            return Err(StoreError::conflict("group", name));
        }
        Ok(group)
    }

    async fn find_root_group(&self, name: &str) -> idsync_store::Result<Option<StoredGroup>> {
        self.inner.find_root_group(name).await
    }

    async fn find_subgroup(&self, parent_id: Uuid, name: &str) -> idsync_store::Result<Option<StoredGroup>> {
        self.inner.find_subgroup(parent_id, name).await
    }

    async fn list_subgroups(&self, parent_id: Uuid) -> idsync_store::Result<Vec<StoredGroup>> {
        self.inner.list_subgroups(parent_id).await
    }

    async fn get_group_attribute(&self, group_id: Uuid, name: &str) -> idsync_store::Result<Vec<String>> {
        self.inner.get_group_attribute(group_id, name).await
    }

    async fn set_group_attribute(
        &self,
        group_id: Uuid,
        name: &str,
        values: &[String],
    ) -> idsync_store::Result<()> {
        self.inner.set_group_attribute(group_id, name, values).await
    }

    async fn join_group(&self, user_id: Uuid, group_id: Uuid) -> idsync_store::Result<()> {
        self.inner.join_group(user_id, group_id).await
    }

    async fn leave_group(&self, user_id: Uuid, group_id: Uuid) -> idsync_store::Result<()> {
        self.inner.leave_group(user_id, group_id).await
    }

    async fn list_user_groups(&self, user_id: Uuid) -> idsync_store::Result<Vec<StoredGroup>> {
        self.inner.list_user_groups(user_id).await
    }
}
