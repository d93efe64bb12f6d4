use crate::attribute_names::{GROUP_DISPLAY_NAME, GROUP_TYPE, MEMBERSHIP_GROUP_TYPE};
use crate::{Result, SyncError, retry_on_conflict};

use idsync_core::{Profile, Roles};
use idsync_store::{IdentityStore, StoredGroup};

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;
use uuid::Uuid;

/// A subgroup the user should belong to after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Instance id or membership key; also the local subgroup name
    pub name: String,
    pub type_tag: String,
    pub display_name: Option<String>,
}

/// Build the target set from roles and memberships.
///
/// Returns `None` when neither source is available, in which case group sync must
/// be skipped. When roles were expected but could not be read, callers should use
/// [`GroupReconciler::reconcile_keeping_existing`] so role groups are not pruned.
/// An id present under several sources takes the tag of the last one, in role
/// type order followed by memberships.
pub fn sync_targets(profile: &Profile, roles: Option<&Roles>) -> Option<Vec<SyncTarget>> {
    if roles.is_none() && !profile.has_memberships() {
        return None;
    }

    let mut targets: BTreeMap<String, SyncTarget> = BTreeMap::new();
    let mut add = |name: &str, type_tag: &str| {
        targets.insert(
            name.to_string(),
            SyncTarget {
                name: name.to_string(),
                type_tag: type_tag.to_string(),
                display_name: profile.group_display_name(name).map(String::from),
            },
        );
    };

    for (role_type, instances) in roles.into_iter().flat_map(|roles| roles.iter()) {
        for instance_id in instances.keys() {
            add(instance_id, role_type.as_str());
        }
    }
    for (membership_key, _) in profile.group_memberships() {
        add(membership_key, MEMBERSHIP_GROUP_TYPE);
    }

    Some(targets.into_values().collect())
}

/// Writes performed by one reconciliation pass, by group name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub attributed: Vec<String>,
    pub joined: Vec<String>,
    pub left: Vec<String>,
    pub migrated: Vec<String>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.attributed.is_empty()
            && self.joined.is_empty()
            && self.left.is_empty()
            && self.migrated.is_empty()
    }
}

/// Makes the user's memberships under the namespace parent match a target set.
pub struct GroupReconciler {
    store: Arc<dyn IdentityStore>,
    parent_group: String,
    tracked_attributes: Vec<String>,
    conflict_retries: u32,
}

impl GroupReconciler {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        parent_group: impl Into<String>,
        tracked_attributes: Vec<String>,
        conflict_retries: u32,
    ) -> Self {
        Self {
            store,
            parent_group: parent_group.into(),
            tracked_attributes,
            conflict_retries,
        }
    }

    /// Join every target and leave subgroups of the parent that are not targets.
    pub async fn reconcile(
        &self,
        user_id: Uuid,
        targets: &[SyncTarget],
        correlation_id: &str,
    ) -> Result<ReconcileReport> {
        self.reconcile_targets(user_id, targets, true, correlation_id)
            .await
    }

    /// Join every target without leaving anything, for passes built from partial data.
    pub async fn reconcile_keeping_existing(
        &self,
        user_id: Uuid,
        targets: &[SyncTarget],
        correlation_id: &str,
    ) -> Result<ReconcileReport> {
        self.reconcile_targets(user_id, targets, false, correlation_id)
            .await
    }

    async fn reconcile_targets(
        &self,
        user_id: Uuid,
        targets: &[SyncTarget],
        prune: bool,
        correlation_id: &str,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let parent = self.ensure_parent_group(&mut report).await?;
        let current_groups = self.store.list_user_groups(user_id).await?;
        let member_of: HashSet<Uuid> = current_groups.iter().map(|g| g.id).collect();

        self.migrate_legacy_root_groups(user_id, &current_groups, &mut report, correlation_id)
            .await?;

        if !member_of.contains(&parent.id) {
            self.store.join_group(user_id, parent.id).await?;
            report.joined.push(parent.name.clone());
            debug!("[{correlation_id}] Joined parent group {}", parent.name);
        }

        for target in targets {
            let (group, created) = self.find_or_create_subgroup(parent.id, &target.name).await?;
            if created {
                report.created.push(group.name.clone());
                debug!("[{correlation_id}] Created subgroup {}", group.name);
            }

            if self.apply_attributes(&group, target).await? {
                report.attributed.push(group.name.clone());
            }

            if !member_of.contains(&group.id) {
                self.store.join_group(user_id, group.id).await?;
                report.joined.push(group.name.clone());
                debug!(
                    "[{correlation_id}] Joined {} group {}",
                    target.type_tag, group.name
                );
            }
        }

        if !prune {
            return Ok(report);
        }

        let target_names: HashSet<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        for group in current_groups
            .iter()
            .filter(|g| g.parent_id == Some(parent.id))
            .filter(|g| !target_names.contains(g.name.as_str()))
        {
            self.store.leave_group(user_id, group.id).await?;
            report.left.push(group.name.clone());
            debug!("[{correlation_id}] Left group {}", group.name);
        }

        Ok(report)
    }

    async fn ensure_parent_group(&self, report: &mut ReconcileReport) -> Result<StoredGroup> {
        let store = self.store.as_ref();
        let name = self.parent_group.as_str();

        let (group, created) = retry_on_conflict(self.conflict_retries, "create parent group", move || async move {
            if let Some(group) = store.find_root_group(name).await? {
                return Ok::<_, SyncError>((group, false));
            }
            Ok((store.create_group(name, None).await?, true))
        })
        .await?;

        if created {
            info!("Created parent group: {name}");
            report.created.push(group.name.clone());
        }
        Ok(group)
    }

    async fn find_or_create_subgroup(
        &self,
        parent_id: Uuid,
        name: &str,
    ) -> Result<(StoredGroup, bool)> {
        let store = self.store.as_ref();

        retry_on_conflict(self.conflict_retries, "create subgroup", move || async move {
            if let Some(group) = store.find_subgroup(parent_id, name).await? {
                return Ok::<_, SyncError>((group, false));
            }
            Ok((store.create_group(name, Some(parent_id)).await?, true))
        })
        .await
    }

    /// Leave root-level groups from the pre-namespace layout. Empty after the first run.
    async fn migrate_legacy_root_groups(
        &self,
        user_id: Uuid,
        current_groups: &[StoredGroup],
        report: &mut ReconcileReport,
        correlation_id: &str,
    ) -> Result<()> {
        for group in current_groups
            .iter()
            .filter(|g| g.is_root() && g.name != self.parent_group)
        {
            let type_tag = self.store.get_group_attribute(group.id, GROUP_TYPE).await?;
            if type_tag.is_empty() {
                continue;
            }

            self.store.leave_group(user_id, group.id).await?;
            report.migrated.push(group.name.clone());
            info!("[{correlation_id}] Migrated user out of root group {}", group.name);
        }
        Ok(())
    }

    /// Returns whether anything was written.
    async fn apply_attributes(&self, group: &StoredGroup, target: &SyncTarget) -> Result<bool> {
        let mut changed = false;

        let current_type = self.store.get_group_attribute(group.id, GROUP_TYPE).await?;
        if current_type != [target.type_tag.as_str()] {
            self.store
                .set_group_attribute(group.id, GROUP_TYPE, &[target.type_tag.clone()])
                .await?;
            changed = true;
        }

        if let Some(display_name) = target
            .display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
        {
            let current = self
                .store
                .get_group_attribute(group.id, GROUP_DISPLAY_NAME)
                .await?;
            if current.first().map(String::as_str) != Some(display_name) {
                self.store
                    .set_group_attribute(group.id, GROUP_DISPLAY_NAME, &[display_name.to_string()])
                    .await?;
                changed = true;
            }
        }

        // Tracked attributes are edited by administrators; only seed them.
        for attribute in &self.tracked_attributes {
            if self
                .store
                .get_group_attribute(group.id, attribute)
                .await?
                .is_empty()
            {
                self.store
                    .set_group_attribute(group.id, attribute, &[String::new()])
                    .await?;
                changed = true;
            }
        }

        Ok(changed)
    }
}
