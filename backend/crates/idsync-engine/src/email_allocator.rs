use crate::attribute_names::{DOMAIN, GROUP_EMAIL_PREFIX, group_email};
use crate::{Result, SyncError};

use idsync_store::IdentityStore;

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, warn};
use uuid::Uuid;

const MIN_DOMAIN_LENGTH: usize = 4;
const FORBIDDEN_DOMAIN_CHARS: [char; 3] = ['/', ' ', ':'];

/// Whether a group's `domain` attribute can carry mail aliases.
pub fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.trim();
    domain.len() >= MIN_DOMAIN_LENGTH
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains(FORBIDDEN_DOMAIN_CHARS)
}

/// Allocates per-group email aliases `token[N]@domain`, unique per attribute name.
pub struct EmailAllocator {
    store: Arc<dyn IdentityStore>,
    max_attempts: u32,
}

impl EmailAllocator {
    pub fn new(store: Arc<dyn IdentityStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    /// Give the user a unique alias for `token` on `domain` under `attribute`.
    ///
    /// An alias the user already holds for the same token and domain is kept as
    /// long as nobody else holds it. Otherwise candidates `token`, `token1`,
    /// `token2`, ... are claimed in turn until one succeeds.
    pub async fn allocate(
        &self,
        user_id: Uuid,
        attribute: &str,
        token: &str,
        domain: &str,
    ) -> Result<String> {
        let domain = domain.trim();

        if let Some(current) = self
            .store
            .get_user_attribute(user_id, attribute)
            .await?
            .into_iter()
            .next()
            && is_alias_of(&current, token, domain)
            && !self
                .store
                .is_attribute_value_taken(attribute, &current, user_id)
                .await?
        {
            return Ok(current);
        }

        for suffix in 0..self.max_attempts {
            let candidate = if suffix == 0 {
                format!("{token}@{domain}")
            } else {
                format!("{token}{suffix}@{domain}")
            };

            if self
                .store
                .is_attribute_value_taken(attribute, &candidate, user_id)
                .await?
            {
                continue;
            }

            match self
                .store
                .claim_unique_user_attribute(user_id, attribute, &candidate)
                .await
            {
                Ok(()) => return Ok(candidate),
                Err(e) if e.is_conflict() => {
                    debug!("Alias {candidate} claimed concurrently, trying next suffix");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SyncError::alias_space_exhausted(attribute, self.max_attempts))
    }

    /// Recompute every `group_email_*` attribute of the user.
    ///
    /// Each group the user belongs to with a valid `domain` gets an alias; aliases
    /// for groups the user left or whose domain is unset are removed. Without a
    /// name token every alias is removed. Returns the attributes now holding an alias.
    pub async fn sync_group_emails(
        &self,
        user_id: Uuid,
        token: Option<&str>,
        correlation_id: &str,
    ) -> Result<Vec<String>> {
        let existing: BTreeSet<String> = self
            .store
            .list_user_attributes(user_id)
            .await?
            .into_keys()
            .filter(|name| name.starts_with(GROUP_EMAIL_PREFIX))
            .collect();

        let mut allocated = BTreeSet::new();

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            for group in self.store.list_user_groups(user_id).await? {
                let domain = self.store.get_group_attribute(group.id, DOMAIN).await?;
                let Some(domain) = domain.first().filter(|d| is_valid_domain(d)) else {
                    continue;
                };

                let attribute = group_email(&group.name);
                let alias = self.allocate(user_id, &attribute, token, domain).await?;
                debug!("[{correlation_id}] {attribute} = {alias}");
                allocated.insert(attribute);
            }
        } else if !existing.is_empty() {
            warn!("[{correlation_id}] No name token, removing {} group aliases", existing.len());
        }

        for stale in existing.difference(&allocated) {
            self.store.remove_user_attribute(user_id, stale).await?;
        }

        Ok(allocated.into_iter().collect())
    }
}

/// `alias` is `token` plus an optional numeric suffix at `domain`.
fn is_alias_of(alias: &str, token: &str, domain: &str) -> bool {
    let Some((local, alias_domain)) = alias.rsplit_once('@') else {
        return false;
    };

    alias_domain == domain
        && local
            .strip_prefix(token)
            .is_some_and(|suffix| suffix.bytes().all(|b| b.is_ascii_digit()))
}

