use crate::Roles;

use std::collections::BTreeSet;

const WILDCARD: &str = "*";

/// Expand role assignments into `type:instance:role` permission strings.
///
/// Every assignment yields the exact string plus its type-wide and global
/// wildcards; every populated instance yields `type:instance:*` and every
/// populated role type `type:*:*`. Output is sorted and de-duplicated.
pub fn flatten_roles(roles: &Roles) -> Vec<String> {
    let mut permissions = BTreeSet::new();

    for (role_type, instances) in roles.iter() {
        let mut populated = false;

        for (instance_id, assigned) in instances {
            if assigned.is_empty() {
                continue;
            }
            populated = true;

            for role_name in assigned.values() {
                permissions.insert(format!("{role_type}:{instance_id}:{role_name}"));
                permissions.insert(format!("{role_type}:{WILDCARD}:{role_name}"));
                permissions.insert(format!("{WILDCARD}:{WILDCARD}:{role_name}"));
            }
            permissions.insert(format!("{role_type}:{instance_id}:{WILDCARD}"));
        }

        if populated {
            permissions.insert(format!("{role_type}:{WILDCARD}:{WILDCARD}"));
        }
    }

    permissions.into_iter().collect()
}
