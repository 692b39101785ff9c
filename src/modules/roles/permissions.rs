//! Permission resolution.
//!
//! A user's effective permissions are a pure fold over their role grants:
//! start empty, union in each base role's default set, then union in the
//! permission list of every *active* custom role referenced by a grant.
//! Inactive custom roles contribute nothing. Permissions only ever add up;
//! there is no negation.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::hierarchy::{self, DisplayRole};
use super::model::{BaseRole, Permission, RoleGrant};

/// Hard-coded default permission sets per base role.
pub fn default_permissions(role: BaseRole) -> &'static [Permission] {
    match role {
        BaseRole::Admin => &Permission::ALL,
        BaseRole::Teacher => &[
            Permission::ManageStudyHalls,
            Permission::VerifyEntries,
            Permission::ManageDiscussions,
        ],
        BaseRole::Counselor => &[Permission::VerifyEntries, Permission::ViewAnalytics],
        BaseRole::Student => &[],
    }
}

/// The outcome of resolving a user's grants. Cached per user and embedded
/// in JWT claims as a login-time snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResolvedPermissions {
    pub permissions: BTreeSet<Permission>,
    /// Base-role slugs in first-seen order, deduplicated.
    pub roles: Vec<BaseRole>,
    pub is_admin: bool,
    pub is_verifier: bool,
    pub priority: i32,
    pub display_role: Option<DisplayRole>,
}

impl ResolvedPermissions {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// True if the user holds at least one of the given permissions.
    /// An empty list yields false.
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.permissions.contains(p))
    }

    /// True if the user holds every one of the given permissions.
    /// An empty list yields true.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.permissions.contains(p))
    }

    pub fn role_slugs(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }

    pub fn permission_strings(&self) -> Vec<String> {
        self.permissions
            .iter()
            .map(|p| p.as_str().to_string())
            .collect()
    }
}

/// Resolves a user's grants into their effective permission set, flags,
/// and priority. A user with no grants resolves to the empty set.
pub fn resolve(grants: &[RoleGrant]) -> ResolvedPermissions {
    let mut permissions = BTreeSet::new();
    let mut roles: Vec<BaseRole> = Vec::new();

    for grant in grants {
        permissions.extend(default_permissions(grant.base_role));

        if !roles.contains(&grant.base_role) {
            roles.push(grant.base_role);
        }

        if let Some(custom) = &grant.custom_role {
            if custom.is_active {
                permissions.extend(custom.permissions.iter().copied());
            }
        }
    }

    let is_admin = roles.contains(&BaseRole::Admin);
    let is_verifier = roles.contains(&BaseRole::Teacher) || roles.contains(&BaseRole::Counselor);

    ResolvedPermissions {
        permissions,
        roles,
        is_admin,
        is_verifier,
        priority: hierarchy::overall_priority(grants),
        display_role: hierarchy::display_role(grants),
    }
}

/// Parses permission strings loaded from storage. Unknown strings are
/// skipped with a warning; they can never grant anything.
pub fn parse_stored_permissions(raw: &[String]) -> Vec<Permission> {
    raw.iter()
        .filter_map(|s| match Permission::from_str(s) {
            Ok(p) => Some(p),
            Err(_) => {
                warn!(permission = %s, "Skipping unknown permission string in stored role");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::roles::model::CustomRoleGrant;

    fn custom(
        name: &str,
        priority: i32,
        is_active: bool,
        permissions: Vec<Permission>,
    ) -> CustomRoleGrant {
        CustomRoleGrant {
            name: name.to_string(),
            color: None,
            icon: None,
            priority,
            is_active,
            permissions,
        }
    }

    #[test]
    fn student_only_resolves_to_empty_set() {
        let resolved = resolve(&[RoleGrant::base(BaseRole::Student)]);

        assert!(resolved.permissions.is_empty());
        assert!(!resolved.is_admin);
        assert!(!resolved.is_verifier);
    }

    #[test]
    fn no_grants_resolves_to_empty_set() {
        let resolved = resolve(&[]);

        assert!(resolved.permissions.is_empty());
        assert!(resolved.roles.is_empty());
        assert!(!resolved.is_admin);
        assert!(!resolved.is_verifier);
        assert_eq!(resolved.priority, 0);
        assert!(resolved.display_role.is_none());
    }

    #[test]
    fn admin_gets_all_permissions_regardless_of_other_grants() {
        let resolved = resolve(&[
            RoleGrant::base(BaseRole::Student),
            RoleGrant::base(BaseRole::Admin),
            RoleGrant::with_custom(
                BaseRole::Student,
                custom("Inactive", 5, false, vec![Permission::ManageMenus]),
            ),
        ]);

        assert_eq!(resolved.permissions.len(), Permission::ALL.len());
        for p in Permission::ALL {
            assert!(resolved.has_permission(p));
        }
        assert!(resolved.is_admin);
    }

    #[test]
    fn teacher_and_counselor_union() {
        let resolved = resolve(&[
            RoleGrant::base(BaseRole::Teacher),
            RoleGrant::base(BaseRole::Counselor),
        ]);

        let expected: BTreeSet<_> = [
            Permission::ManageStudyHalls,
            Permission::VerifyEntries,
            Permission::ManageDiscussions,
            Permission::ViewAnalytics,
        ]
        .into_iter()
        .collect();

        assert_eq!(resolved.permissions, expected);
        assert!(!resolved.is_admin);
        assert!(resolved.is_verifier);
    }

    #[test]
    fn inactive_custom_role_is_a_noop() {
        let with_inactive = resolve(&[RoleGrant::with_custom(
            BaseRole::Student,
            custom("Dormant", 4, false, vec![Permission::ManageMenus]),
        )]);
        let without = resolve(&[RoleGrant::base(BaseRole::Student)]);

        assert_eq!(with_inactive.permissions, without.permissions);
        assert_eq!(with_inactive.priority, without.priority);
    }

    #[test]
    fn active_custom_role_adds_its_permissions() {
        let resolved = resolve(&[RoleGrant::with_custom(
            BaseRole::Student,
            custom("Menu Crew", 1, true, vec![Permission::ManageMenus]),
        )]);

        assert!(resolved.has_permission(Permission::ManageMenus));
        assert_eq!(resolved.permissions.len(), 1);
        assert!(!resolved.is_admin);
        assert!(!resolved.is_verifier);
    }

    #[test]
    fn teacher_counselor_and_custom_role_end_to_end() {
        let resolved = resolve(&[
            RoleGrant::base(BaseRole::Teacher),
            RoleGrant::with_custom(
                BaseRole::Counselor,
                custom("Custom X", 2, true, vec![Permission::ManageMenus]),
            ),
        ]);

        let expected: BTreeSet<_> = [
            Permission::ManageStudyHalls,
            Permission::VerifyEntries,
            Permission::ManageDiscussions,
            Permission::ViewAnalytics,
            Permission::ManageMenus,
        ]
        .into_iter()
        .collect();

        assert_eq!(resolved.permissions, expected);
        // max(teacher 50, counselor 50, custom 2 * 10 = 20)
        assert_eq!(resolved.priority, 50);
        assert!(resolved.is_verifier);
        assert!(!resolved.is_admin);
    }

    #[test]
    fn has_any_and_has_all_edge_cases() {
        let resolved = resolve(&[RoleGrant::base(BaseRole::Counselor)]);

        assert!(!resolved.has_any_permission(&[]));
        assert!(resolved.has_all_permissions(&[]));

        assert!(resolved.has_any_permission(&[Permission::ManageUsers, Permission::ViewAnalytics]));
        assert!(
            !resolved.has_all_permissions(&[Permission::ManageUsers, Permission::ViewAnalytics])
        );
        assert!(
            resolved.has_all_permissions(&[Permission::VerifyEntries, Permission::ViewAnalytics])
        );
    }

    #[test]
    fn duplicate_base_roles_are_deduplicated() {
        let resolved = resolve(&[
            RoleGrant::base(BaseRole::Teacher),
            RoleGrant::with_custom(
                BaseRole::Teacher,
                custom("Club Lead", 1, true, vec![Permission::ManageDiscussions]),
            ),
        ]);

        assert_eq!(resolved.roles, vec![BaseRole::Teacher]);
        assert_eq!(resolved.role_slugs(), vec!["teacher".to_string()]);
    }

    #[test]
    fn stored_permission_parsing_skips_unknowns() {
        let parsed = parse_stored_permissions(&[
            "manage_menus".to_string(),
            "fly_the_moon".to_string(),
            "view_analytics".to_string(),
        ]);

        assert_eq!(
            parsed,
            vec![Permission::ManageMenus, Permission::ViewAnalytics]
        );
    }
}
