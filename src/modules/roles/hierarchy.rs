//! Role priorities and management checks.
//!
//! Base roles carry fixed priorities; an active custom role contributes ten
//! times its 0..=5 priority. A user's overall priority is the max over all
//! contributions. Management and assignment checks require strictly greater
//! priority, with a shortcut for admin-level actors.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::{BaseRole, CustomRoleGrant, RoleGrant};

pub const ADMIN_PRIORITY: i32 = 100;
const CUSTOM_PRIORITY_MULTIPLIER: i32 = 10;

pub fn base_priority(role: BaseRole) -> i32 {
    match role {
        BaseRole::Admin => 100,
        BaseRole::Teacher => 50,
        BaseRole::Counselor => 50,
        BaseRole::Student => 10,
    }
}

/// An inactive custom role contributes nothing.
pub fn custom_contribution(custom: &CustomRoleGrant) -> i32 {
    if custom.is_active {
        custom.priority * CUSTOM_PRIORITY_MULTIPLIER
    } else {
        0
    }
}

/// Max over every contribution; 0 for a user with no grants.
pub fn overall_priority(grants: &[RoleGrant]) -> i32 {
    let mut best = 0;
    for grant in grants {
        best = best.max(base_priority(grant.base_role));
        if let Some(custom) = &grant.custom_role {
            best = best.max(custom_contribution(custom));
        }
    }
    best
}

/// Priority of a single assignment, used to gate its creation.
pub fn assignment_priority(base_role: BaseRole, custom: Option<&CustomRoleGrant>) -> i32 {
    let mut priority = base_priority(base_role);
    if let Some(custom) = custom {
        priority = priority.max(custom_contribution(custom));
    }
    priority
}

/// Whether a user at `acting` priority may manage a user at `target`
/// priority. Admin-level actors may manage anyone; otherwise strictly
/// greater priority is required, so equals can never manage each other.
pub fn can_manage_user(acting: i32, target: i32) -> bool {
    acting >= ADMIN_PRIORITY || acting > target
}

/// Same rule as [`can_manage_user`], applied to the priority of the role
/// being handed out.
pub fn can_assign_role(acting: i32, role_priority: i32) -> bool {
    acting >= ADMIN_PRIORITY || acting > role_priority
}

/// The role name/color/icon shown on a profile: the highest-priority
/// contribution wins. On a tie the custom role's metadata wins over the
/// base role's, because custom contributions are compared inclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DisplayRole {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

pub fn display_role(grants: &[RoleGrant]) -> Option<DisplayRole> {
    let mut best: Option<(i32, DisplayRole)> = None;

    for grant in grants {
        let base = base_priority(grant.base_role);
        if best.as_ref().is_none_or(|(p, _)| base > *p) {
            best = Some((
                base,
                DisplayRole {
                    name: grant.base_role.display_name().to_string(),
                    color: None,
                    icon: None,
                },
            ));
        }

        if let Some(custom) = &grant.custom_role {
            if !custom.is_active {
                continue;
            }
            let contribution = custom_contribution(custom);
            if best.as_ref().is_none_or(|(p, _)| contribution >= *p) {
                best = Some((
                    contribution,
                    DisplayRole {
                        name: custom.name.clone(),
                        color: custom.color.clone(),
                        icon: custom.icon.clone(),
                    },
                ));
            }
        }
    }

    best.map(|(_, display)| display)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(name: &str, priority: i32, is_active: bool) -> CustomRoleGrant {
        CustomRoleGrant {
            name: name.to_string(),
            color: Some("#ff8800".to_string()),
            icon: Some("star".to_string()),
            priority,
            is_active,
            permissions: vec![],
        }
    }

    #[test]
    fn base_priorities_match_the_table() {
        assert_eq!(base_priority(BaseRole::Admin), 100);
        assert_eq!(base_priority(BaseRole::Teacher), 50);
        assert_eq!(base_priority(BaseRole::Counselor), 50);
        assert_eq!(base_priority(BaseRole::Student), 10);
    }

    #[test]
    fn custom_contribution_scales_by_ten() {
        assert_eq!(custom_contribution(&custom("x", 0, true)), 0);
        assert_eq!(custom_contribution(&custom("x", 2, true)), 20);
        assert_eq!(custom_contribution(&custom("x", 5, true)), 50);
        assert_eq!(custom_contribution(&custom("x", 5, false)), 0);
    }

    #[test]
    fn overall_priority_is_the_max_contribution() {
        assert_eq!(overall_priority(&[]), 0);

        let grants = vec![
            RoleGrant::base(BaseRole::Student),
            RoleGrant::with_custom(BaseRole::Counselor, custom("Lead", 2, true)),
        ];
        assert_eq!(overall_priority(&grants), 50);

        let grants = vec![RoleGrant::with_custom(
            BaseRole::Student,
            custom("Officer", 3, true),
        )];
        assert_eq!(overall_priority(&grants), 30);
    }

    #[test]
    fn admin_can_manage_anyone() {
        assert!(can_manage_user(100, 100));
        assert!(can_manage_user(100, 10));
        assert!(can_manage_user(100, 0));
    }

    #[test]
    fn equal_priorities_cannot_manage_each_other() {
        assert!(!can_manage_user(50, 50));
        assert!(!can_manage_user(10, 10));
        assert!(!can_manage_user(0, 0));
    }

    #[test]
    fn strictly_greater_priority_manages() {
        assert!(can_manage_user(50, 10));
        assert!(!can_manage_user(10, 50));
        assert!(can_manage_user(30, 10));
    }

    #[test]
    fn assigning_requires_outranking_the_role() {
        assert!(can_assign_role(100, 100));
        assert!(can_assign_role(50, 10));
        assert!(!can_assign_role(50, 50));
        assert!(!can_assign_role(10, 50));
    }

    #[test]
    fn assignment_priority_takes_the_higher_contribution() {
        assert_eq!(assignment_priority(BaseRole::Student, None), 10);
        assert_eq!(
            assignment_priority(BaseRole::Student, Some(&custom("Officer", 3, true))),
            30
        );
        assert_eq!(
            assignment_priority(BaseRole::Teacher, Some(&custom("Officer", 3, true))),
            50
        );
        assert_eq!(
            assignment_priority(BaseRole::Student, Some(&custom("Officer", 3, false))),
            10
        );
    }

    #[test]
    fn display_role_picks_the_highest_contribution() {
        let grants = vec![
            RoleGrant::base(BaseRole::Student),
            RoleGrant::with_custom(BaseRole::Student, custom("Club Officer", 3, true)),
        ];
        let display = display_role(&grants).unwrap();
        assert_eq!(display.name, "Club Officer");
        assert_eq!(display.color.as_deref(), Some("#ff8800"));
    }

    #[test]
    fn display_role_tie_goes_to_the_custom_role() {
        // Teacher base (50) vs custom at priority 5 (50): custom wins the tie.
        let grants = vec![RoleGrant::with_custom(
            BaseRole::Teacher,
            custom("Department Head", 5, true),
        )];
        let display = display_role(&grants).unwrap();
        assert_eq!(display.name, "Department Head");
    }

    #[test]
    fn inactive_custom_role_never_displays() {
        let grants = vec![RoleGrant::with_custom(
            BaseRole::Student,
            custom("Dormant", 5, false),
        )];
        let display = display_role(&grants).unwrap();
        assert_eq!(display.name, "Student");
        assert!(display.color.is_none());
    }

    #[test]
    fn no_grants_has_no_display_role() {
        assert!(display_role(&[]).is_none());
    }
}
