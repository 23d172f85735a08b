//! Role based access control: the POS knows two roles, "admin" and
//! "operator". Permissions are derived from the role at token-issue time.

/// Permission constants used by route gating.
pub mod permissions {
    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_ADJUST: &str = "inventory:adjust";
    pub const SALES_CREATE: &str = "sales:create";
    pub const SALES_READ: &str = "sales:read";
    pub const BALANCE_READ: &str = "balance:read";
    pub const BALANCE_MANAGE: &str = "balance:manage";
}

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_OPERATOR: &str = "operator";

/// Returns the permission set granted by a role. Unknown roles get nothing.
pub fn role_permissions(role: &str) -> Vec<String> {
    use permissions::*;

    let perms: &[&str] = match role {
        ROLE_ADMIN => &[
            INVENTORY_READ,
            INVENTORY_ADJUST,
            SALES_CREATE,
            SALES_READ,
            BALANCE_READ,
            BALANCE_MANAGE,
        ],
        ROLE_OPERATOR => &[
            INVENTORY_READ,
            INVENTORY_ADJUST,
            SALES_CREATE,
            SALES_READ,
            BALANCE_READ,
        ],
        _ => &[],
    };

    perms.iter().map(|p| p.to_string()).collect()
}

/// Checks that a role label is one the system issues tokens for.
pub fn is_known_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_OPERATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_cannot_manage_balance() {
        let perms = role_permissions(ROLE_OPERATOR);
        assert!(perms.contains(&permissions::SALES_CREATE.to_string()));
        assert!(!perms.contains(&permissions::BALANCE_MANAGE.to_string()));
    }

    #[test]
    fn admin_has_all_operator_permissions() {
        let admin = role_permissions(ROLE_ADMIN);
        for p in role_permissions(ROLE_OPERATOR) {
            assert!(admin.contains(&p));
        }
    }

    #[test]
    fn unknown_role_gets_nothing() {
        assert!(role_permissions("superuser").is_empty());
        assert!(!is_known_role("superuser"));
    }
}
