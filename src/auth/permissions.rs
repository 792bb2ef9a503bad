//! Permission catalog: every permission a role can hold, organized as
//! `resource:action` strings.

/// Common permission string constants for compile-time safety
pub mod consts {
    // Sales orders
    pub const SALES_ORDERS_READ: &str = "sales-orders:read";
    pub const SALES_ORDERS_CREATE: &str = "sales-orders:create";
    pub const SALES_ORDERS_UPDATE: &str = "sales-orders:update";
    pub const SALES_ORDERS_CANCEL: &str = "sales-orders:cancel";

    // Production orders
    pub const PRODUCTION_ORDERS_READ: &str = "production-orders:read";
    pub const PRODUCTION_ORDERS_UPDATE: &str = "production-orders:update";

    // Purchase orders
    pub const PURCHASE_ORDERS_MANAGE: &str = "purchase-orders:manage";

    // Inventory
    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_ADJUST: &str = "inventory:adjust";

    // Products and BOMs
    pub const PRODUCTS_READ: &str = "products:read";
    pub const PRODUCTS_MANAGE: &str = "products:manage";

    // Invoices
    pub const INVOICES_READ: &str = "invoices:read";
    pub const INVOICES_ISSUE: &str = "invoices:issue";

    // Directories
    pub const CUSTOMERS_MANAGE: &str = "customers:manage";
    pub const SUPPLIERS_MANAGE: &str = "suppliers:manage";

    // Administration
    pub const ROLES_MANAGE: &str = "roles:manage";
    pub const USERS_MANAGE: &str = "users:manage";
}

/// Full catalog served by the role-administration API. Updating a role's
/// permission set validates against this list.
pub const PERMISSION_CATALOG: &[&str] = &[
    consts::SALES_ORDERS_READ,
    consts::SALES_ORDERS_CREATE,
    consts::SALES_ORDERS_UPDATE,
    consts::SALES_ORDERS_CANCEL,
    consts::PRODUCTION_ORDERS_READ,
    consts::PRODUCTION_ORDERS_UPDATE,
    consts::PURCHASE_ORDERS_MANAGE,
    consts::INVENTORY_READ,
    consts::INVENTORY_ADJUST,
    consts::PRODUCTS_READ,
    consts::PRODUCTS_MANAGE,
    consts::INVOICES_READ,
    consts::INVOICES_ISSUE,
    consts::CUSTOMERS_MANAGE,
    consts::SUPPLIERS_MANAGE,
    consts::ROLES_MANAGE,
    consts::USERS_MANAGE,
];

/// Returns true if the permission string is part of the catalog.
pub fn is_known_permission(permission: &str) -> bool {
    PERMISSION_CATALOG.contains(&permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_entries_are_known() {
        for perm in PERMISSION_CATALOG {
            assert!(is_known_permission(perm));
        }
        assert!(!is_known_permission("widgets:frobnicate"));
    }

    #[test]
    fn catalog_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for perm in PERMISSION_CATALOG {
            assert!(seen.insert(perm), "duplicate permission {}", perm);
        }
    }
}
