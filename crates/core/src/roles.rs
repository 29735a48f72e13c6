//! Well-known role name constants.
//!
//! These must match the `CHECK` constraint on `users.role` in
//! `20250101000001_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Returns `true` if `role` is one of the known role names.
pub fn is_valid_role(role: &str) -> bool {
    matches!(role, ROLE_ADMIN | ROLE_USER)
}
