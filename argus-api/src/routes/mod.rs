/// API route handlers
///
/// One module per resource. Entity modules export their policy `RESOURCE`
/// and `GRANTS` next to the handlers they guard.
///
/// - `health`: health check (public)
/// - `auth`: login and token refresh (public)
/// - `users`, `tasks`, `attendance`, `salaries`, `bonuses`, `files`: CRUD
/// - `crud`: handlers and helpers shared by the entity modules

use argus_shared::auth::authorization::ResourceGrants;

pub mod attendance;
pub mod auth;
pub mod bonuses;
pub mod crud;
pub mod files;
pub mod health;
pub mod salaries;
pub mod tasks;
pub mod users;

/// Every verb an entity router serves
pub const ALL_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];

/// Default policy table registered at startup
pub const POLICY_TABLE: &[ResourceGrants] = &[
    users::GRANTS,
    tasks::GRANTS,
    attendance::GRANTS,
    salaries::GRANTS,
    bonuses::GRANTS,
    files::GRANTS,
];
