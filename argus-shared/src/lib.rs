//! # Argus Shared Library
//!
//! Types and data access shared by the Argus HR API server and its tests.
//!
//! ## Module Organization
//!
//! - `auth`: JWT claims, the policy authorizer, password hashing
//! - `db`: Connection pool, migrations, the generic repository
//! - `models`: Users, tasks, attendance, salaries, bonuses, files
//! - `storage`: Blob storage for uploaded files

pub mod auth;
pub mod db;
pub mod models;
pub mod storage;

/// Current version of the Argus shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
