//! # Argus API Server Library
//!
//! HR backend: users, tasks, attendance, salaries, bonuses and files behind
//! JWT identities and a role/resource/method policy set.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors and parameter parsing
//! - `middleware`: Route guard and request ids
//! - `response`: The uniform response envelope
//! - `routes`: API route handlers
//! - `validation`: Email and phone formats

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod validation;
