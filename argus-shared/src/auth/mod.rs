/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`jwt`]: token issuing, decoding and the request [`jwt::Identity`]
/// - [`middleware`]: fail-open claims extraction for axum
/// - [`authorization`]: `(role, resource, method)` policy authorizer
/// - [`password`]: Argon2id password hashing
///
/// # Example
///
/// ```no_run
/// use argus_shared::auth::authorization::PolicyAuthorizer;
/// use argus_shared::auth::jwt::TokenIssuer;
/// use argus_shared::auth::password::PasswordHasher;
/// use chrono::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = PasswordHasher::default().hash("Secret1")?;
///
/// let issuer = TokenIssuer::new("secret", Duration::days(7), Duration::days(210));
/// let identity = issuer.decode(&issuer.issue_access(1, "admin")?)?;
///
/// let authorizer = PolicyAuthorizer::in_memory();
/// authorizer.add_policy("admin", "/v1/users/", "GET").await?;
/// assert!(authorizer.enforce(identity.role(), "/v1/users/", "GET"));
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
