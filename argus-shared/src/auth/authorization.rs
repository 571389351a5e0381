/// Role based route authorization
///
/// The authorizer holds a set of `(role, resource, method)` triples. A caller
/// is allowed iff the exact triple exists; there is no ordering, wildcard or
/// deny rule. Triples may be persisted in the `auth_policies` table so they
/// survive restarts, but enforcement only ever reads the in-memory set.
///
/// # Example
///
/// ```
/// use argus_shared::auth::authorization::PolicyAuthorizer;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let authorizer = PolicyAuthorizer::in_memory();
/// authorizer.add_policy("user", "/v1/tasks/", "GET").await?;
///
/// assert!(authorizer.enforce(Some("user"), "/v1/tasks/", "GET"));
/// assert!(!authorizer.enforce(Some("user"), "/v1/tasks/", "DELETE"));
/// assert!(!authorizer.enforce(None, "/v1/tasks/", "GET"));
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use std::{
    collections::HashSet,
    sync::{PoisonError, RwLock},
};

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Invalid policy: {0}")]
    Invalid(String),

    #[error("Policy store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// A single permission triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Policy {
    pub role: String,
    pub resource: String,
    pub method: String,
}

impl Policy {
    /// Methods are compared upper-cased
    pub fn new(role: &str, resource: &str, method: &str) -> Result<Self, PolicyError> {
        if role.is_empty() || resource.is_empty() || method.is_empty() {
            return Err(PolicyError::Invalid(format!(
                "({}, {}, {}) has an empty component",
                role, resource, method
            )));
        }

        Ok(Self {
            role: role.to_string(),
            resource: resource.to_string(),
            method: method.to_ascii_uppercase(),
        })
    }
}

pub struct PolicyAuthorizer {
    policies: RwLock<HashSet<Policy>>,
    store: Option<PgPool>,
}

impl PolicyAuthorizer {
    /// Authorizer without persistence
    pub fn in_memory() -> Self {
        Self {
            policies: RwLock::new(HashSet::new()),
            store: None,
        }
    }

    /// Authorizer that writes every added triple to `auth_policies`
    pub fn with_store(pool: PgPool) -> Self {
        Self {
            policies: RwLock::new(HashSet::new()),
            store: Some(pool),
        }
    }

    /// Loads persisted triples into memory, returns how many were read
    pub async fn load(&self) -> Result<usize, PolicyError> {
        let Some(pool) = &self.store else {
            return Ok(0);
        };

        let rows: Vec<Policy> =
            sqlx::query_as("SELECT role, resource, method FROM auth_policies")
                .fetch_all(pool)
                .await?;

        let count = rows.len();
        self.policies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(rows);

        tracing::debug!(count, "loaded persisted policies");
        Ok(count)
    }

    /// Adds a triple; returns false if it was already present
    ///
    /// With a store configured the triple is persisted first. If that fails
    /// the triple is not enforced.
    pub async fn add_policy(
        &self,
        role: &str,
        resource: &str,
        method: &str,
    ) -> Result<bool, PolicyError> {
        let policy = Policy::new(role, resource, method)?;

        if let Some(pool) = &self.store {
            sqlx::query(
                "INSERT INTO auth_policies (role, resource, method) VALUES ($1, $2, $3) \
                 ON CONFLICT (role, resource, method) DO NOTHING",
            )
            .bind(&policy.role)
            .bind(&policy.resource)
            .bind(&policy.method)
            .execute(pool)
            .await?;
        }

        Ok(self
            .policies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(policy))
    }

    /// Exact-match lookup; a missing role never matches
    pub fn enforce(&self, role: Option<&str>, resource: &str, method: &str) -> bool {
        let Some(role) = role else {
            return false;
        };

        let probe = Policy {
            role: role.to_string(),
            resource: resource.to_string(),
            method: method.to_ascii_uppercase(),
        };

        self.policies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&probe)
    }

    pub fn len(&self) -> usize {
        self.policies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grants for one resource: each role with the methods it may use
pub struct ResourceGrants {
    pub resource: &'static str,
    pub grants: &'static [(&'static str, &'static [&'static str])],
}

/// Registers every grant, logging and skipping the ones that fail
///
/// Returns the number of triples that were registered.
pub async fn register_grants(authorizer: &PolicyAuthorizer, table: &[ResourceGrants]) -> usize {
    let mut registered = 0;

    for entry in table {
        for (role, methods) in entry.grants {
            for method in *methods {
                match authorizer.add_policy(role, entry.resource, method).await {
                    Ok(_) => registered += 1,
                    Err(e) => tracing::error!(
                        role = %role,
                        resource = %entry.resource,
                        method = %method,
                        error = %e,
                        "failed to add policy"
                    ),
                }
            }
        }
    }

    registered
}
