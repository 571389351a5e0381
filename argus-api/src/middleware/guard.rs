/// Route guard: identity requirement plus policy enforcement
///
/// Runs after the claims middleware. For a guarded router:
///
/// 1. no [`Identity`] → 401
/// 2. `(role, resource, method)` not in the policy set → 403
/// 3. otherwise the handler runs
///
/// # Example
///
/// ```
/// use argus_api::middleware::guard::{require_policy, RouteGuard};
/// use argus_shared::auth::authorization::PolicyAuthorizer;
/// use axum::{middleware::from_fn_with_state, routing::get, Router};
/// use std::sync::Arc;
///
/// let guard = RouteGuard::new(Arc::new(PolicyAuthorizer::in_memory()), "/v1/tasks/");
/// let tasks: Router = Router::new()
///     .route("/", get(|| async { "tasks" }))
///     .layer(from_fn_with_state(guard, require_policy));
/// ```

use argus_shared::auth::{authorization::PolicyAuthorizer, jwt::Identity};
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ApiError;

#[derive(Clone)]
pub struct RouteGuard {
    authorizer: Arc<PolicyAuthorizer>,
    resource: &'static str,
}

impl RouteGuard {
    /// Guard requiring an identity
    pub fn new(authorizer: Arc<PolicyAuthorizer>, resource: &'static str) -> Self {
        Self {
            authorizer,
            resource,
        }
    }

    /// Decides a request without running it
    pub fn check(&self, identity: Option<&Identity>, method: &Method) -> Result<(), ApiError> {
        let Some(identity) = identity else {
            return Err(ApiError::Unauthorized(
                "Missing or invalid authentication token".to_string(),
            ));
        };

        // HEAD is served by GET handlers
        let method = if *method == Method::HEAD { "GET" } else { method.as_str() };

        if self.authorizer.enforce(identity.role(), self.resource, method) {
            Ok(())
        } else {
            tracing::warn!(
                subject = identity.subject().unwrap_or("-"),
                role = identity.role().unwrap_or("-"),
                resource = self.resource,
                method = method,
                "policy denied"
            );
            Err(ApiError::Forbidden(format!(
                "You do not have permission to {} {}",
                method, self.resource
            )))
        }
    }
}

pub async fn require_policy(
    State(guard): State<RouteGuard>,
    req: Request,
    next: Next,
) -> Response {
    let decision = guard.check(req.extensions().get::<Identity>(), req.method());
    match decision {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn identity(role: &str) -> Identity {
        let claims: HashMap<String, Value> =
            [("sub".to_string(), json!("3")), ("role".to_string(), json!(role))]
                .into_iter()
                .collect();
        Identity::from_claims(claims)
    }

    async fn guard() -> RouteGuard {
        let authorizer = Arc::new(PolicyAuthorizer::in_memory());
        authorizer.add_policy("user", "/v1/tasks/", "GET").await.unwrap();
        authorizer.add_policy("admin", "/v1/tasks/", "DELETE").await.unwrap();
        RouteGuard::new(authorizer, "/v1/tasks/")
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthorized() {
        let err = guard().await.check(None, &Method::GET).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_policy_decides() {
        let guard = guard().await;
        let user = identity("user");

        assert!(guard.check(Some(&user), &Method::GET).is_ok());
        assert!(guard.check(Some(&user), &Method::HEAD).is_ok());

        let err = guard.check(Some(&user), &Method::DELETE).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(
            err.to_string(),
            "Forbidden: You do not have permission to DELETE /v1/tasks/"
        );

        assert!(guard.check(Some(&identity("admin")), &Method::DELETE).is_ok());
    }

    #[tokio::test]
    async fn test_identity_without_role_is_forbidden() {
        let identity = Identity::from_claims(HashMap::from([("sub".to_string(), json!("3"))]));
        let err = guard().await.check(Some(&identity), &Method::GET).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
