/// Claims extraction middleware
///
/// Authentication here is advisory. The middleware never rejects a request:
/// it attaches an [`Identity`] to the request extensions when a valid token is
/// present and otherwise lets the request through anonymously. Routes that
/// need a caller are protected separately by the API crate's route guard.
///
/// # Example
///
/// ```no_run
/// use argus_shared::auth::{jwt::TokenIssuer, middleware::extract_claims};
/// use axum::{middleware, routing::get, Router};
/// use chrono::Duration;
/// use std::sync::Arc;
///
/// let issuer = Arc::new(TokenIssuer::new("secret", Duration::days(7), Duration::days(210)));
/// let app: Router = Router::new()
///     .route("/", get(|| async { "ok" }))
///     .layer(middleware::from_fn_with_state(issuer, extract_claims));
/// ```

use axum::{
    extract::{Query, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::{collections::HashMap, sync::Arc};

use super::jwt::{extract_token, Identity, TokenIssuer};

pub async fn extract_claims(
    State(issuer): State<Arc<TokenIssuer>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(identity) = identify(&issuer, &req) {
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}

fn identify(issuer: &TokenIssuer, req: &Request) -> Option<Identity> {
    let query = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(token) = extract_token(query.get("token").map(String::as_str), authorization) else {
        tracing::debug!(path = %req.uri().path(), "no auth token, continuing anonymously");
        return None;
    };

    match issuer.decode(token) {
        Ok(identity) => Some(identity),
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), error = %e, "failed to decode auth token");
            None
        }
    }
}
