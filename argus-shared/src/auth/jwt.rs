/// Bearer token handling
///
/// Tokens are HS256-signed JWTs. Decoding is deliberately lenient about the
/// claim payload: any JSON object is accepted and only string-valued claims
/// survive into the [`Identity`] attached to a request.
///
/// # Example
///
/// ```no_run
/// use argus_shared::auth::jwt::{decode_claims, TokenIssuer};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new("secret", Duration::days(7), Duration::days(210));
/// let token = issuer.issue_access(42, "admin")?;
///
/// let identity = decode_claims(&token, "secret")?;
/// assert_eq!(identity.user_id(), Some(42));
/// assert_eq!(identity.role(), Some("admin"));
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Token errors
///
/// Decode failures are never fatal to a request; the claims middleware logs
/// them and lets the request continue anonymously.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad structure, bad signature, wrong algorithm, missing `exp`
    #[error("Token is malformed")]
    Malformed,

    /// `exp` in the past or `nbf` in the future
    #[error("Token is either expired or not active yet")]
    ExpiredOrInactive,

    /// Signing failed
    #[error("Couldn't create token: {0}")]
    Encode(String),
}

/// Kind of token carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Claims written into issued tokens
///
/// `sub` is a string so it survives the string-only claim filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    pub iat: i64,

    pub exp: i64,
}

impl TokenClaims {
    fn new(user_id: i64, role: Option<&str>, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            role: role.map(str::to_string),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Request-scoped identity decoded from a bearer token
///
/// Holds only the string-valued claims of the token. Inserted into request
/// extensions by [`crate::auth::middleware::extract_claims`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    claims: HashMap<String, String>,
}

impl Identity {
    /// Keeps string claims, drops everything else (numbers, arrays, objects)
    pub fn from_claims(raw: HashMap<String, Value>) -> Self {
        let claims = raw
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::String(s) => Some((name, s)),
                _ => None,
            })
            .collect();
        Self { claims }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.claims.get(name).map(String::as_str)
    }

    pub fn claims(&self) -> &HashMap<String, String> {
        &self.claims
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub")
    }

    /// The `role` claim, or `type` for tokens that carry no role
    pub fn role(&self) -> Option<&str> {
        self.get("role").or_else(|| self.get("type"))
    }

    pub fn token_type(&self) -> Option<&str> {
        self.get("type")
    }

    /// Numeric user id parsed from `sub`
    pub fn user_id(&self) -> Option<i64> {
        self.subject().and_then(|s| s.parse().ok())
    }
}

/// Picks the raw token out of a request
///
/// The `token` query parameter wins. Otherwise the `Authorization` header is
/// used when it is longer than seven characters, with or without a `Bearer `
/// prefix.
pub fn extract_token<'a>(
    query_token: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Option<&'a str> {
    if let Some(token) = query_token.filter(|t| !t.is_empty()) {
        return Some(token);
    }

    let header = authorization?;
    if header.len() <= 7 {
        return None;
    }

    Some(header.strip_prefix("Bearer ").unwrap_or(header))
}

/// Verifies signature, `exp` and `nbf`, then returns the string claims
pub fn decode_claims(token: &str, secret: &str) -> Result<Identity, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<HashMap<String, Value>>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                TokenError::ExpiredOrInactive
            }
            _ => TokenError::Malformed,
        }
    })?;

    Ok(Identity::from_claims(data.claims))
}

/// SHA-256 hex digest used to store refresh tokens at rest
pub fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issues and decodes tokens with a single signing secret
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_access(&self, user_id: i64, role: &str) -> Result<String, TokenError> {
        let claims = TokenClaims::new(user_id, Some(role), TokenType::Access, self.access_ttl);
        self.sign(&claims)
    }

    pub fn issue_refresh(&self, user_id: i64) -> Result<String, TokenError> {
        let claims = TokenClaims::new(user_id, None, TokenType::Refresh, self.refresh_ttl);
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), claims, &key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Identity, TokenError> {
        decode_claims(token, &self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, Duration::days(7), Duration::days(210))
    }

    #[test]
    fn test_access_token_roundtrip() {
        let token = issuer().issue_access(7, "admin").unwrap();
        let identity = decode_claims(&token, SECRET).unwrap();

        assert_eq!(identity.subject(), Some("7"));
        assert_eq!(identity.user_id(), Some(7));
        assert_eq!(identity.role(), Some("admin"));
        assert_eq!(identity.token_type(), Some("access"));
        // iat/exp are numbers and must not leak into the identity
        assert!(identity.get("exp").is_none());
        assert!(identity.get("iat").is_none());
    }

    #[test]
    fn test_refresh_token_role_falls_back_to_type() {
        let token = issuer().issue_refresh(9).unwrap();
        let identity = decode_claims(&token, SECRET).unwrap();

        assert_eq!(identity.get("role"), None);
        assert_eq!(identity.role(), Some("refresh"));
    }

    #[test]
    fn test_wrong_secret_is_malformed() {
        let token = issuer().issue_access(1, "user").unwrap();
        let result = decode_claims(&token, "another-secret-key-that-is-long-enough");
        assert_eq!(result.unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(
            decode_claims("not.a.jwt", SECRET).unwrap_err(),
            TokenError::Malformed
        );
        assert_eq!(decode_claims("", SECRET).unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn test_expired_token() {
        let claims = TokenClaims::new(1, Some("admin"), TokenType::Access, Duration::seconds(-3600));
        let token = issuer().sign(&claims).unwrap();

        assert_eq!(
            decode_claims(&token, SECRET).unwrap_err(),
            TokenError::ExpiredOrInactive
        );
    }

    #[test]
    fn test_not_yet_valid_token() {
        let now = Utc::now().timestamp();
        let claims = json!({
            "sub": "1",
            "exp": now + 7200,
            "nbf": now + 3600,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            decode_claims(&token, SECRET).unwrap_err(),
            TokenError::ExpiredOrInactive
        );
    }

    #[test]
    fn test_non_string_claims_dropped() {
        let raw: HashMap<String, Value> = serde_json::from_value(json!({
            "sub": "5",
            "role": "user",
            "admin": true,
            "scopes": ["a", "b"],
            "level": 3
        }))
        .unwrap();

        let identity = Identity::from_claims(raw);
        assert_eq!(identity.claims().len(), 2);
        assert_eq!(identity.role(), Some("user"));
    }

    #[test]
    fn test_extract_token_sources() {
        assert_eq!(extract_token(Some("q"), Some("Bearer h.h.h")), Some("q"));
        assert_eq!(extract_token(None, Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_token(None, Some("abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_token(Some(""), Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_token(None, Some("Bearer ")), None);
        assert_eq!(extract_token(None, Some("short")), None);
        assert_eq!(extract_token(None, None), None);
    }

    #[test]
    fn test_digest_token_is_stable_hex() {
        let a = digest_token("token");
        assert_eq!(a.len(), 64);
        assert_eq!(a, digest_token("token"));
        assert_ne!(a, digest_token("token2"));
    }
}
