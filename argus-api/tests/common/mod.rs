//! Common test utilities for integration tests
//!
//! - [`TestApp`]: router over a lazy pool that never connects, for tests that
//!   stop before the database (guards, validation, envelopes)
//! - [`TestContext`]: router over a real database; `None` when
//!   `DATABASE_URL` is unset so those tests skip
//! - request helpers returning the status and the parsed envelope
#![allow(dead_code)]

use argus_api::{
    app::{build_router, register_policies, AppState},
    config::Config,
};
use argus_shared::{
    auth::{
        authorization::PolicyAuthorizer,
        password::{HashCost, PasswordHasher},
    },
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
        repository::Repository,
    },
    models::user::{NewUser, User, UserRole},
    storage::MemoryObjectStore,
};
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tower::ServiceExt;
use uuid::Uuid;

pub const SIGNING_KEY: &str = "integration-test-signing-key-0123456789";
pub const PASSWORD: &str = "secret-pass";

/// Configuration built from fixed values plus `overrides`
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SIGNING_KEY".to_string(), SIGNING_KEY.to_string()),
        ("MINIO_ENDPOINT".to_string(), "minio.test:9000".to_string()),
        ("MINIO_BUCKET_NAME".to_string(), "argus-test".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

/// Argon2 parameters small enough for tests
pub fn fast_passwords() -> PasswordHasher {
    PasswordHasher::new(HashCost {
        memory_kib: 8 * 1024,
        iterations: 1,
        parallelism: 1,
    })
}

async fn state_with(
    db: PgPool,
    config: Config,
    storage: Arc<MemoryObjectStore>,
) -> AppState {
    let authorizer = Arc::new(PolicyAuthorizer::in_memory());
    register_policies(&authorizer).await;
    AppState::new(db, config, storage)
        .with_authorizer(authorizer)
        .with_passwords(fast_passwords())
}

/// App whose pool points at a closed port
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config(&[])).await
    }

    pub async fn with_config(config: Config) -> Self {
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("nobody")
            .database("none");
        let db = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy_with(options);
        let storage = Arc::new(MemoryObjectStore::new("minio.test:9000", "argus-test"));

        let state = state_with(db, config, storage).await;
        Self {
            app: build_router(state.clone()),
            state,
        }
    }

    /// Access token for a user id and role
    pub fn token(&self, user_id: i64, role: &str) -> String {
        self.state.tokens.issue_access(user_id, role).expect("token")
    }
}

/// App over a real database with an admin caller
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub state: AppState,
    pub storage: Arc<MemoryObjectStore>,
    pub admin: User,
    pub admin_token: String,
    created_users: std::sync::Mutex<Vec<i64>>,
}

impl TestContext {
    /// Returns `None` when no test database is configured
    pub async fn new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let mut db_config = DatabaseConfig::from_url(&url).expect("DATABASE_URL parses");
        db_config.max_connections = 5;
        db_config.min_connections = 1;
        let db = create_pool(db_config).await.expect("database reachable");
        run_migrations(&db).await.expect("migrations apply");

        let storage = Arc::new(MemoryObjectStore::new("minio.test:9000", "argus-test"));
        let state = state_with(db.clone(), test_config(&[]), storage.clone()).await;

        let admin = insert_user(&state, UserRole::Admin).await;
        let admin_token = state
            .tokens
            .issue_access(admin.id, admin.role.as_str())
            .expect("token");

        Some(Self {
            db,
            app: build_router(state.clone()),
            state,
            storage,
            created_users: std::sync::Mutex::new(vec![admin.id]),
            admin,
            admin_token,
        })
    }

    /// Inserts another user, removed again by [`TestContext::cleanup`]
    pub async fn user(&self, role: UserRole) -> User {
        let user = insert_user(&self.state, role).await;
        self.track_user(user.id);
        user
    }

    pub fn track_user(&self, id: i64) {
        self.created_users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(id);
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state
            .tokens
            .issue_access(user.id, user.role.as_str())
            .expect("token")
    }

    /// Deletes every user created through the context; owned rows cascade
    pub async fn cleanup(&self) {
        let ids: Vec<i64> = self
            .created_users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .drain(..)
            .collect();
        let users = Repository::<User>::new(self.db.clone());
        for id in ids {
            let _ = users.delete(id).await;
        }
    }
}

/// Unique `+998` phone number
pub fn unique_phone() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("+998{:09}", n)
}

pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

async fn insert_user(state: &AppState, role: UserRole) -> User {
    state
        .repo::<User>()
        .create(NewUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            email: unique_email(),
            phone: unique_phone(),
            photo_url: None,
            bio: None,
            hashed_password: state.passwords.hash(PASSWORD).expect("hash"),
        })
        .await
        .expect("insert user")
}

/// Sends a request, returns status, headers and the JSON body (`Null` if none)
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: Body,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("router is infallible");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

/// JSON request helper
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (content_type, body) = match body {
        Some(json) => (Some("application/json"), Body::from(json.to_string())),
        None => (None, Body::empty()),
    };
    let (status, _, json) = send_raw(app, method, uri, token, content_type, body).await;
    (status, json)
}

/// Multipart body with a `file` part and optional `task_id`
pub fn multipart_body(
    file_name: &str,
    content: &[u8],
    task_id: Option<i64>,
) -> (String, Vec<u8>) {
    let boundary = format!("argus-{}", Uuid::new_v4().simple());
    let mut body = Vec::new();

    if let Some(task_id) = task_id {
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"task_id\"\r\n\r\n{t}\r\n",
                b = boundary,
                t = task_id
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: text/plain\r\n\r\n",
            b = boundary,
            f = file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}
