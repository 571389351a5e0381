/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use argus_api::{app::{build_router, AppState}, config::Config};
/// use argus_shared::{db::pool::create_pool, storage::{ObjectStore, S3ObjectStore}};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.pool_config()?).await?;
/// let storage: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::connect(&config.storage.s3).await);
/// let state = AppState::new(pool, config, storage);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use argus_shared::{
    auth::{
        authorization::{register_grants, PolicyAuthorizer},
        jwt::TokenIssuer,
        middleware::extract_claims,
        password::PasswordHasher,
    },
    db::repository::{Entity, Repository},
    models::{
        attendance::Attendance, bonus::Bonus, file::File, salary::Salary, task::Task, user::User,
    },
    storage::ObjectStore,
};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, map_response_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::{any::Any, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    error::{attach_error_details, ApiError},
    middleware::{
        guard::{require_policy, RouteGuard},
        request_id::{make_span, MakeRequestUuid, REQUEST_ID_HEADER},
    },
    routes::{self, crud},
};

/// Shared application state
///
/// Cloned into every handler; all members are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,

    pub tokens: Arc<TokenIssuer>,

    pub authorizer: Arc<PolicyAuthorizer>,

    pub storage: Arc<dyn ObjectStore>,

    pub passwords: PasswordHasher,
}

impl AppState {
    /// State with a policy set persisted in `auth_policies`
    pub fn new(db: PgPool, config: Config, storage: Arc<dyn ObjectStore>) -> Self {
        let tokens = TokenIssuer::new(
            config.auth.signing_key.clone(),
            config.auth.access_ttl(),
            config.auth.refresh_ttl(),
        );
        Self {
            authorizer: Arc::new(PolicyAuthorizer::with_store(db.clone())),
            db,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            storage,
            passwords: PasswordHasher::default(),
        }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<PolicyAuthorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_passwords(mut self, passwords: PasswordHasher) -> Self {
        self.passwords = passwords;
        self
    }

    /// Repository for one entity over the shared pool
    pub fn repo<E: Entity>(&self) -> Repository<E> {
        Repository::new(self.db.clone())
    }
}

/// Registers the default policy table, returns the number of triples added
pub async fn register_policies(authorizer: &PolicyAuthorizer) -> usize {
    register_grants(authorizer, routes::POLICY_TABLE).await
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                 public
/// └── /v1/
///     ├── /auth/login, /refresh   public
///     ├── /users/                 guarded
///     ├── /tasks/                 guarded
///     ├── /attendance/            guarded
///     ├── /salaries/              guarded
///     ├── /bonuses/               guarded
///     └── /files/ (+ /upload)     guarded
/// ```
///
/// Every entity router serves `GET|POST /` and `GET|PUT|DELETE /:id`.
///
/// # Middleware stack
///
/// Outermost first: CORS, request id (set, propagate), trace span, error
/// detail exposure, panic recovery, claims extraction. Route guards run
/// inside the matched entity router.
pub fn build_router(state: AppState) -> Router {
    let guard = |resource| RouteGuard::new(state.authorizer.clone(), resource);

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let user_routes = Router::new()
        .route("/", post(routes::users::create_user).get(routes::users::list_users))
        .route(
            "/:id",
            get(crud::get_one::<User>)
                .put(routes::users::update_user)
                .delete(crud::delete_one::<User>),
        )
        .layer(from_fn_with_state(guard(routes::users::RESOURCE), require_policy));

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task).get(routes::tasks::list_tasks))
        .route(
            "/:id",
            get(crud::get_one::<Task>)
                .put(routes::tasks::update_task)
                .delete(crud::delete_one::<Task>),
        )
        .layer(from_fn_with_state(guard(routes::tasks::RESOURCE), require_policy));

    let attendance_routes = Router::new()
        .route(
            "/",
            post(routes::attendance::create_attendance).get(routes::attendance::list_attendance),
        )
        .route(
            "/:id",
            get(crud::get_one::<Attendance>)
                .put(routes::attendance::update_attendance)
                .delete(crud::delete_one::<Attendance>),
        )
        .layer(from_fn_with_state(guard(routes::attendance::RESOURCE), require_policy));

    let salary_routes = Router::new()
        .route(
            "/",
            post(routes::salaries::create_salary).get(routes::salaries::list_salaries),
        )
        .route(
            "/:id",
            get(crud::get_one::<Salary>)
                .put(routes::salaries::update_salary)
                .delete(crud::delete_one::<Salary>),
        )
        .layer(from_fn_with_state(guard(routes::salaries::RESOURCE), require_policy));

    let bonus_routes = Router::new()
        .route("/", post(routes::bonuses::create_bonus).get(routes::bonuses::list_bonuses))
        .route(
            "/:id",
            get(crud::get_one::<Bonus>)
                .put(routes::bonuses::update_bonus)
                .delete(crud::delete_one::<Bonus>),
        )
        .layer(from_fn_with_state(guard(routes::bonuses::RESOURCE), require_policy));

    let upload_limit = state.config.storage.max_file_size + routes::files::MULTIPART_OVERHEAD;
    let file_routes = Router::new()
        .route("/", post(routes::files::create_file).get(routes::files::list_files))
        .route(
            "/upload",
            post(routes::files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/:id",
            get(crud::get_one::<File>)
                .put(routes::files::update_file)
                .delete(routes::files::delete_file),
        )
        .layer(from_fn_with_state(guard(routes::files::RESOURCE), require_policy));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .nest("/attendance", attendance_routes)
        .nest("/salaries", salary_routes)
        .nest("/bonuses", bonus_routes)
        .nest("/files", file_routes);

    let cors = cors_layer(&state.config.server.cors_origins);
    let expose_details = state.config.server.expose_error_details;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(from_fn_with_state(state.tokens.clone(), extract_claims))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(map_response_with_state(expose_details, attach_error_details))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span::<Body>)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Permissive when `*` is configured, otherwise the listed origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}
