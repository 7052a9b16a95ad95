use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::from_fn,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::CONFIG;
use crate::database::DatabaseManager;
use crate::handlers::{auth, companies, jobs, users};
use crate::middleware::{authenticate_jwt, ensure_admin, ensure_correct_user_or_admin, ensure_logged_in};
use crate::state::AppState;

/// Builds the full router. Tokens are read on every request; each group adds its own guard.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(company_routes())
        .merge(job_routes())
        .merge(user_routes())
        .layer(from_fn(authenticate_jwt));

    if let Some(cors) = cors_layer() {
        router = router.layer(cors);
    }
    if CONFIG.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(auth::token))
        .route("/auth/register", post(auth::register))
}

fn company_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/companies", get(companies::list))
        .route("/companies/:handle", get(companies::get));

    let admin = Router::new()
        .route("/companies", post(companies::create))
        .route("/companies/:handle", patch(companies::update).delete(companies::remove))
        .route_layer(from_fn(ensure_admin));

    public.merge(admin)
}

fn job_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/jobs", get(jobs::list))
        .route("/jobs/:id", get(jobs::get));

    let admin = Router::new()
        .route("/jobs", post(jobs::create))
        .route("/jobs/:id", patch(jobs::update).delete(jobs::remove))
        .route_layer(from_fn(ensure_admin));

    public.merge(admin)
}

fn user_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/users", post(users::create).get(users::list))
        .route_layer(from_fn(ensure_admin));

    let owner = Router::new()
        .route(
            "/users/:username",
            get(users::get).patch(users::update).delete(users::remove),
        )
        .route("/users/:username/jobs/:id", post(users::apply))
        .route_layer(from_fn(ensure_correct_user_or_admin))
        .route_layer(from_fn(ensure_logged_in));

    admin.merge(owner)
}

fn cors_layer() -> Option<CorsLayer> {
    let security = &CONFIG.security;
    if !security.enable_cors {
        return None;
    }

    let layer = if security.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };
    Some(layer)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Jobly API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/auth/token, /auth/register (public)",
                "companies": "/companies[/:handle] (read public, write admin)",
                "jobs": "/jobs[/:id] (read public, write admin)",
                "users": "/users (admin), /users/:username[/jobs/:id] (owner or admin)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": true,
                "message": "database unavailable",
                "code": "SERVICE_UNAVAILABLE",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
