use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::SessionProvider;
use crate::config::Env;
use crate::constants::{DASHBOARD_PATH, SIGNIN_PATH, SIGNUP_PATH};
use crate::context::{ContextBuilder, SessionResolver};
use crate::database::Database;
use crate::handlers::{self, health, pages, session};
use crate::middleware::{access_control_middleware, context_middleware};

/// Process-wide state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub resolver: SessionResolver,
    pub contexts: ContextBuilder,
    pub env: Arc<Env>,
    pub db: Database,
}

impl AppState {
    pub fn new(env: Arc<Env>, db: Database, provider: Arc<dyn SessionProvider>) -> Self {
        Self {
            resolver: SessionResolver::new(provider),
            contexts: ContextBuilder::new(Arc::clone(&env), db.clone()),
            env,
            db,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.env);

    // Session resolution, context and access control; build context before deciding access
    let gated = Router::new()
        .route("/", get(pages::home))
        .route(SIGNIN_PATH, get(pages::signin))
        .route(SIGNUP_PATH, get(pages::signup))
        .route(DASHBOARD_PATH, get(pages::dashboard))
        .route("/dashboard/account", get(pages::account))
        .route("/api/auth/session", get(session::session_get))
        .route("/api/auth/sign-out", post(session::sign_out))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), context_middleware))
                .layer(middleware::from_fn(access_control_middleware)),
        );

    // Health never looks at sessions, so a broken session store cannot mask it
    Router::new()
        .route("/health", get(health::health))
        .merge(gated)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(env: &Env) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(&env.public_app_url.origin().ascii_serialization()) {
        Ok(origin) => base.allow_origin(origin),
        Err(e) => {
            tracing::warn!("PUBLIC_APP_URL has no usable origin, CORS disabled: {}", e);
            base
        }
    }
}
