use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use crate::constants::{
    AUTHENTICATED_REDIRECT, DASHBOARD_PATH, REDIRECT_PATH_PARAM, SIGNIN_PATH, SIGNUP_PATH,
    UNAUTHENTICATED_REDIRECT,
};
use crate::context::AppContext;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    AuthPage,
    ProtectedPage,
    Other,
}

impl RouteClass {
    pub fn classify(path: &str) -> Self {
        if is_auth_page(path) {
            RouteClass::AuthPage
        } else if is_protected_page(path) {
            RouteClass::ProtectedPage
        } else {
            RouteClass::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToSignin { location: String },
    RedirectToDashboard,
}

impl AccessDecision {
    pub fn location(&self) -> Option<&str> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectToSignin { location } => Some(location),
            AccessDecision::RedirectToDashboard => Some(AUTHENTICATED_REDIRECT),
        }
    }
}

fn is_auth_page(path: &str) -> bool {
    path == SIGNIN_PATH || path == SIGNUP_PATH
}

// Plain prefix: "/dashboard", "/dashboard/..." and anything else starting with it.
fn is_protected_page(path: &str) -> bool {
    path.starts_with(DASHBOARD_PATH)
}

/// `/signin?redirectTo=<encoded path>`
pub fn signin_location(original_path: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(original_path.as_bytes()).collect();
    format!("{}?{}={}", UNAUTHENTICATED_REDIRECT, REDIRECT_PATH_PARAM, encoded)
}

/// Routing decision for one request. Pure; both checks are evaluated every time.
pub fn decide(path: &str, has_session: bool) -> AccessDecision {
    let auth_page = is_auth_page(path);
    let protected = is_protected_page(path);

    if auth_page && has_session {
        return AccessDecision::RedirectToDashboard;
    }

    if protected && !has_session {
        return AccessDecision::RedirectToSignin {
            location: signin_location(path),
        };
    }

    AccessDecision::Allow
}

/// Runs for every route after `context_middleware`.
///
/// A missing context means the middleware stack is mis-wired; that is reported
/// as a server error and the request never reaches the handler.
pub async fn access_control_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let ctx = AppContext::from_extensions(request.extensions())?;
    let decision = decide(request.uri().path(), ctx.is_authenticated());

    match decision.location() {
        None => Ok(next.run(request).await),
        Some(location) => {
            tracing::debug!(
                "Redirecting {} to {} ({:?})",
                request.uri().path(),
                location,
                RouteClass::classify(request.uri().path())
            );
            Ok((StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response())
        }
    }
}
