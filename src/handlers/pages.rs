use axum::extract::Query;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::{form_urlencoded, Url};

use crate::config::Env;
use crate::constants::{
    AUTHENTICATED_REDIRECT, REDIRECT_PATH_PARAM, SIGNIN_PATH, SIGNOUT_REDIRECT, SIGNUP_PATH,
};
use crate::context::AppContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// Base path of the external auth provider's endpoints.
const AUTH_BASE_PATH: &str = "/api/auth";

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialProvider {
    pub id: &'static str,
    pub name: &'static str,
    pub sign_in_url: String,
}

#[derive(Debug, Serialize)]
pub struct NavItem {
    pub title: &'static str,
    pub url: &'static str,
}

const NAVIGATION: &[NavItem] = &[
    NavItem { title: "Dashboard", url: "/dashboard" },
    NavItem { title: "Inbox", url: "#" },
    NavItem { title: "Calendar", url: "#" },
    NavItem { title: "Search", url: "#" },
    NavItem { title: "Settings", url: "#" },
];

/// Keep only same-origin paths; anything else could bounce the user off-site.
pub fn sanitize_redirect(target: Option<&str>) -> Option<&str> {
    target.filter(|t| t.starts_with('/') && !t.starts_with("//") && !t.starts_with("/\\"))
}

/// Link to another auth page that carries `redirectTo` forward when there is one.
pub fn link_with_redirect(path: &str, redirect_to: Option<&str>) -> String {
    match redirect_to {
        Some(target) => {
            let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
            format!("{}?{}={}", path, REDIRECT_PATH_PARAM, encoded)
        }
        None => path.to_string(),
    }
}

fn checked_redirect(query: &RedirectQuery) -> Option<&str> {
    let redirect_to = sanitize_redirect(query.redirect_to.as_deref());
    if query.redirect_to.is_some() && redirect_to.is_none() {
        tracing::warn!("Dropping off-site redirectTo: {:?}", query.redirect_to);
    }
    redirect_to
}

fn social_providers(env: &Env, callback: &str) -> Result<Vec<SocialProvider>, url::ParseError> {
    let endpoint = env
        .auth_url
        .join(&format!("{}/sign-in/social", AUTH_BASE_PATH))?;

    let sign_in_url = |provider: &str| -> String {
        let mut url: Url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("callbackURL", callback);
        url.into()
    };

    Ok(vec![
        SocialProvider {
            id: "github",
            name: "GitHub",
            sign_in_url: sign_in_url("github"),
        },
        SocialProvider {
            id: "google",
            name: "Google",
            sign_in_url: sign_in_url("google"),
        },
    ])
}

/// GET /
pub async fn home(ctx: AppContext) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": "authgate",
        "version": &*ctx.app_version,
        "env": &*ctx.public_env,
        "authenticated": ctx.is_authenticated(),
    })))
}

/// GET /signin - reachable only without a session
pub async fn signin(ctx: AppContext, Query(query): Query<RedirectQuery>) -> ApiResult<Value> {
    let redirect_to = checked_redirect(&query);
    let after_sign_in = redirect_to.unwrap_or(AUTHENTICATED_REDIRECT);
    let providers = social_providers(&ctx.env, after_sign_in).map_err(|e| {
        tracing::error!("Failed to build social sign-in URL: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    Ok(ApiResponse::success(json!({
        "title": "Sign In",
        "redirectTo": redirect_to,
        "afterSignIn": after_sign_in,
        "emailSignInUrl": format!("{}/sign-in/email", AUTH_BASE_PATH),
        "signUpUrl": link_with_redirect(SIGNUP_PATH, redirect_to),
        "providers": providers,
    })))
}

/// GET /signup - reachable only without a session
pub async fn signup(ctx: AppContext, Query(query): Query<RedirectQuery>) -> ApiResult<Value> {
    let redirect_to = checked_redirect(&query);
    let after_sign_up = redirect_to.unwrap_or(AUTHENTICATED_REDIRECT);
    let providers = social_providers(&ctx.env, after_sign_up).map_err(|e| {
        tracing::error!("Failed to build social sign-in URL: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    Ok(ApiResponse::success(json!({
        "title": "Sign Up",
        "emailSignUpUrl": format!("{}/sign-up/email", AUTH_BASE_PATH),
        "redirectTo": redirect_to,
        "afterSignUp": after_sign_up,
        "signInUrl": link_with_redirect(SIGNIN_PATH, redirect_to),
        "providers": providers,
    })))
}

/// GET /dashboard - layout data for the protected area
pub async fn dashboard(ctx: AppContext) -> ApiResult<Value> {
    let user = ctx.require_user()?;

    Ok(ApiResponse::success(json!({
        "title": "Dashboard",
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "image": user.image,
        },
        "navigation": NAVIGATION,
        "account": "/dashboard/account",
        "signOut": {
            "method": "POST",
            "url": format!("{}/sign-out", AUTH_BASE_PATH),
            "redirect": SIGNOUT_REDIRECT,
        },
    })))
}

/// GET /dashboard/account
pub async fn account(ctx: AppContext) -> ApiResult<Value> {
    let user = ctx.require_user()?;

    Ok(ApiResponse::success(json!({
        "title": "Account",
        "name": user.name,
        "email": user.email,
    })))
}
