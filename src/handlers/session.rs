use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};

use crate::app::AppState;
use crate::auth::AuthSession;
use crate::constants::SIGNOUT_REDIRECT;
use crate::context::AppContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/session - current `{ user, session }` or `null`
pub async fn session_get(ctx: AppContext) -> ApiResult<Option<AuthSession>> {
    Ok(ApiResponse::success(ctx.auth().cloned()))
}

/// POST /api/auth/sign-out - revoke the session, clear the cookie and send the client home
pub async fn sign_out(
    State(state): State<AppState>,
    ctx: AppContext,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let revoked = state.resolver.revoke(&headers).await?;

    if let Some(user) = ctx.user() {
        tracing::info!("User {} signed out (session revoked: {})", user.id, revoked);
    }

    let cleared = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        ctx.env.session_cookie_name
    );

    Ok(([(header::SET_COOKIE, cleared)], Redirect::to(SIGNOUT_REDIRECT)).into_response())
}
