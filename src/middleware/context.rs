use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::context::AppContext;
use crate::error::ApiError;

/// Resolves the session and registers the request context before anything
/// downstream runs.
///
/// A failed lookup short-circuits with a server error; handlers only ever see
/// a fully built context. If the client disconnects, axum drops this future and
/// the in-flight lookup with it.
pub async fn context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = state.resolver.resolve(request.headers()).await?;

    if let Some(auth) = &auth {
        tracing::debug!("Resolved session {} for user {}", auth.session.id, auth.user.id);
    }

    let ctx = state.contexts.build(auth);
    request.extensions_mut().insert(AppContext::new(ctx));

    Ok(next.run(request).await)
}
