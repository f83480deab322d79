//! Per-request context: session resolution, context construction and the typed
//! request-scoped slot handlers read it from.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, Extensions, HeaderMap},
};
use std::{ops::Deref, sync::Arc};
use thiserror::Error;

use crate::auth::{AuthError, AuthSession, AuthUser, SessionProvider, SessionRecord};
use crate::config::{Env, PublicEnv};
use crate::database::Database;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum ContextError {
    /// The context middleware did not run before this read.
    #[error("request context read before it was populated")]
    Missing,

    #[error("no authenticated user in request context")]
    NoUser,
}

/// Normalizes the provider's session lookup into "session or none".
#[derive(Clone)]
pub struct SessionResolver {
    provider: Arc<dyn SessionProvider>,
}

impl SessionResolver {
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        Self { provider }
    }

    /// Lookup failures propagate; they are never downgraded to `None`.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Option<AuthSession>, AuthError> {
        self.provider.get_session(headers).await
    }

    pub async fn revoke(&self, headers: &HeaderMap) -> Result<bool, AuthError> {
        self.provider.revoke_session(headers).await
    }
}

/// Holds the process-wide pieces every request context shares.
#[derive(Clone)]
pub struct ContextBuilder {
    app_version: Arc<str>,
    env: Arc<Env>,
    public_env: Arc<PublicEnv>,
    db: Database,
}

impl ContextBuilder {
    pub fn new(env: Arc<Env>, db: Database) -> Self {
        Self {
            app_version: Arc::from(env.app_version()),
            public_env: Arc::new(env.public()),
            env,
            db,
        }
    }

    pub fn build(&self, auth: Option<AuthSession>) -> RequestContext {
        RequestContext {
            app_version: Arc::clone(&self.app_version),
            env: Arc::clone(&self.env),
            public_env: Arc::clone(&self.public_env),
            db: self.db.clone(),
            auth,
        }
    }
}

/// Immutable per-request bundle of session, environment and shared handles.
///
/// User and session are stored as a single `Option<AuthSession>`, so one can
/// never be present without the other.
#[derive(Debug)]
pub struct RequestContext {
    pub app_version: Arc<str>,
    pub env: Arc<Env>,
    pub public_env: Arc<PublicEnv>,
    pub db: Database,
    auth: Option<AuthSession>,
}

impl RequestContext {
    pub fn auth(&self) -> Option<&AuthSession> {
        self.auth.as_ref()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.auth.as_ref().map(|a| &a.user)
    }

    pub fn session(&self) -> Option<&SessionRecord> {
        self.auth.as_ref().map(|a| &a.session)
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// Guard for pages under the protected prefix, where access control
    /// already guarantees a user.
    pub fn require_user(&self) -> Result<&AuthUser, ContextError> {
        self.user().ok_or(ContextError::NoUser)
    }
}

/// Typed request-scoped slot holding the current [`RequestContext`].
#[derive(Clone, Debug)]
pub struct AppContext(pub Arc<RequestContext>);

impl AppContext {
    pub fn new(ctx: RequestContext) -> Self {
        Self(Arc::new(ctx))
    }

    pub fn from_extensions(extensions: &Extensions) -> Result<Self, ContextError> {
        extensions
            .get::<AppContext>()
            .cloned()
            .ok_or(ContextError::Missing)
    }
}

impl Deref for AppContext {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AppContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions)?)
    }
}
