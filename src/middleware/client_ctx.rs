//! Per-request client context.
//!
//! Extracted at the start of every handler. Holds the verified identity (or
//! nothing, for guests) and exposes the authorization helpers handlers use.
//! Role lookups go through `crate::role` so core logic never reaches for
//! ambient session state.

use crate::error::{ApiError, ApiResult};
use crate::identity::{self, Identity};
use crate::orm::users::Role;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpRequest};
use sea_orm::DatabaseConnection;
use std::future::{ready, Ready};

/// Session cookie set by the identity provider's frontend SDK.
const SESSION_COOKIE: &str = "__session";

/// Client context passed to routes.
#[derive(Clone, Debug, Default)]
pub struct ClientCtx {
    identity: Option<Identity>,
}

impl ClientCtx {
    pub fn from_identity(identity: Option<Identity>) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns the external identity id, or None for guests.
    pub fn get_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.external_id.as_str())
    }

    pub fn get_email(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.email.as_deref())
    }

    pub fn is_user(&self) -> bool {
        self.identity.is_some()
    }

    /// Require a logged-in user. Returns the external id or Unauthorized.
    pub fn require_login(&self) -> ApiResult<&str> {
        self.get_id().ok_or(ApiError::Unauthorized)
    }

    /// Require a logged-in user and return the full identity.
    pub fn require_identity(&self) -> ApiResult<&Identity> {
        self.identity().ok_or(ApiError::Unauthorized)
    }

    /// Best-effort role of the current user; None for guests and on lookup
    /// failure.
    pub async fn role(&self, db: &DatabaseConnection) -> Option<Role> {
        match self.get_id() {
            Some(id) => crate::role::resolve_role(db, id).await,
            None => None,
        }
    }

    pub async fn is_admin(&self, db: &DatabaseConnection) -> bool {
        self.role(db).await == Some(Role::Admin)
    }

    /// Require the ADMIN role. Returns the external id.
    pub async fn require_admin(&self, db: &DatabaseConnection) -> ApiResult<String> {
        crate::role::require_admin(db, self.identity()).await
    }

    /// Require one of `roles`. Returns the external id and the matched role.
    pub async fn require_any_role(
        &self,
        db: &DatabaseConnection,
        roles: &[Role],
    ) -> ApiResult<(String, Role)> {
        crate::role::require_any_role(db, self.identity(), roles).await
    }

    /// Require Student-Community access (STUDENT role, or a school email for
    /// any non-VISITOR role).
    pub async fn require_student_access(
        &self,
        db: &DatabaseConnection,
    ) -> ApiResult<crate::role::AccessType> {
        crate::role::require_student_access(db, self.identity()).await
    }
}

/// Pull the session token from the Authorization header, falling back to the
/// provider's session cookie.
fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = identity::bearer_token(value) {
            return Some(token.to_string());
        }
    }

    req.cookie(SESSION_COOKIE).map(|c| c.value().to_string())
}

impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    /// Never fails: an absent or invalid token yields a guest context, and
    /// each endpoint decides what guests may do.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let identity = token_from_request(req)
            .as_deref()
            .and_then(identity::verify_session_token);

        ready(Ok(ClientCtx::from_identity(identity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_context_has_no_identity() {
        let ctx = ClientCtx::default();
        assert!(!ctx.is_user());
        assert!(ctx.get_id().is_none());
        assert!(matches!(ctx.require_login(), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn identity_context_exposes_id_and_email() {
        let ctx = ClientCtx::from_identity(Some(Identity {
            external_id: "user_abc".to_string(),
            email: Some("kim@school.example.com".to_string()),
        }));
        assert!(ctx.is_user());
        assert_eq!(ctx.get_id(), Some("user_abc"));
        assert_eq!(ctx.get_email(), Some("kim@school.example.com"));
        assert_eq!(ctx.require_login().unwrap(), "user_abc");
    }
}
