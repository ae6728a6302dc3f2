//! Identity/Role resolution and access rules.
//!
//! Roles live in our users table, keyed by the external identity id. Lookups
//! for rendering are best-effort (`resolve_role` returns None on error);
//! enforcement helpers (`require_*`) return Unauthorized/Forbidden errors.

use crate::app_config;
use crate::error::{ApiError, ApiResult};
use crate::identity::Identity;
use crate::orm::users::{self, Role};
use moka::sync::Cache;
use once_cell::sync::Lazy;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::time::Duration;

/// Short-TTL cache for role lookups. Only positive hits are cached so a
/// freshly-synced user is visible immediately.
static ROLE_CACHE: Lazy<Cache<String, Role>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(60))
        .build()
});

/// Drop a cached role after a role mutation (admin change, SUSPEND).
pub fn invalidate_role(external_id: &str) {
    ROLE_CACHE.invalidate(external_id);
}

/// Look up the stored role for an external identity id.
///
/// Fails softly: lookup errors are logged and reported as None so callers
/// that only need best-effort role info for rendering never blow up a page.
pub async fn resolve_role(db: &DatabaseConnection, external_id: &str) -> Option<Role> {
    if let Some(role) = ROLE_CACHE.get(external_id) {
        return Some(role);
    }

    let found = users::Entity::find()
        .filter(users::Column::ExternalId.eq(external_id))
        .one(db)
        .await;

    match found {
        Ok(Some(user)) => {
            ROLE_CACHE.insert(external_id.to_string(), user.role);
            Some(user.role)
        }
        Ok(None) => None,
        Err(err) => {
            log::error!("role lookup failed for {}: {}", external_id, err);
            None
        }
    }
}

/// Require an authenticated identity; returns its external id.
pub fn require_identity(identity: Option<&Identity>) -> ApiResult<&Identity> {
    identity.ok_or(ApiError::Unauthorized)
}

/// Require the identity to hold exactly `role`.
pub async fn require_role(
    db: &DatabaseConnection,
    identity: Option<&Identity>,
    role: Role,
) -> ApiResult<String> {
    let identity = require_identity(identity)?;

    match resolve_role(db, &identity.external_id).await {
        Some(found) if found == role => Ok(identity.external_id.clone()),
        _ => Err(ApiError::forbidden("Insufficient permissions.")),
    }
}

/// Require the identity to hold one of `roles`.
pub async fn require_any_role(
    db: &DatabaseConnection,
    identity: Option<&Identity>,
    roles: &[Role],
) -> ApiResult<(String, Role)> {
    let identity = require_identity(identity)?;

    match resolve_role(db, &identity.external_id).await {
        Some(found) if roles.contains(&found) => Ok((identity.external_id.clone(), found)),
        _ => Err(ApiError::forbidden("Insufficient permissions.")),
    }
}

pub async fn require_admin(db: &DatabaseConnection, identity: Option<&Identity>) -> ApiResult<String> {
    require_role(db, identity, Role::Admin).await
}

/// How Student-Community access was granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    Role,
    Email,
}

/// The student-access decision table, separated from I/O.
///
/// VISITOR is a hard block: a VISITOR is denied even with a school email.
/// STUDENT passes on role alone. Any other role (or no stored role yet)
/// passes only if the email-domain check passed.
pub fn student_access_decision(
    role: Option<Role>,
    has_school_email: bool,
) -> Result<AccessType, ()> {
    match role {
        Some(Role::Visitor) => Err(()),
        Some(Role::Student) => Ok(AccessType::Role),
        _ if has_school_email => Ok(AccessType::Email),
        _ => Err(()),
    }
}

/// Grant Student-Community access per the composite rule.
pub async fn require_student_access(
    db: &DatabaseConnection,
    identity: Option<&Identity>,
) -> ApiResult<AccessType> {
    let identity = require_identity(identity)?;

    let role = resolve_role(db, &identity.external_id).await;
    let has_school_email = is_school_email(identity.email.as_deref());

    student_access_decision(role, has_school_email)
        .map_err(|_| ApiError::forbidden("Student role or school email required."))
}

/// Whether the email's domain is in the configured school allow-list.
///
/// An empty allow-list grants every logged-in user, matching the deployment
/// default before domains are configured.
pub fn is_school_email(email: Option<&str>) -> bool {
    let domains = app_config::school_email_domains();
    if domains.is_empty() {
        return true;
    }

    email
        .map(|e| email_in_domains(e, &domains))
        .unwrap_or(false)
}

/// Exact-match comparison of an email's domain against the allow-list.
pub fn email_in_domains(email: &str, domains: &[String]) -> bool {
    match email.rsplit_once('@') {
        Some((_, domain)) => domains.iter().any(|d| d == domain),
        None => false,
    }
}

/// The default role assigned when an identity is first synced.
///
/// STUDENT iff the primary email domain is in the allow-list, else VISITOR.
/// Unlike the access check, an empty allow-list assigns VISITOR; sync never
/// hands out STUDENT without a configured domain match.
pub fn initial_role_for_email(email: Option<&str>, domains: &[String]) -> Role {
    match email {
        Some(e) if email_in_domains(e, domains) => Role::Student,
        _ => Role::Visitor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> Vec<String> {
        vec!["school.example.com".to_string(), "alumni.example.com".to_string()]
    }

    #[test]
    fn email_domain_matching_is_exact() {
        assert!(email_in_domains("kim@school.example.com", &domains()));
        assert!(email_in_domains("lee@alumni.example.com", &domains()));
        assert!(!email_in_domains("kim@evil-school.example.com", &domains()));
        assert!(!email_in_domains("kim@sub.school.example.com", &domains()));
        assert!(!email_in_domains("not-an-email", &domains()));
    }

    #[test]
    fn initial_role_is_student_only_for_school_domains() {
        assert_eq!(
            initial_role_for_email(Some("kim@school.example.com"), &domains()),
            Role::Student
        );
        assert_eq!(
            initial_role_for_email(Some("kim@gmail.com"), &domains()),
            Role::Visitor
        );
        assert_eq!(initial_role_for_email(None, &domains()), Role::Visitor);
        // No configured domains: sync never assigns STUDENT
        assert_eq!(
            initial_role_for_email(Some("kim@school.example.com"), &[]),
            Role::Visitor
        );
    }

    #[test]
    fn student_role_passes_regardless_of_email() {
        assert_eq!(
            student_access_decision(Some(Role::Student), false),
            Ok(AccessType::Role)
        );
        assert_eq!(
            student_access_decision(Some(Role::Student), true),
            Ok(AccessType::Role)
        );
    }

    #[test]
    fn visitor_is_a_hard_block_even_with_school_email() {
        assert_eq!(student_access_decision(Some(Role::Visitor), true), Err(()));
        assert_eq!(student_access_decision(Some(Role::Visitor), false), Err(()));
    }

    #[test]
    fn other_roles_pass_only_via_email() {
        for role in [Role::Parent, Role::Staff, Role::Teacher, Role::Admin] {
            assert_eq!(
                student_access_decision(Some(role), true),
                Ok(AccessType::Email)
            );
            assert_eq!(student_access_decision(Some(role), false), Err(()));
        }
    }

    #[test]
    fn unknown_role_follows_email_check() {
        assert_eq!(student_access_decision(None, true), Ok(AccessType::Email));
        assert_eq!(student_access_decision(None, false), Err(()));
    }
}
