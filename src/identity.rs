//! Identity provider boundary.
//!
//! The auth provider in front of this service issues signed session tokens
//! (JWTs). We verify the signature with a shared secret and extract the
//! external identity id and email claims; everything else about the provider
//! is out of scope. Role data is ours, not the provider's; see `crate::role`.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Verified identity of the requester.
#[derive(Clone, Debug)]
pub struct Identity {
    /// External identity id ("sub" claim). The stable key for all ownership
    /// and authorship checks.
    pub external_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Verify a session token and extract the identity.
///
/// Returns None for any invalid, expired, or foreign token; callers treat the
/// request as a guest. An empty configured secret disables token acceptance
/// entirely rather than accepting unsigned tokens.
pub fn verify_session_token(token: &str) -> Option<Identity> {
    let secret = crate::app_config::auth().jwt_secret;
    if secret.is_empty() {
        log::warn!("auth.jwt_secret is not configured; rejecting session token");
        return None;
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    match decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Some(Identity {
            external_id: data.claims.sub,
            email: data.claims.email,
        }),
        Err(err) => {
            log::debug!("session token rejected: {}", err);
            None
        }
    }
}

/// Pull the bearer token out of an Authorization header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_strips_scheme() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer   spaced  "), Some("spaced"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }
}
