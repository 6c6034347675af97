//! Bearer credential verification.
//!
//! Tokens are HS256 JWTs. With a shared secret configured the signature is
//! checked here; without one, signature checking is left to the gateway in
//! front of the service and only the registered claims (`exp`, and `iss` /
//! `aud` when configured) are validated.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use thiserror::Error;

use crate::config::TenancyConfig;

use super::claims::Claims;

/// A credential that could not be accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The `Authorization` header is not `Bearer <token>`.
    #[error("malformed authorization header")]
    MalformedHeader,

    /// The token has expired.
    #[error("token expired")]
    Expired,

    /// The signature does not match.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token could not be decoded or failed claim validation.
    #[error("invalid token: {reason}")]
    InvalidToken {
        /// What was wrong with it.
        reason: String,
    },

    /// No usable tenant claim and the fallback policy rejects.
    #[error("credential carries no tenant claim")]
    MissingTenant,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::InvalidToken {
                reason: err.to_string(),
            },
        }
    }
}

/// Verifies bearer tokens and yields their claims.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
    verifies_signature: bool,
}

impl JwtVerifier {
    /// Builds a verifier from the tenancy settings.
    pub fn new(config: &TenancyConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);

        let (key, verifies_signature) = match &config.jwt_secret {
            Some(secret) => (DecodingKey::from_secret(secret.as_bytes()), true),
            None => {
                validation.insecure_disable_signature_validation();
                (DecodingKey::from_secret(&[]), false)
            }
        };

        match &config.jwt_audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &config.jwt_issuer {
            validation.set_issuer(&[issuer]);
        }

        if !verifies_signature {
            tracing::warn!("No JWT secret configured; token signatures are not verified");
        }

        Self {
            key,
            validation,
            verifies_signature,
        }
    }

    /// Returns `true` if signatures are checked.
    pub fn verifies_signature(&self) -> bool {
        self.verifies_signature
    }

    /// Verifies `token` and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }

    /// Verifies the request's bearer token, if any.
    ///
    /// A request without an `Authorization` header yields empty claims.
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(Claims::empty());
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedHeader)?;

        self.verify(token)
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("verifies_signature", &self.verifies_signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "unit-test-secret-with-enough-length!";

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn mint(secret: &str, claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier(secret: Option<&str>) -> JwtVerifier {
        JwtVerifier::new(&TenancyConfig {
            jwt_secret: secret.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_valid_token() {
        let token = mint(SECRET, json!({"tenant": "acme", "sub": "u1", "exp": now() + 600}));
        let claims = verifier(Some(SECRET)).verify(&token).unwrap();
        assert_eq!(claims.get_str("tenant"), Some("acme"));
        assert_eq!(claims.subject(), Some("u1"));
    }

    #[test]
    fn test_expired_token() {
        let token = mint(SECRET, json!({"tenant": "acme", "exp": now() - 3600}));
        assert_eq!(verifier(Some(SECRET)).verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_wrong_secret() {
        let token = mint(
            "some-other-secret-that-is-long-enough",
            json!({"tenant": "acme", "exp": now() + 600}),
        );
        assert_eq!(
            verifier(Some(SECRET)).verify(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_unverified_mode_still_checks_expiry() {
        let v = verifier(None);
        assert!(!v.verifies_signature());

        let fresh = mint("gateway-secret", json!({"tenant": "acme", "exp": now() + 600}));
        assert!(v.verify(&fresh).is_ok());

        let stale = mint("gateway-secret", json!({"tenant": "acme", "exp": now() - 3600}));
        assert_eq!(v.verify(&stale), Err(AuthError::Expired));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            verifier(Some(SECRET)).verify("not-a-jwt"),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_audience_enforced_when_configured() {
        let v = JwtVerifier::new(&TenancyConfig {
            jwt_secret: Some(SECRET.to_string()),
            jwt_audience: Some("workforce-api".to_string()),
            ..Default::default()
        });
        let good = mint(SECRET, json!({"aud": "workforce-api", "exp": now() + 600}));
        let bad = mint(SECRET, json!({"aud": "billing-api", "exp": now() + 600}));
        assert!(v.verify(&good).is_ok());
        assert!(v.verify(&bad).is_err());
    }

    #[test]
    fn test_headers() {
        let v = verifier(Some(SECRET));

        assert!(v.verify_headers(&HeaderMap::new()).unwrap().is_empty());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(v.verify_headers(&headers), Err(AuthError::MalformedHeader));

        let token = mint(SECRET, json!({"tenant": "acme", "exp": now() + 600}));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(
            v.verify_headers(&headers).unwrap().get_str("tenant"),
            Some("acme")
        );
    }
}
