use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;

/// Role assigned when the token carries no `role` claim.
const DEFAULT_ROLE: &str = "user";

/// Access token (JWT) claims as issued by the auth service.
///
/// Every field is optional at the serde level; presence rules are enforced
/// when the identity is derived, not while decoding. `exp` is checked by
/// `jsonwebtoken::Validation` when present.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub exp: Option<u64>,
}

/// Verified identity derived from token claims.
///
/// - `user_id` comes from the `user_id` claim, falling back to `sub`
/// - `role` defaults to `"user"` when absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub email: Option<String>,
    pub role: String,
}

/// Classified outcome of access-token verification.
///
/// The split matters to the caller: `Expired` and `Invalid` are the token's
/// own fault (401), `Fault` is ours (500).
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("token has expired")]
    Expired,
    #[error("jwt verification failed: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("token carries neither 'user_id' nor 'sub'")]
    MissingSubject,
    #[error("verification fault: {0}")]
    Fault(jsonwebtoken::errors::Error),
}

/// HS256 access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Self {
        let decoding_key = DecodingKey::from_secret(secret);

        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is validated when present but tokens without it stay valid.
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Verify signature + expiry and decode the raw claims.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(classify)
    }

    /// Verify, then convert claims into the identity the rest of the gateway
    /// consumes. This is the entry-point for the middleware.
    pub fn verify_identity(&self, token: &str) -> Result<VerifiedIdentity, AccessJwtError> {
        let claims = self.verify(token)?;

        // An empty subject would propagate a meaningless identity downstream;
        // reject it the same way as a token with no subject at all.
        let user_id = claims
            .user_id
            .or(claims.sub)
            .filter(|id| !id.trim().is_empty())
            .ok_or(AccessJwtError::MissingSubject)?;

        Ok(VerifiedIdentity {
            user_id,
            email: claims.email,
            role: claims.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        })
    }
}

fn classify(e: jsonwebtoken::errors::Error) -> AccessJwtError {
    match e.kind() {
        ErrorKind::ExpiredSignature => AccessJwtError::Expired,
        // Key-material or crypto-backend failures are not the caller's token
        // being bad; surface them as an internal fault.
        ErrorKind::InvalidKeyFormat | ErrorKind::Signing(_) | ErrorKind::Provider(_) => {
            AccessJwtError::Fault(e)
        }
        _ => AccessJwtError::Invalid(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"test-secret";

    fn sign(claims: &serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    fn service() -> AuthService {
        AuthService::new(SECRET, 0)
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 600
    }

    #[test]
    fn valid_token_yields_identity() {
        let token = sign(&json!({
            "user_id": "user123",
            "email": "test@example.com",
            "role": "admin",
            "exp": future_exp(),
        }));

        let identity = service().verify_identity(&token).unwrap();
        assert_eq!(identity.user_id, "user123");
        assert_eq!(identity.email.as_deref(), Some("test@example.com"));
        assert_eq!(identity.role, "admin");
    }

    #[test]
    fn sub_is_used_when_user_id_is_absent() {
        let token = sign(&json!({ "sub": "sub-42", "exp": future_exp() }));

        let identity = service().verify_identity(&token).unwrap();
        assert_eq!(identity.user_id, "sub-42");
        assert_eq!(identity.email, None);
    }

    #[test]
    fn user_id_wins_over_sub() {
        let token = sign(&json!({
            "user_id": "primary",
            "sub": "fallback",
            "exp": future_exp(),
        }));

        let identity = service().verify_identity(&token).unwrap();
        assert_eq!(identity.user_id, "primary");
    }

    #[test]
    fn role_defaults_to_user() {
        let token = sign(&json!({ "user_id": "user123", "exp": future_exp() }));

        let identity = service().verify_identity(&token).unwrap();
        assert_eq!(identity.role, "user");
    }

    #[test]
    fn token_without_exp_is_accepted() {
        let token = sign(&json!({ "user_id": "user123" }));

        assert!(service().verify_identity(&token).is_ok());
    }

    #[test]
    fn missing_subject_is_rejected() {
        let token = sign(&json!({ "email": "test@example.com", "exp": future_exp() }));

        let err = service().verify_identity(&token).unwrap_err();
        assert!(matches!(err, AccessJwtError::MissingSubject));
    }

    #[test]
    fn empty_subject_is_rejected() {
        let token = sign(&json!({ "user_id": "", "exp": future_exp() }));

        let err = service().verify_identity(&token).unwrap_err();
        assert!(matches!(err, AccessJwtError::MissingSubject));
    }

    #[test]
    fn expired_token_is_classified_as_expired() {
        let token = sign(&json!({
            "user_id": "user123",
            "exp": chrono::Utc::now().timestamp() - 600,
        }));

        let err = service().verify_identity(&token).unwrap_err();
        assert!(matches!(err, AccessJwtError::Expired));
    }

    #[test]
    fn wrong_signature_is_classified_as_invalid() {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &json!({ "user_id": "user123", "exp": future_exp() }),
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();

        let err = service().verify_identity(&token).unwrap_err();
        assert!(matches!(err, AccessJwtError::Invalid(_)));
    }

    #[test]
    fn garbage_token_is_classified_as_invalid() {
        let err = service().verify_identity("not.a.jwt").unwrap_err();
        assert!(matches!(err, AccessJwtError::Invalid(_)));
    }

    #[test]
    fn key_format_errors_are_classified_as_fault() {
        let err = classify(jsonwebtoken::errors::Error::from(
            ErrorKind::InvalidKeyFormat,
        ));
        assert!(matches!(err, AccessJwtError::Fault(_)));
    }

    #[test]
    fn verification_is_deterministic_for_identical_input() {
        let svc = service();
        let token = sign(&json!({ "user_id": "user123", "exp": future_exp() }));

        let first = svc.verify_identity(&token).unwrap();
        let second = svc.verify_identity(&token).unwrap();
        assert_eq!(first, second);
    }
}
