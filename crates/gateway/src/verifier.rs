//! HS256 access-token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use mkdi_auth::{IdentityClaims, TokenValidationError, TokenVerifier, validate_claims};

/// Verifies tokens signed with a shared secret.
#[derive(Clone)]
pub struct Hs256Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256Verifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time window is checked by `validate_claims` against the request clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenVerifier for Hs256Verifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map_err(map_jwt_error)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenValidationError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenValidationError::BadSignature,
        ErrorKind::ExpiredSignature => TokenValidationError::Expired,
        ErrorKind::ImmatureSignature => TokenValidationError::NotYetValid,
        _ => TokenValidationError::Malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    use mkdi_auth::Role;
    use mkdi_core::PrincipalId;

    use super::*;

    fn mint(secret: &str, iat: DateTime<Utc>, exp: DateTime<Utc>) -> String {
        let claims = IdentityClaims {
            sub: PrincipalId::new(),
            preferred_username: None,
            email: None,
            roles: vec![Role::new("office_admin")],
            realm_access: None,
            organization_id: None,
            office_id: None,
            iat,
            exp,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let now = Utc::now();
        let token = mint("k", now - Duration::seconds(5), now + Duration::minutes(5));
        let claims = Hs256Verifier::new(b"k").verify(&token, now).unwrap();
        assert_eq!(claims.roles, vec![Role::new("office_admin")]);
    }

    #[test]
    fn rejects_foreign_signature() {
        let now = Utc::now();
        let token = mint("other", now - Duration::seconds(5), now + Duration::minutes(5));
        let err = Hs256Verifier::new(b"k").verify(&token, now).unwrap_err();
        assert_eq!(err, TokenValidationError::BadSignature);
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now();
        let token = mint("k", now - Duration::minutes(10), now - Duration::minutes(5));
        let err = Hs256Verifier::new(b"k").verify(&token, now).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }

    #[test]
    fn rejects_garbage() {
        let err = Hs256Verifier::new(b"k").verify("not.a.jwt", Utc::now()).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }
}
