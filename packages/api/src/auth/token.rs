//! Signed session tokens (HS256 JWT).
//!
//! The token only carries the user id. Expiry matches the cookie lifetime so a
//! copied cookie value stops working when the cookie itself would have.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies session tokens with a server-side secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, user_id: Uuid) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Token(e.to_string()))
    }

    /// Fails on a bad signature, a malformed token or an expired one.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", Duration::days(365))
    }

    #[test]
    fn test_issue_then_verify() {
        let user_id = Uuid::new_v4();
        let token = signer().issue(user_id).unwrap();
        let claims = signer().verify(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = signer().issue(Uuid::new_v4()).unwrap();
        let other = TokenSigner::new("another-secret", Duration::days(365));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = signer().issue(Uuid::new_v4()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = signer().issue(Uuid::new_v4()).unwrap();
        parts[1] = forged.split('.').nth(1).unwrap().to_string();
        assert!(signer().verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = TokenSigner::new("test-secret", Duration::hours(-1));
        let token = expired.issue(Uuid::new_v4()).unwrap();
        assert!(signer().verify(&token).is_err());
    }
}
