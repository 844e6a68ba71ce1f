//! HS256-signed access tokens.
//!
//! Tokens use the compact JWT form `header.payload.signature`, each part
//! base64url-encoded without padding. Only `HS256` is accepted on the way in.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use concept_core::{ConceptError, ConceptResult};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime.
pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Hex id of the authenticated user.
    pub user_id: String,
    /// Email the user logged in with.
    pub email: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issue time, seconds since the epoch.
    pub iat: i64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Issues and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Minimum accepted secret length.
    pub const MIN_SECRET_LEN: usize = 32;

    /// Create an issuer. Secrets shorter than [`Self::MIN_SECRET_LEN`] are a
    /// configuration error.
    pub fn new(secret: &str) -> ConceptResult<Self> {
        if secret.is_empty() {
            return Err(ConceptError::Config(
                "JWT secret is required".to_string(),
            ));
        }
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(ConceptError::Config(format!(
                "JWT secret must be at least {} characters long",
                Self::MIN_SECRET_LEN
            )));
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::hours(ACCESS_TOKEN_TTL_HOURS),
        })
    }

    /// Override the token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn mac(&self) -> ConceptResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ConceptError::Config(format!("Invalid JWT secret: {e}")))
    }

    /// Issue a token for `user_id`/`email`.
    pub fn create_access_token(&self, user_id: &str, email: &str) -> ConceptResult<String> {
        if user_id.is_empty() || email.is_empty() {
            return Err(ConceptError::InvalidInput(
                "user_id and email are required".to_string(),
            ));
        }

        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token and return its claims.
    ///
    /// Returns `None` for malformed, badly signed, expired or incomplete
    /// tokens; callers treat every one of those as "not authenticated".
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        let mut parts = token.split('.');
        let (header_b64, payload_b64, sig_b64) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let header: Header = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_b64).ok()?).ok()?;
        if header.alg != "HS256" {
            debug!(alg = %header.alg, "Rejected token with unexpected algorithm");
            return None;
        }

        let signature = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
        let mut mac = self.mac().ok()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            debug!("Rejected token with bad signature");
            return None;
        }

        let claims: Claims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload_b64).ok()?).ok()?;
        if claims.user_id.is_empty() || claims.email.is_empty() {
            return None;
        }
        if claims.exp <= Utc::now().timestamp() {
            debug!(user_id = %claims.user_id, "Rejected expired token");
            return None;
        }
        Some(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-123";

    #[test]
    fn test_secret_length_enforced() {
        assert!(matches!(TokenIssuer::new(""), Err(ConceptError::Config(_))));
        assert!(matches!(
            TokenIssuer::new("short"),
            Err(ConceptError::Config(_))
        ));
        assert!(TokenIssuer::new(SECRET).is_ok());
    }

    #[test]
    fn test_create_and_verify() {
        let issuer = TokenIssuer::new(SECRET).unwrap();
        let token = issuer
            .create_access_token("507f1f77bcf86cd799439011", "ada@example.com")
            .unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = issuer.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, "507f1f77bcf86cd799439011");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn test_empty_subject_rejected() {
        let issuer = TokenIssuer::new(SECRET).unwrap();
        assert!(issuer.create_access_token("", "a@b.c").is_err());
        assert!(issuer.create_access_token("id", "").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = TokenIssuer::new(SECRET).unwrap();
        assert!(issuer.verify_token("invalid.token.here").is_none());
        assert!(issuer.verify_token("").is_none());
        assert!(issuer.verify_token("a.b.c.d").is_none());
    }

    #[test]
    fn test_other_secret_rejected() {
        let issuer = TokenIssuer::new(SECRET).unwrap();
        let other = TokenIssuer::new("another-secret-key-that-is-long-enough").unwrap();
        let token = other.create_access_token("id", "a@b.c").unwrap();
        assert!(issuer.verify_token(&token).is_none());
    }

    #[test]
    fn test_expired_rejected() {
        let issuer = TokenIssuer::new(SECRET)
            .unwrap()
            .with_ttl(Duration::seconds(-10));
        let token = issuer.create_access_token("id", "a@b.c").unwrap();
        assert!(issuer.verify_token(&token).is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issuer = TokenIssuer::new(SECRET).unwrap();
        let token = issuer.create_access_token("victim", "a@b.c").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = Claims {
            user_id: "attacker".into(),
            email: "a@b.c".into(),
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert!(issuer.verify_token(&forged).is_none());
    }
}
