//! Signed, time-limited bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the user id as `sub` and an expiry as
//! `exp`. Expiry is enforced from the embedded timestamp only, so the
//! verifying clock must stay close to the issuing one; `leeway_secs` is the
//! only tolerance applied.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    pub typ: TokenKind,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    leeway_secs: u64,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, leeway_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            leeway_secs,
        }
    }

    pub fn issue(&self, user_id: Uuid, kind: TokenKind, ttl: Duration) -> Result<String, DomainError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: kind,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(format!("Failed to sign token: {e}")))
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<String, DomainError> {
        self.issue(user_id, TokenKind::Access, self.access_ttl)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, DomainError> {
        self.issue(
            user_id,
            TokenKind::Refresh,
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
        )
    }

    /// Checks signature, shape and expiry, and returns the subject.
    pub fn verify(&self, token: &str) -> Result<Uuid, DomainError> {
        let claims = self.decode(token)?;
        subject(&claims)
    }

    /// Like [`verify`](Self::verify), additionally requiring the `typ` claim.
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Uuid, DomainError> {
        let claims = self.decode(token)?;
        if claims.typ != kind {
            return Err(DomainError::InvalidToken(format!(
                "expected {kind:?} token, got {:?}",
                claims.typ
            )));
        }
        subject(&claims)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, DomainError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = self.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| DomainError::InvalidToken(e.to_string()))
    }
}

fn subject(claims: &Claims) -> Result<Uuid, DomainError> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| DomainError::InvalidToken("subject is not a user id".to_string()))
}
