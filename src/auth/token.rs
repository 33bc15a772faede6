use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AuthError;

/// Lifetime of an issued token and of the cookie carrying it.
pub const SESSION_TTL_DAYS: i64 = 30;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("unexpected signing algorithm {0:?}")]
    UnexpectedAlgorithm(Algorithm),
    #[error("token expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies HMAC-signed session tokens under one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    keys: Option<Keys>,
}

impl TokenCodec {
    /// A missing or blank secret yields a codec that refuses everything.
    pub fn new(secret: Option<&str>) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|s| Keys {
            encoding: EncodingKey::from_secret(s.as_bytes()),
            decoding: DecodingKey::from_secret(s.as_bytes()),
        });
        Self { keys }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    pub fn issue(&self, subject: i64) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: i64, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let keys = self.keys.as_ref().ok_or(TokenError::MissingSecret)?;
        let claims = Claims {
            sub: subject,
            exp: (issued_at + Duration::days(SESSION_TTL_DAYS)).timestamp(),
            iat: issued_at.timestamp(),
        };
        encode(&Header::new(SIGNING_ALGORITHM), &claims, &keys.encoding).map_err(TokenError::Signing)
    }

    /// Verifies signature, algorithm family and expiry. Every failure collapses
    /// into [`AuthError::Unauthenticated`]; the reason is only logged.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.check(token, Utc::now().timestamp()).map_err(|reason| {
            tracing::debug!(%reason, "rejected session token");
            AuthError::Unauthenticated
        })
    }

    fn check(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let keys = self.keys.as_ref().ok_or(TokenError::MissingSecret)?;

        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if !HMAC_FAMILY.contains(&header.alg) {
            return Err(TokenError::UnexpectedAlgorithm(header.alg));
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = HMAC_FAMILY.to_vec();
        // Expiry is checked below against `now` with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm => TokenError::UnexpectedAlgorithm(header.alg),
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}
