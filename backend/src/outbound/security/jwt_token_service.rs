//! HMAC-signed JWT implementation of the `TokenService` port.
//!
//! Expiry is checked against the injected clock rather than the library's
//! wall-clock check so token lifetimes are testable.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{TokenService, TokenServiceError};
use crate::domain::{AccessToken, EmailAddress, TokenClaims};

/// HMAC algorithms accepted for signing.
pub const SUPPORTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and validates bearer tokens whose subject is the account email.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    /// Build a service signing with `secret`. Tokens live for `ttl`.
    pub fn new(secret: &[u8], algorithm: Algorithm, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            ttl,
            clock,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, TokenServiceError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| TokenServiceError::invalid("timestamp out of range"))
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: &EmailAddress) -> Result<AccessToken, TokenServiceError> {
        let now = self.clock.utc();
        let claims = JwtClaims {
            sub: subject.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map(AccessToken::new)
            .map_err(|err| TokenServiceError::encoding(err.to_string()))
    }

    fn validate(&self, token: &str) -> Result<TokenClaims, TokenServiceError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|err| TokenServiceError::invalid(err.to_string()))?;
        let claims = data.claims;
        if claims.exp <= self.clock.utc().timestamp() {
            return Err(TokenServiceError::expired());
        }
        Ok(TokenClaims {
            subject: claims.sub,
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
        })
    }
}
