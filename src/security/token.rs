use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::v1::user::UserRecord;

/// Claims of a user-facing access token
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserClaims {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
    /// Expiry as a Unix timestamp
    pub exp: i64,
}

impl UserClaims {
    fn new(user: &UserRecord, expires_at: DateTime<Utc>) -> Self {
        Self {
            username: user.username.clone(),
            firstname: user.first_name.clone(),
            lastname: user.last_name.clone(),
            role: user.role.clone(),
            exp: expires_at.timestamp(),
        }
    }
}

/// Claims of a token presented to the users API
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceClaims {
    pub username: String,
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// A freshly signed token together with its absolute expiry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime {0:?} is out of range")]
    Lifetime(Duration),
}

/// Stateless HS256 token issuer
///
/// Issued tokens are not tracked; a token is valid until its `exp`.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    service_ttl: Duration,
    service_scope: String,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], service_ttl: Duration, service_scope: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            service_ttl,
            service_scope: service_scope.into(),
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            config.secret.as_bytes(),
            Duration::from_secs(config.service_token_ttl),
            config.service_scope.clone(),
        )
    }

    /// Sign an access token for `user` valid for `ttl` from now
    pub fn issue(&self, user: &UserRecord, ttl: Duration) -> Result<SignedToken, TokenError> {
        self.issue_at(user, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        user: &UserRecord,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<SignedToken, TokenError> {
        let expires_at = expiry(now, ttl)?;
        let claims = UserClaims::new(user, expires_at);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;

        Ok(SignedToken { token, expires_at })
    }

    /// Sign a short-lived, scope-tagged token identifying this service to the users API
    pub fn service_token(&self, username: &str) -> Result<String, TokenError> {
        let expires_at = expiry(Utc::now(), self.service_ttl)?;
        let claims = ServiceClaims {
            username: username.to_string(),
            scope: self.service_scope.clone(),
            exp: Some(expires_at.timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Check signature and expiry of an access token
    pub fn verify(&self, token: &str) -> Result<UserClaims, TokenError> {
        decode::<UserClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    /// Check signature and expiry of a service token
    pub fn verify_service(&self, token: &str) -> Result<ServiceClaims, TokenError> {
        decode::<ServiceClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, TokenError> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(TokenError::Lifetime(ttl))
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("service_ttl", &self.service_ttl)
            .field("service_scope", &self.service_scope)
            .finish_non_exhaustive()
    }
}
