use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::OffsetDateTime;
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState};

/// Why a presented token was rejected. Callers collapse all of these into
/// one unauthorized outcome; the distinction only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    BadSignature,
    #[error("token malformed")]
    Malformed,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl_seconds: i64,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl TokenKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl_seconds: cfg.ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token with the configured lifetime.
    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        self.issue_with_ttl(user_id, self.ttl_seconds)
    }

    pub fn issue_with_ttl(&self, user_id: i64, ttl_seconds: i64) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc().unix_timestamp(), ttl_seconds)
    }

    fn issue_at(&self, user_id: i64, now: i64, ttl_seconds: i64) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + ttl_seconds,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, ttl_seconds, "jwt signed");
        Ok(token)
    }

    /// Returns the user id carried by a valid, unexpired token.
    /// A token is expired once `exp <= now`; there is no leeway.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            let kind = match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::ImmatureSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            };
            debug!(error = %e, reason = %kind, "jwt rejected");
            kind
        })?;

        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            debug!(user_id = data.claims.sub, "jwt rejected at expiry boundary");
            return Err(TokenError::Expired);
        }
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }
}
