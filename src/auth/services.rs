use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::{
    auth::{
        jwt::TokenKeys,
        password::{hash_password, verify_password},
        repo::UserRepo,
        repo_types::User,
    },
    error::{ApiError, RepoError},
};

pub const MAX_EMAIL_LEN: usize = 80;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Register a new user. Missing fields, a malformed email or a taken email
/// are all `BadRequest`.
pub async fn register(
    users: &dyn UserRepo,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<User, ApiError> {
    let (Some(email), Some(password)) = (email, password) else {
        warn!("registration missing email or password");
        return Err(ApiError::BadRequest);
    };
    if password.is_empty() || !is_valid_email(email) {
        warn!("registration rejected: invalid email or empty password");
        return Err(ApiError::BadRequest);
    }

    if users.find_by_email(email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::BadRequest);
    }

    let hash = hash_password(password)?;
    let user = match users.create(email, &hash).await {
        Ok(u) => u,
        Err(RepoError::UniqueViolation) => {
            warn!(email = %email, "email registered concurrently");
            return Err(ApiError::BadRequest);
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Resolve presented credentials to a user.
///
/// The identifier is first tried as a bearer token; the secret is ignored on
/// that path. Failing that it is treated as an email and the secret checked
/// against the stored hash. Every failure is `Unauthorized`.
pub async fn resolve(
    users: &dyn UserRepo,
    keys: &TokenKeys,
    identifier: &str,
    secret: &str,
) -> Result<User, ApiError> {
    match keys.verify(identifier) {
        Ok(user_id) => {
            if let Some(user) = users.find_by_id(user_id).await? {
                debug!(user_id, "resolved by token");
                return Ok(user);
            }
            warn!(user_id, "token for unknown user");
        }
        Err(reason) => debug!(%reason, "identifier is not a usable token"),
    }

    let Some(user) = users.find_by_email(identifier).await? else {
        warn!("unknown email presented");
        return Err(ApiError::Unauthorized);
    };
    if !verify_password(secret, &user.password_hash) {
        warn!(user_id = user.id, "invalid password");
        return Err(ApiError::Unauthorized);
    }
    debug!(user_id = user.id, "resolved by password");
    Ok(user)
}
