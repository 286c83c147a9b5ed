use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use base64ct::{Base64, Encoding};
use tracing::warn;

use crate::{
    auth::{repo_types::User, services::resolve},
    error::ApiError,
    state::AppState,
};

/// The user resolved from the request's `Authorization` header.
///
/// Accepts `Basic base64(identifier:secret)` where the identifier is either
/// an email or a token, and `Bearer <token>`.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                ApiError::Unauthorized
            })?;

        let (identifier, secret) = parse_credentials(header).ok_or_else(|| {
            warn!("unsupported or undecodable Authorization header");
            ApiError::Unauthorized
        })?;

        let user = resolve(state.users.as_ref(), &state.keys, &identifier, &secret).await?;
        Ok(AuthUser(user))
    }
}

pub(crate) fn parse_credentials(header: &str) -> Option<(String, String)> {
    if let Some(encoded) = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))
    {
        let decoded = Base64::decode_vec(encoded.trim()).ok()?;
        let pair = String::from_utf8(decoded).ok()?;
        let (identifier, secret) = pair.split_once(':').unwrap_or((pair.as_str(), ""));
        return Some((identifier.to_string(), secret.to_string()));
    }
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?;
    Some((token.trim().to_string(), String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(raw: &str) -> String {
        format!("Basic {}", Base64::encode_string(raw.as_bytes()))
    }

    #[test]
    fn basic_splits_on_first_colon() {
        assert_eq!(
            parse_credentials(&basic("a@b.io:pa:ss")),
            Some(("a@b.io".into(), "pa:ss".into()))
        );
    }

    #[test]
    fn basic_without_colon_has_empty_secret() {
        assert_eq!(
            parse_credentials(&basic("eyJtoken")),
            Some(("eyJtoken".into(), String::new()))
        );
    }

    #[test]
    fn bearer_has_empty_secret() {
        assert_eq!(
            parse_credentials("Bearer abc.def.ghi"),
            Some(("abc.def.ghi".into(), String::new()))
        );
    }

    #[test]
    fn rejects_unknown_scheme_and_bad_base64() {
        assert_eq!(parse_credentials("Digest abc"), None);
        assert_eq!(parse_credentials("Basic !!!"), None);
    }
}
