use crate::Auth0Config;
use axum::http::StatusCode;
use jsonwebtoken::{
    decode, decode_header, errors::ErrorKind, jwk::JwkSet, Algorithm, DecodingKey, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Rejection raised while checking a bearer token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {description}")]
pub struct AuthError {
    pub code: &'static str,
    pub description: &'static str,
    pub status: StatusCode,
}

impl AuthError {
    const fn new(status: StatusCode, code: &'static str, description: &'static str) -> Self {
        Self {
            code,
            description,
            status,
        }
    }

    pub const HEADER_MISSING: Self = Self::new(
        StatusCode::UNAUTHORIZED,
        "authorization_header_missing",
        "Authorization header is expected.",
    );
    pub const NOT_BEARER: Self = Self::new(
        StatusCode::UNAUTHORIZED,
        "invalid_header",
        "Authorization header must start with \"Bearer\".",
    );
    pub const TOKEN_NOT_FOUND: Self =
        Self::new(StatusCode::UNAUTHORIZED, "invalid_header", "Token not found.");
    pub const NOT_BEARER_TOKEN: Self = Self::new(
        StatusCode::UNAUTHORIZED,
        "invalid_header",
        "Authorization header must be bearer token.",
    );
    pub const MALFORMED: Self = Self::new(
        StatusCode::UNAUTHORIZED,
        "invalid_header",
        "Authorization malformed.",
    );
    pub const UNKNOWN_KEY: Self = Self::new(
        StatusCode::BAD_REQUEST,
        "invalid_header",
        "Unable to find the appropriate key.",
    );
    pub const EXPIRED: Self =
        Self::new(StatusCode::UNAUTHORIZED, "token_expired", "Token expired.");
    pub const INCORRECT_CLAIMS: Self = Self::new(
        StatusCode::UNAUTHORIZED,
        "invalid_claims",
        "Incorrect claims. Please, check the audience and issuer.",
    );
    pub const UNPARSEABLE: Self = Self::new(
        StatusCode::BAD_REQUEST,
        "invalid_header",
        "Unable to parse authentication token.",
    );
    pub const NO_PERMISSIONS: Self = Self::new(
        StatusCode::BAD_REQUEST,
        "invalid_claims",
        "Permissions not included in JWT.",
    );
    pub const FORBIDDEN: Self =
        Self::new(StatusCode::FORBIDDEN, "unauthorized", "Permission not found.");
}

/// Claims of an Auth0 access token that the API looks at.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

impl Claims {
    pub fn check_permission(&self, permission: &str) -> Result<(), AuthError> {
        let permissions = self.permissions.as_ref().ok_or(AuthError::NO_PERMISSIONS)?;

        if permissions.iter().any(|granted| granted == permission) {
            Ok(())
        } else {
            Err(AuthError::FORBIDDEN)
        }
    }
}

/// Verifies RS256 access tokens minted by the configured Auth0 tenant.
#[derive(Clone)]
pub struct Authenticator {
    issuer: String,
    audience: String,
    keys: Arc<JwkSet>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("keys", &self.keys.keys.len())
            .finish()
    }
}

impl Authenticator {
    /// Fetches the tenant's signing keys once.
    pub async fn discover(config: &Auth0Config) -> anyhow::Result<Self> {
        let jwks_url = config.jwks_url();
        tracing::debug!("fetching signing keys from {}", jwks_url);

        let keys: JwkSet = reqwest::get(&jwks_url)
            .await?
            .error_for_status()?
            .json()
            .await?;

        if keys.keys.is_empty() {
            anyhow::bail!("{} returned no signing keys", jwks_url);
        }

        Ok(Self::new(config, keys))
    }

    pub fn new(config: &Auth0Config, keys: JwkSet) -> Self {
        Self {
            issuer: config.issuer(),
            audience: config.audience().to_owned(),
            keys: Arc::new(keys),
        }
    }

    /// Pulls the token out of an `Authorization` header value. A blank
    /// value counts as no header at all.
    pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
        let header = header
            .filter(|value| !value.trim().is_empty())
            .ok_or(AuthError::HEADER_MISSING)?;
        let parts: Vec<&str> = header.split_whitespace().collect();

        match parts.as_slice() {
            [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => Err(AuthError::NOT_BEARER),
            [] | [_] => Err(AuthError::TOKEN_NOT_FOUND),
            [_, token] => Ok(*token),
            _ => Err(AuthError::NOT_BEARER_TOKEN),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MALFORMED)?;
        let kid = header.kid.ok_or(AuthError::MALFORMED)?;
        let jwk = self.keys.find(&kid).ok_or(AuthError::UNKNOWN_KEY)?;
        let key = DecodingKey::from_jwk(jwk).map_err(|_| AuthError::UNKNOWN_KEY)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!("rejected token: {}", err);
                match err.kind() {
                    ErrorKind::ExpiredSignature => AuthError::EXPIRED,
                    ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => {
                        AuthError::INCORRECT_CLAIMS
                    }
                    ErrorKind::MissingRequiredClaim(claim)
                        if claim == "aud" || claim == "iss" =>
                    {
                        AuthError::INCORRECT_CLAIMS
                    }
                    _ => AuthError::UNPARSEABLE,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_rules() {
        assert_eq!(
            Authenticator::bearer_token(None),
            Err(AuthError::HEADER_MISSING)
        );
        assert_eq!(
            Authenticator::bearer_token(Some("Basic abc")),
            Err(AuthError::NOT_BEARER)
        );
        assert_eq!(
            Authenticator::bearer_token(Some("Bearer")),
            Err(AuthError::TOKEN_NOT_FOUND)
        );
        assert_eq!(
            Authenticator::bearer_token(Some("")),
            Err(AuthError::HEADER_MISSING)
        );
        assert_eq!(
            Authenticator::bearer_token(Some("   ")),
            Err(AuthError::HEADER_MISSING)
        );
        assert_eq!(
            Authenticator::bearer_token(Some("Bearer abc def")),
            Err(AuthError::NOT_BEARER_TOKEN)
        );
        assert_eq!(Authenticator::bearer_token(Some("bearer abc")), Ok("abc"));
    }

    #[test]
    fn permissions_are_checked() {
        let claims = Claims {
            sub: "auth0|barista".to_owned(),
            permissions: Some(vec!["get:drinks".to_owned(), "get:drinks-detail".to_owned()]),
        };
        assert_eq!(claims.check_permission("get:drinks-detail"), Ok(()));
        assert_eq!(
            claims.check_permission("delete:drinks"),
            Err(AuthError::FORBIDDEN)
        );

        let claims = Claims {
            sub: "auth0|guest".to_owned(),
            permissions: None,
        };
        assert_eq!(
            claims.check_permission("get:drinks"),
            Err(AuthError::NO_PERMISSIONS)
        );
    }

    #[test]
    fn garbage_token_is_malformed() {
        let auth = Authenticator::new(
            crate::EnvironmentConfig::current().auth0(),
            JwkSet { keys: Vec::new() },
        );
        assert_eq!(auth.verify("not-a-jwt"), Err(AuthError::MALFORMED));
    }
}
