//! Bearer token issuance and verification.
//!
//! Access and refresh tokens share one HS256 signing key but carry a `kind`
//! claim so neither can be replayed where the other is expected.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::principal::Principal;

pub mod password;

/// Minimum signing secret length required for HS256 (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Lenient mapping for role claims: unknown values degrade to `User`
    /// rather than rejecting the whole token.
    pub fn from_claim(value: &str) -> Role {
        match value {
            "ADMIN" => Role::Admin,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    email: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    kind: TokenKind,
    iat: i64,
    exp: i64,
}

/// Verified token contents handed to callers. The embedded role is only a
/// fallback; authorization reads the live stored role first.
#[derive(Debug, Clone)]
pub struct TokenPayload {
    pub principal_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Option<Role>,
    pub kind: TokenKind,
}

impl From<Claims> for TokenPayload {
    fn from(claims: Claims) -> Self {
        Self {
            principal_id: claims.sub,
            email: claims.email,
            display_name: claims.name,
            role: claims.role.as_deref().map(Role::from_claim),
            kind: claims.kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
pub enum TokenCodecError {
    #[error("signing secret must be at least 32 bytes (256 bits); current length is {0} bytes")]
    WeakSecret(usize),
}

/// Stateless codec for signed bearer tokens.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from the configured secret and TTLs. Fails fast on a
    /// weak secret; this is a startup-time configuration error, never a
    /// per-request one.
    pub fn new(
        secret: &str,
        access_ttl_minutes: i64,
        refresh_ttl_days: i64,
    ) -> Result<Self, TokenCodecError> {
        let bytes = secret.as_bytes();
        if bytes.len() < MIN_SECRET_BYTES {
            return Err(TokenCodecError::WeakSecret(bytes.len()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        })
    }

    pub fn issue_access(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue(principal, TokenKind::Access, self.access_ttl)
    }

    pub fn issue_refresh(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue(principal, TokenKind::Refresh, self.refresh_ttl)
    }

    fn issue(
        &self,
        principal: &Principal,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.id,
            email: principal.email.clone(),
            name: principal.display_name.clone(),
            role: Some(principal.role.unwrap_or(Role::User).as_str().to_string()),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry and require an access token. The error is
    /// deliberately generic: callers must not learn which check failed.
    pub fn parse_access(&self, token: &str) -> Result<TokenPayload, AuthError> {
        let claims = self.parse(token).map_err(|_| AuthError::InvalidToken)?;
        if claims.kind != TokenKind::Access {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims.into())
    }

    /// Same as [`parse_access`](Self::parse_access) but requires a refresh
    /// token, with a distinct error kind for callers that answer differently.
    pub fn parse_refresh(&self, token: &str) -> Result<TokenPayload, AuthError> {
        let claims = self
            .parse(token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::InvalidRefreshToken);
        }
        Ok(claims.into())
    }

    fn parse(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// Returns `None` for a missing header, wrong scheme, or empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

pub(crate) fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-test-secret-test-secret-1234";

    fn principal(role: Option<Role>) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            password_hash: String::new(),
            role,
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, 60, 7).unwrap()
    }

    #[test]
    fn access_token_round_trips() {
        let codec = codec();
        let user = principal(Some(Role::Admin));
        let token = codec.issue_access(&user).unwrap();

        let payload = codec.parse_access(&token).unwrap();
        assert_eq!(payload.principal_id, user.id);
        assert_eq!(payload.email, user.email);
        assert_eq!(payload.display_name, user.display_name);
        assert_eq!(payload.role, Some(Role::Admin));
        assert_eq!(payload.kind, TokenKind::Access);
    }

    #[test]
    fn refresh_token_round_trips() {
        let codec = codec();
        let user = principal(None);
        let token = codec.issue_refresh(&user).unwrap();

        let payload = codec.parse_refresh(&token).unwrap();
        assert_eq!(payload.principal_id, user.id);
        assert_eq!(payload.kind, TokenKind::Refresh);
        // No stored role: the embedded claim defaults to USER
        assert_eq!(payload.role, Some(Role::User));
    }

    #[test]
    fn parse_access_rejects_refresh_token() {
        let codec = codec();
        let token = codec.issue_refresh(&principal(None)).unwrap();
        assert!(matches!(
            codec.parse_access(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn parse_refresh_rejects_access_token() {
        let codec = codec();
        let token = codec.issue_access(&principal(None)).unwrap();
        assert!(matches!(
            codec.parse_refresh(&token),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn expired_tokens_are_rejected_by_both_parsers() {
        // Negative TTLs put exp in the past while the signature stays valid
        let expired = TokenCodec::new(SECRET, -5, -1).unwrap();
        let user = principal(Some(Role::Admin));

        let access = expired.issue_access(&user).unwrap();
        let refresh = expired.issue_refresh(&user).unwrap();

        assert!(matches!(
            expired.parse_access(&access),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            expired.parse_refresh(&refresh),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = codec();
        let other = TokenCodec::new("another-secret-another-secret-another-12", 60, 7).unwrap();
        let token = other.issue_access(&principal(None)).unwrap();
        assert!(codec.parse_access(&token).is_err());
    }

    #[test]
    fn weak_secret_fails_construction() {
        let err = TokenCodec::new("too-short", 60, 7).unwrap_err();
        assert!(matches!(err, TokenCodecError::WeakSecret(9)));
    }

    #[test]
    fn unknown_role_claim_degrades_to_user() {
        assert_eq!(Role::from_claim("SUPERUSER"), Role::User);
        assert_eq!(Role::from_claim("ADMIN"), Role::Admin);
    }

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));
    }
}
