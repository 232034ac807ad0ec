//! Session token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the user id (`sub`), issue time (`iat`), and
//! expiry (`exp`). Nothing is persisted: a token is valid exactly when its
//! signature checks out against the configured secret and `exp` lies in the
//! future. There is no revocation list, so expiry is the only way a token
//! stops working.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use cohort_model::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of a freshly issued token.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// JWT claims for session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // User ID
    pub iat: i64,  // Issued at
    pub exp: i64,  // Expiration time
}

/// Bearer credential handed back by Login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Why a request carries no usable token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("authorization token is required")]
    Missing,
    #[error("authorization token is invalid or expired")]
    Invalid,
}

#[derive(Debug, Error)]
pub enum TokenConfigError {
    #[error("token signing secret must not be empty")]
    EmptySecret,
    #[error("token lifetime must be positive")]
    InvalidTtl,
}

#[derive(Debug, Error)]
#[error("failed to sign session token: {0}")]
pub struct TokenIssueError(#[from] jsonwebtoken::errors::Error);

/// Per-call request metadata as exposed by the transport.
///
/// The only key the identity workflow reads is `authorization`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    authorization: Option<String>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorization(value: impl Into<String>) -> Self {
        Self {
            authorization: Some(value.into()),
        }
    }

    /// Single value stored under the `authorization` key, if any.
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// The token inside the `authorization` value, accepting either a raw
    /// token or `Bearer <token>`. Blank values count as absent.
    pub fn bearer_token(&self) -> Option<&str> {
        let raw = self.authorization()?.trim();
        if raw.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = match raw.split_once(' ') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            _ => raw,
        };

        if token.is_empty() { None } else { Some(token) }
    }
}

/// Mints and validates session tokens with a symmetric secret supplied at
/// construction.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenConfigError> {
        Self::with_ttl(secret, Duration::days(DEFAULT_TOKEN_TTL_DAYS))
    }

    pub fn with_ttl(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenConfigError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }
        if ttl <= Duration::zero() {
            return Err(TokenConfigError::InvalidTtl);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn issue(&self, user_id: UserId) -> Result<SessionToken, TokenIssueError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, TokenIssueError> {
        let issued_at = now.timestamp();
        let expires_at = issued_at + self.ttl.num_seconds();

        let claims = Claims {
            sub: user_id.to_uuid(),
            iat: issued_at,
            exp: expires_at,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SessionToken {
            token,
            expires_at: timestamp(expires_at),
        })
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        // The library tolerates `exp == now`; a token is dead at its expiry.
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Invalid);
        }

        Ok(VerifiedToken {
            user_id: UserId(claims.sub),
            issued_at: timestamp(claims.iat),
            expires_at: timestamp(claims.exp),
        })
    }

    /// Verify the bearer token carried in call metadata.
    pub fn verify_metadata(&self, metadata: &CallMetadata) -> Result<VerifiedToken, TokenError> {
        let token = metadata.bearer_token().ok_or(TokenError::Missing)?;
        self.verify(token)
    }
}

fn timestamp(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
