//! Signed bearer tokens (JWT, HS256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use common::{AppError, ConfigError, JwtConfig};
use domain::{RoleSet, MIN_JWT_SECRET_LENGTH, SECONDS_PER_HOUR};

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: Uuid,
    pub roles: RoleSet,
    pub iat: i64,
    pub exp: i64,
}

/// Why a token was not accepted, or could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not verify")]
    Signature,

    #[error("token has expired")]
    Expired,

    #[error("token is invalid: {0}")]
    Invalid(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                TokenError::Malformed
            }
            ErrorKind::InvalidSignature => TokenError::Signature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// Rejected tokens surface as `Unauthorized`; failing to sign is internal.
impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => AppError::token(msg),
            _ => AppError::Unauthorized,
        }
    }
}

/// Issues and validates tokens with a single symmetric secret.
///
/// The algorithm is pinned to HS256 on both sides, so a token whose header
/// names any other algorithm is rejected.
pub struct TokenEngine {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenEngine {
    /// Fails if the secret is shorter than [`MIN_JWT_SECRET_LENGTH`] bytes or
    /// the expiry is not positive.
    pub fn new(secret: &[u8], expiry: Duration) -> Result<Self, ConfigError> {
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::invalid(
                "JWT_SECRET",
                "[REDACTED]",
                format!("must be at least {} bytes", MIN_JWT_SECRET_LENGTH),
            ));
        }
        if expiry <= Duration::zero() {
            return Err(ConfigError::invalid(
                "JWT_EXPIRATION_HOURS",
                &expiry.num_hours().to_string(),
                "must be positive",
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // no grace period past `exp`
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry,
        })
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self, ConfigError> {
        let expiry = Duration::try_hours(config.expiration_hours).ok_or_else(|| {
            ConfigError::invalid(
                "JWT_EXPIRATION_HOURS",
                &config.expiration_hours.to_string(),
                "out of range",
            )
        })?;
        Self::new(config.secret.as_bytes(), expiry)
    }

    /// Token lifetime in seconds.
    pub fn expires_in(&self) -> i64 {
        self.expiry.num_seconds()
    }

    pub fn expiry_hours(&self) -> i64 {
        self.expires_in() / SECONDS_PER_HOUR
    }

    /// Sign a token for `user_id` valid from now.
    pub fn issue(&self, user_id: Uuid, roles: &RoleSet) -> Result<String, TokenError> {
        self.issue_at(user_id, roles, Utc::now())
    }

    /// Sign a token as if issued at `issued_at`.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        roles: &RoleSet,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            id: user_id,
            roles: roles.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, then decode the claims.
    ///
    /// A token whose header cannot be parsed is `Malformed`; claims that fail
    /// to decode after the signature checks out are `Invalid`.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode_header(token).map_err(|_| TokenError::Malformed)?;

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }
}
