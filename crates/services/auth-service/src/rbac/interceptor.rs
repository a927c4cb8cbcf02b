//! Bearer token check and permission decision for one call.

use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::HeaderMap;
use tracing::{debug, info};

use super::permissions::PermissionTable;
use crate::service::{Claims, TokenEngine};
use common::{AppError, AppResult};
use domain::BEARER_TOKEN_PREFIX;

/// Decides whether a call may proceed.
pub struct RbacInterceptor {
    tokens: Arc<TokenEngine>,
    permissions: PermissionTable,
}

impl RbacInterceptor {
    pub fn new(tokens: Arc<TokenEngine>, permissions: PermissionTable) -> Self {
        Self {
            tokens,
            permissions,
        }
    }

    /// Validate the bearer token in `headers` and check it grants `operation`.
    ///
    /// `Unauthorized` if the token is missing or invalid, `Forbidden` if
    /// none of its roles permit the operation.
    pub fn authorize(&self, headers: &HeaderMap, operation: &str) -> AppResult<Claims> {
        let token = bearer_token(headers).ok_or_else(|| {
            debug!(operation, "Missing authorization token");
            AppError::Unauthorized
        })?;

        let claims = self.tokens.validate(token).map_err(|e| {
            debug!(operation, reason = %e, "Rejected authorization token");
            AppError::from(e)
        })?;

        if !self.permissions.allows(&claims.roles, operation) {
            info!(user_id = %claims.id, operation, "Permission denied");
            return Err(AppError::Forbidden);
        }

        Ok(claims)
    }
}

/// First `authorization` value, with an optional `Bearer ` prefix removed.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim_start();
    let prefix_len = BEARER_TOKEN_PREFIX.len();
    let token = match raw.get(..prefix_len) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_TOKEN_PREFIX) => &raw[prefix_len..],
        // a lone scheme name carries no token
        _ if raw.trim_end().eq_ignore_ascii_case(BEARER_TOKEN_PREFIX.trim_end()) => "",
        _ => raw,
    }
    .trim();
    (!token.is_empty()).then_some(token)
}
