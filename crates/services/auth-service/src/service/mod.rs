//! Authentication service business logic.

mod auth_service;
mod hasher;
mod token;

pub use auth_service::{AuthService, Authenticator, TokenResponse};
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use token::{Claims, TokenEngine, TokenError};
