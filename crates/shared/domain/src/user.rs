//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{DomainError, DomainResult};
use crate::role::RoleSet;

/// Personal details of an account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub email: String,
}

/// Registration request as received from a client.
#[derive(Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "surname is required"))]
    pub surname: String,
    #[validate(length(min = 1, message = "patronymic is required"))]
    pub patronymic: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .field("patronymic", &self.patronymic)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Registration {
    /// Check structural constraints, naming every violated field.
    pub fn check(&self) -> DomainResult<()> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect();
            fields.sort();
            DomainError::validation(format!("invalid fields: {}", fields.join(", ")))
        })
    }

    /// Profile part of the request.
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            surname: self.surname.clone(),
            patronymic: self.patronymic.clone(),
            email: self.email.clone(),
        }
    }
}

/// Full user record, including the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub email: String,
    pub roles: RoleSet,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to insert a user. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub profile: Profile,
    pub roles: RoleSet,
    pub password_hash: String,
}

/// User as returned by id lookups (safe to return to clients).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub email: String,
    pub roles: RoleSet,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            surname: user.surname,
            patronymic: user.patronymic,
            email: user.email,
            roles: user.roles,
            created_at: user.created_at,
        }
    }
}
