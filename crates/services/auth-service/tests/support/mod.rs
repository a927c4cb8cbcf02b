//! Shared fixtures for auth-service integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use auth_service_lib::repository::CredentialStore;
use auth_service_lib::service::{Argon2Hasher, Authenticator, TokenEngine};
use common::{AppError, AppResult, Deadline};
use domain::{NewUser, Password, Registration, Role, RoleSet, User, UserProfile};

pub const SECRET: &[u8] = b"test-secret-key-for-testing-only-32chars";

/// Credential store kept in memory, unique on email.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed user with an Argon2 hash of `password`,
    /// bypassing registration and its default role.
    pub fn seed(&self, email: &str, password: &str, roles: &[Role]) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            name: "Seeded".to_string(),
            surname: "User".to_string(),
            patronymic: "Test".to_string(),
            email: email.to_string(),
            roles: roles.iter().copied().collect(),
            password_hash: Password::hash(password).unwrap().into_string(),
            created_at: Utc::now(),
        };
        let id = user.id;
        self.users.lock().unwrap().insert(id, user);
        id
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn find(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn create_user(&self, user: NewUser, deadline: Deadline) -> AppResult<Uuid> {
        deadline
            .run(async {
                let mut users = self.users.lock().unwrap();
                if users.values().any(|u| u.email == user.profile.email) {
                    return Err(AppError::conflict("User"));
                }
                let id = Uuid::new_v4();
                users.insert(
                    id,
                    User {
                        id,
                        name: user.profile.name,
                        surname: user.profile.surname,
                        patronymic: user.profile.patronymic,
                        email: user.profile.email,
                        roles: user.roles,
                        password_hash: user.password_hash,
                        created_at: Utc::now(),
                    },
                );
                Ok(id)
            })
            .await?
    }

    async fn get_user_by_email(&self, email: &str, deadline: Deadline) -> AppResult<User> {
        deadline
            .run(async { self.find(email).ok_or(AppError::NotFound) })
            .await?
    }

    async fn get_user_by_id(&self, id: Uuid, deadline: Deadline) -> AppResult<UserProfile> {
        deadline
            .run(async {
                self.users
                    .lock()
                    .unwrap()
                    .get(&id)
                    .cloned()
                    .map(UserProfile::from)
                    .ok_or(AppError::NotFound)
            })
            .await?
    }
}

pub fn token_engine() -> Arc<TokenEngine> {
    Arc::new(TokenEngine::new(SECRET, chrono::Duration::hours(24)).unwrap())
}

pub fn authenticator(store: Arc<InMemoryStore>, tokens: Arc<TokenEngine>) -> Authenticator {
    Authenticator::new(store, Arc::new(Argon2Hasher), tokens)
        .unwrap()
        .with_register_timeout(Duration::from_secs(30))
}

pub fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(30))
}

pub fn registration(email: &str, password: &str) -> Registration {
    Registration {
        name: "A".to_string(),
        surname: "B".to_string(),
        patronymic: "C".to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn roles(list: &[Role]) -> RoleSet {
    list.iter().copied().collect()
}
