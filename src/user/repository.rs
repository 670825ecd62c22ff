//! In-memory user directory.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, ServerError};
use crate::user::{NewUser, User};

const AVATAR_BASE_URL: &str = "https://i.pravatar.cc/150?u=";

#[derive(Clone, Default)]
pub struct UserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl UserRepository {
    /// Create a new [`UserRepository`] holding `users`.
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Insert a [`NewUser`], assigning the next id.
    ///
    /// Fails without touching the list when the email already exists.
    pub fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write();

        if users.iter().any(|u| u.email == user.email) {
            return Err(ServerError::EmailTaken);
        }

        let id = users.iter().map(|u| u.id).max().map_or(1, |max| max + 1);
        let user = User {
            id,
            avatar_url: Some(format!("{AVATAR_BASE_URL}{}", user.email)),
            name: user.name,
            role: user.role,
            dni: user.dni,
            email: user.email,
            password: Some(user.password),
        };

        users.push(user.clone());
        Ok(user)
    }

    /// Exact match on both email and password.
    pub fn find_by_credentials(&self, email: &str, password: &str) -> Option<User> {
        self.users
            .read()
            .iter()
            .find(|u| u.email == email && u.password.as_deref() == Some(password))
            .cloned()
    }

    pub fn find_by_id(&self, id: u64) -> Option<User> {
        self.users.read().iter().find(|u| u.id == id).cloned()
    }

    pub fn list(&self) -> Vec<User> {
        self.users.read().clone()
    }

    /// Remove by id. Returns whether a user was removed.
    pub fn delete(&self, id: u64) -> bool {
        let mut users = self.users.write();
        let before = users.len();
        users.retain(|u| u.id != id);
        users.len() != before
    }
}
