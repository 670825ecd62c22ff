use crate::error::{Result, ServerError};
use crate::user::{NewUser, User, UserRepository};

/// Account operations: login, registration and deletion.
#[derive(Clone, Default)]
pub struct UserService {
    pub repo: UserRepository,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Linear lookup on email and password.
    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        match self.repo.find_by_credentials(email, password) {
            Some(user) => {
                tracing::info!(user_id = user.id, role = %user.role, "user logged in");
                Ok(user)
            },
            None => {
                tracing::info!("login refused");
                Err(ServerError::InvalidCredentials)
            },
        }
    }

    /// Append a user. Does not open a session.
    pub fn register(&self, user: NewUser) -> Result<User> {
        let user = self.repo.insert(user).inspect_err(|_| {
            tracing::info!("registration refused, email already registered");
        })?;

        tracing::info!(user_id = user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Remove `target`, unless it is the caller's own account.
    ///
    /// Existing reports keep their author snapshot.
    pub fn delete(&self, current: &User, target: u64) -> Result<()> {
        if current.id == target {
            return Err(ServerError::SelfDeletion);
        }

        if self.repo.delete(target) {
            tracing::info!(user_id = target, by = current.id, "user deleted");
        }
        Ok(())
    }
}
