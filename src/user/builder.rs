//! Typed builder for registrations.

use crate::model::HierarchicalRole;
use crate::user::NewUser;

/// [`NewUser`] builder.
#[derive(Debug, Clone)]
pub struct UserBuilder<Email, Role> {
    name: String,
    dni: String,
    email: Email,
    password: String,
    role: Role,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            name: String::default(),
            dni: String::default(),
            email: Missing,
            password: String::default(),
            role: Missing,
        }
    }
}

impl<Role> UserBuilder<Missing, Role> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(
        self,
        email: impl Into<String>,
    ) -> UserBuilder<Present<String>, Role> {
        UserBuilder {
            name: self.name,
            dni: self.dni,
            email: Present(email.into().trim().to_owned()),
            password: self.password,
            role: self.role,
        }
    }
}

impl<Email> UserBuilder<Email, Missing> {
    /// Update `role` field on [`UserBuilder`].
    pub fn role(
        self,
        role: HierarchicalRole,
    ) -> UserBuilder<Email, Present<HierarchicalRole>> {
        UserBuilder {
            name: self.name,
            dni: self.dni,
            email: self.email,
            password: self.password,
            role: Present(role),
        }
    }
}

impl<Email, Role> UserBuilder<Email, Role> {
    /// Update `name` field on [`UserBuilder`].
    pub fn name(mut self, name: impl ToString) -> Self {
        self.name = name.to_string();
        self
    }

    /// Update `dni` field on [`UserBuilder`].
    pub fn dni(mut self, dni: impl ToString) -> Self {
        self.dni = dni.to_string();
        self
    }

    /// Update `password` field on [`UserBuilder`].
    pub fn password(mut self, password: impl ToString) -> Self {
        self.password = password.to_string();
        self
    }
}

impl UserBuilder<Present<String>, Present<HierarchicalRole>> {
    /// Build a [`NewUser`] with `email` and `role`.
    pub fn build(self) -> NewUser {
        NewUser {
            name: self.name,
            dni: self.dni,
            email: self.email.0,
            password: self.password,
            role: self.role.0,
        }
    }
}
