mod builder;
mod repository;
mod service;

pub use builder::*;
pub use repository::*;
pub use service::*;

pub use crate::model::User;

use crate::model::HierarchicalRole;

/// Registration candidate, before an id is assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub dni: String,
    pub email: String,
    pub password: String,
    pub role: HierarchicalRole,
}
