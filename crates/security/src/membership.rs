//! Membership service seam

use async_trait::async_trait;
use dashmap::DashMap;

use common::error::{Error, Result};

use crate::users::User;

/// Directory of users
#[async_trait]
pub trait MembershipService: Send + Sync {
    /// Finds a user by permalink, `users/<uid>`
    async fn lookup_user(&self, permalink: &str) -> Result<User>;

    /// Finds a user by resource name, `users/<id>`
    async fn get_user(&self, name: &str) -> Result<User>;
}

/// In-process membership for single-host deployments
#[derive(Debug, Default)]
pub struct LocalMembership {
    users: DashMap<String, User>,
}

impl LocalMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership holding one freshly created user
    pub fn single(id: &str) -> (Self, User) {
        let membership = Self::new();
        let user = User::new(id);
        membership.add(user.clone());
        (membership, user)
    }

    pub fn add(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl MembershipService for LocalMembership {
    async fn lookup_user(&self, permalink: &str) -> Result<User> {
        self.users
            .iter()
            .find(|entry| entry.permalink() == permalink)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::NotFound(format!("User {} not found", permalink)))
    }

    async fn get_user(&self, name: &str) -> Result<User> {
        name.strip_prefix("users/")
            .and_then(|id| self.users.get(id))
            .map(|user| user.value().clone())
            .ok_or_else(|| Error::NotFound(format!("User {} not found", name)))
    }
}
