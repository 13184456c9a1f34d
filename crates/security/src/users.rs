//! Owning users

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user that owns models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Immutable identifier, used in permalinks
    pub uid: Uuid,
    /// Human-readable identifier, used in resource names
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            id: id.into(),
        }
    }

    /// `users/<id>`, the namespace models are created under
    pub fn name(&self) -> String {
        format!("users/{}", self.id)
    }

    /// `users/<uid>`
    pub fn permalink(&self) -> String {
        format!("users/{}", self.uid)
    }
}
