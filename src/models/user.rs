//! `user` table mapping.

use crate::dto::UserAttributes;
use sqlx::FromRow;

/// Table name. Quoted in SQL since `user` is a reserved word on most engines.
pub const TABLE: &str = "user";

/// In-memory representation of a `user` row.
///
/// `pk` is `None` while the entity is transient and is assigned exactly once,
/// by the session that flushes the insert.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pk: Option<i64>,
    name: String,
}

impl User {
    /// Create a transient entity.
    pub fn new(name: impl Into<String>) -> Self {
        User {
            pk: None,
            name: name.into(),
        }
    }

    pub fn pk(&self) -> Option<i64> {
        self.pk
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True until a flush assigns a primary key.
    pub fn is_transient(&self) -> bool {
        self.pk.is_none()
    }

    /// No-op once a key has been assigned.
    pub(crate) fn assign_pk(&mut self, pk: i64) {
        if self.pk.is_none() {
            self.pk = Some(pk);
        }
    }
}

impl UserAttributes for User {
    fn pk(&self) -> Option<i64> {
        self.pk
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
