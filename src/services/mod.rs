//! Service layer: operations callers use instead of touching sessions.

use crate::dto::UserDto;
use crate::error::ServiceError;
use async_trait::async_trait;
use std::fmt;

pub mod user;

pub use user::UserService;

/// User operations.
///
/// Implementations open their own unit of work per call and hold no state
/// between calls, so one instance can serve concurrent tasks.
#[async_trait]
pub trait Users: Send + Sync + fmt::Debug {
    /// Persist a new user and return it with its assigned primary key.
    ///
    /// Any `pk` already present on `user` is ignored.
    async fn add(&self, user: &UserDto) -> Result<UserDto, ServiceError>;

    /// Fetch a user by primary key.
    ///
    /// A missing row is reported as [`ServiceError::Validation`]; see
    /// [`ServiceError::is_not_found`].
    async fn get(&self, pk: i64) -> Result<UserDto, ServiceError>;
}
