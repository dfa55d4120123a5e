//! Boundary records used at the service edge.
//!
//! Every record here validates its fields when it is built, whether that is
//! through a constructor, deserialization, or conversion from a mapped entity.

pub mod user;

pub use user::{FieldError, FieldErrorKind, UserAttributes, UserDto, ValidationError};
