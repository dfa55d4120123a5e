//! Mapped entities: in-memory records with the same fields as their rows.

pub mod user;

pub use user::User;
