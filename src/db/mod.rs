//! Database module for SQLite operations.
//!
//! This module provides:
//! - Pool initialization, pragmas, and versioned migrations
//! - Session factory producing scoped units of work

pub mod migrations;
pub mod session;

pub use migrations::{init_db, revert_last_migration, run_migrations, MigrationError};
pub use session::{Session, SessionFactory};
