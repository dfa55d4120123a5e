pub mod app;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use db::{init_db, Session, SessionFactory};
pub use dto::{UserAttributes, UserDto, ValidationError};
pub use error::ServiceError;
pub use models::User;
pub use services::{UserService, Users};
