//! Entry-point helpers: run one user operation, log the outcome, and swallow
//! errors so the process exits cleanly.

use crate::dto::UserDto;
use crate::services::Users;
use thiserror::Error;
use tracing::{debug, error};

/// Name used when the binary is run without arguments.
pub const DEFAULT_NAME: &str = "Test";

/// One operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Get(i64),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("usage: userbase [add <name> | get <pk>]")]
    Usage,
    #[error("Invalid primary key: {0}")]
    InvalidPk(String),
}

impl Command {
    /// Parse arguments (without the program name). No arguments means
    /// `add Test`.
    pub fn from_args<I>(args: I) -> Result<Self, CommandError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let command = match (args.next().as_deref(), args.next()) {
            (None, _) => Command::Add(DEFAULT_NAME.to_string()),
            (Some("add"), Some(name)) => Command::Add(name),
            (Some("get"), Some(pk)) => {
                let parsed = pk.parse().map_err(|_| CommandError::InvalidPk(pk))?;
                Command::Get(parsed)
            }
            _ => return Err(CommandError::Usage),
        };
        if args.next().is_some() {
            return Err(CommandError::Usage);
        }
        Ok(command)
    }

    pub async fn run(&self, users: &dyn Users) -> Option<UserDto> {
        match self {
            Command::Add(name) => user_add(users, name).await,
            Command::Get(pk) => user_get(users, *pk).await,
        }
    }
}

/// Validate `name` and add it. Errors are logged, not returned.
pub async fn user_add(users: &dyn Users, name: &str) -> Option<UserDto> {
    let user = match UserDto::new(None, name) {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Rejected user");
            return None;
        }
    };
    match users.add(&user).await {
        Ok(result) => {
            debug!(result = ?result, "add succeeded");
            Some(result)
        }
        Err(e) => {
            error!(error = %e, "add failed");
            None
        }
    }
}

/// Fetch `pk`. Errors, including a missing row, are logged, not returned.
pub async fn user_get(users: &dyn Users, pk: i64) -> Option<UserDto> {
    match users.get(pk).await {
        Ok(result) => {
            debug!(result = ?result, "get succeeded");
            Some(result)
        }
        Err(e) => {
            error!(pk, error = %e, "get failed");
            None
        }
    }
}
