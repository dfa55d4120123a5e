use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file; created along with its parent directories.
    pub database_path: String,
    pub max_connections: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("DATABASE_PATH")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let max_connections = match env_map.get("DB_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "DB_MAX_CONNECTIONS".to_string(),
                        format!("must be a positive integer, got {}", raw),
                    ))
                }
            },
        };

        Ok(Config {
            database_path,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/users.db".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.database_path, "/tmp/users.db");
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_blank_database_path() {
        let mut env_map = setup_required_env();
        env_map.insert("DATABASE_PATH".to_string(), "  ".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::MissingEnv(_))
        ));
    }

    #[test]
    fn test_max_connections_override() {
        let mut env_map = setup_required_env();
        env_map.insert("DB_MAX_CONNECTIONS".to_string(), "12".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn test_invalid_max_connections() {
        for raw in ["0", "-1", "many"] {
            let mut env_map = setup_required_env();
            env_map.insert("DB_MAX_CONNECTIONS".to_string(), raw.to_string());
            match Config::from_env_map(env_map) {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "DB_MAX_CONNECTIONS"),
                _ => panic!("Expected InvalidValue error for {}", raw),
            }
        }
    }
}
