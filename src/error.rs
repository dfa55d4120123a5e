use crate::dto::ValidationError;
use thiserror::Error;

/// Errors surfaced by the user service.
///
/// Storage errors are passed through as the driver reported them.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl ServiceError {
    /// True when a lookup found no row.
    ///
    /// This is still reported as a validation error: converting an absent
    /// entity into a `UserDto` is what fails.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Validation(err) if err.is_missing_source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::UserDto;

    #[test]
    fn test_not_found_is_validation_error() {
        let err: ServiceError = UserDto::from_attributes::<UserDto>(None)
            .unwrap_err()
            .into();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_field_error_is_not_not_found() {
        let err: ServiceError = UserDto::new(None, "x").unwrap_err().into();
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_storage_error_passes_through() {
        let err: ServiceError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, ServiceError::Storage(sqlx::Error::PoolClosed)));
        assert_eq!(err.to_string(), sqlx::Error::PoolClosed.to_string());
        assert!(!err.is_not_found());
    }
}
