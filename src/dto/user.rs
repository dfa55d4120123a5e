//! Validated user record: `UserDto`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Minimum `name` length, in characters.
pub const NAME_MIN_CHARS: usize = 2;
/// Maximum `name` length, in characters. Matches the `VARCHAR(50)` column.
pub const NAME_MAX_CHARS: usize = 50;

/// A source that exposes user attributes by name.
///
/// Implemented by the mapped entity and by `UserDto` itself, so either can be
/// re-hydrated into a validated record with [`UserDto::from_attributes`].
pub trait UserAttributes {
    /// Primary key, if one has been assigned.
    fn pk(&self) -> Option<i64>;

    /// User name, or `None` when the source carries no `name` attribute.
    fn name(&self) -> Option<&str>;
}

/// User record validated at the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawUserDto")]
pub struct UserDto {
    pk: Option<i64>,
    name: String,
}

/// Unvalidated wire shape; deserialization goes through `TryFrom`.
#[derive(Deserialize)]
struct RawUserDto {
    #[serde(default)]
    pk: Option<i64>,
    #[serde(default)]
    name: Option<String>,
}

impl UserDto {
    /// Build a record, validating `name`.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if `name` is shorter than
    /// [`NAME_MIN_CHARS`] or longer than [`NAME_MAX_CHARS`] characters.
    pub fn new(pk: Option<i64>, name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(UserDto { pk, name })
    }

    /// Build a record from any attribute-bearing source.
    ///
    /// A `None` source is rejected the same way a non-object input is: with a
    /// model-level validation error. A source without a `name` attribute is
    /// rejected with a "field required" error on `name`.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for a missing source, a missing `name`,
    /// or a `name` outside the length bounds.
    pub fn from_attributes<T>(source: Option<&T>) -> Result<Self, ValidationError>
    where
        T: UserAttributes + ?Sized,
    {
        let source = source.ok_or_else(|| FieldError::model(FieldErrorKind::InvalidSource))?;
        let name = source
            .name()
            .ok_or_else(|| FieldError::field("name", FieldErrorKind::Missing))?;
        Self::new(source.pk(), name)
    }

    pub fn pk(&self) -> Option<i64> {
        self.pk
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl UserAttributes for UserDto {
    fn pk(&self) -> Option<i64> {
        self.pk
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl TryFrom<RawUserDto> for UserDto {
    type Error = ValidationError;

    fn try_from(raw: RawUserDto) -> Result<Self, Self::Error> {
        match raw.name {
            Some(name) => UserDto::new(raw.pk, name),
            None => Err(FieldError::field("name", FieldErrorKind::Missing).into()),
        }
    }
}

fn validate_name(name: &str) -> Result<(), FieldError> {
    let actual = name.chars().count();
    if actual < NAME_MIN_CHARS {
        return Err(FieldError::field(
            "name",
            FieldErrorKind::TooShort {
                min: NAME_MIN_CHARS,
                actual,
            },
        ));
    }
    if actual > NAME_MAX_CHARS {
        return Err(FieldError::field(
            "name",
            FieldErrorKind::TooLong {
                max: NAME_MAX_CHARS,
                actual,
            },
        ));
    }
    Ok(())
}

/// What went wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorKind {
    #[error("Field required")]
    Missing,
    #[error("String should have at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },
    #[error("String should have at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },
    #[error("Input should be a valid object")]
    InvalidSource,
}

/// A diagnostic attached to one field, or to the record as a whole when
/// `field` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Option<&'static str>,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn field(field: &'static str, kind: FieldErrorKind) -> Self {
        FieldError {
            field: Some(field),
            kind,
        }
    }

    pub fn model(kind: FieldErrorKind) -> Self {
        FieldError { field: None, kind }
    }
}

/// Validation failure carrying field-level diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// True when validation failed because there was no source object at all.
    pub fn is_missing_source(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.field.is_none() && e.kind == FieldErrorKind::InvalidSource)
    }
}

impl From<FieldError> for ValidationError {
    fn from(err: FieldError) -> Self {
        ValidationError { errors: vec![err] }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        let plural = if count == 1 { "" } else { "s" };
        write!(f, "{} validation error{} for UserDto", count, plural)?;
        for err in &self.errors {
            write!(f, "\n{}\n  {}", err.field.unwrap_or("UserDto"), err.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Attrs {
        pk: Option<i64>,
        name: &'static str,
    }

    impl UserAttributes for Attrs {
        fn pk(&self) -> Option<i64> {
            self.pk
        }

        fn name(&self) -> Option<&str> {
            Some(self.name)
        }
    }

    struct Nameless;

    impl UserAttributes for Nameless {
        fn pk(&self) -> Option<i64> {
            Some(7)
        }

        fn name(&self) -> Option<&str> {
            None
        }
    }

    #[test]
    fn test_user_dto_ok() {
        let user = UserDto::new(Some(1), "TestName").unwrap();
        assert_eq!(user.pk(), Some(1));
        assert_eq!(user.name(), "TestName");
    }

    #[test]
    fn test_user_dto_no_pk() {
        let user = UserDto::new(None, "TestName").unwrap();
        assert_eq!(user.name(), "TestName");
        assert_eq!(user.pk(), None);
    }

    #[test]
    fn test_name_length_bounds() {
        assert!(UserDto::new(None, "ab").is_ok());
        assert!(UserDto::new(None, "a".repeat(50)).is_ok());

        let err = UserDto::new(None, "a").unwrap_err();
        assert_eq!(
            err.errors(),
            &[FieldError::field(
                "name",
                FieldErrorKind::TooShort { min: 2, actual: 1 }
            )]
        );

        let err = UserDto::new(None, "a".repeat(51)).unwrap_err();
        assert_eq!(
            err.errors()[0].kind,
            FieldErrorKind::TooLong {
                max: 50,
                actual: 51
            }
        );
        assert!(UserDto::new(None, "").is_err());
    }

    #[test]
    fn test_name_length_counts_characters() {
        // 50 two-byte characters: 100 bytes, still within bounds.
        assert!(UserDto::new(None, "é".repeat(50)).is_ok());
        assert!(UserDto::new(None, "é".repeat(51)).is_err());
        assert!(UserDto::new(None, "日本").is_ok());
    }

    #[test]
    fn test_user_dto_from_attributes_ok() {
        let source = Attrs {
            pk: Some(1),
            name: "TestName",
        };
        let user = UserDto::from_attributes(Some(&source)).unwrap();
        assert_eq!(user.pk(), source.pk);
        assert_eq!(user.name(), source.name);
    }

    #[test]
    fn test_from_attributes_validates_name() {
        let source = Attrs { pk: Some(1), name: "x" };
        let err = UserDto::from_attributes(Some(&source)).unwrap_err();
        assert!(!err.is_missing_source());
    }

    #[test]
    fn test_from_attributes_without_name() {
        let err = UserDto::from_attributes(Some(&Nameless)).unwrap_err();
        assert_eq!(
            err.errors(),
            &[FieldError::field("name", FieldErrorKind::Missing)]
        );
    }

    #[test]
    fn test_from_attributes_none_source() {
        let err = UserDto::from_attributes::<UserDto>(None).unwrap_err();
        assert!(err.is_missing_source());
        assert_eq!(
            err.to_string(),
            "1 validation error for UserDto\nUserDto\n  Input should be a valid object"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = UserDto::new(None, "a").unwrap_err();
        assert_eq!(
            err.to_string(),
            "1 validation error for UserDto\nname\n  String should have at least 2 characters (got 1)"
        );
    }

    #[test]
    fn test_serialization() {
        let user = UserDto::new(Some(3), "Alice").unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, r#"{"pk":3,"name":"Alice"}"#);

        let transient = UserDto::new(None, "Alice").unwrap();
        let json = serde_json::to_string(&transient).unwrap();
        assert_eq!(json, r#"{"pk":null,"name":"Alice"}"#);
    }

    #[test]
    fn test_deserialization_validates() {
        let user: UserDto = serde_json::from_str(r#"{"name":"Bob"}"#).unwrap();
        assert_eq!(user.pk(), None);
        assert_eq!(user.name(), "Bob");

        let err = serde_json::from_str::<UserDto>(r#"{"pk":1,"name":"B"}"#).unwrap_err();
        assert!(err.to_string().contains("at least 2 characters"));

        let err = serde_json::from_str::<UserDto>(r#"{"pk":1}"#).unwrap_err();
        assert!(err.to_string().contains("Field required"));

        assert!(serde_json::from_str::<UserDto>(r#"{"pk":"1","name":"Bob"}"#).is_err());
    }
}
