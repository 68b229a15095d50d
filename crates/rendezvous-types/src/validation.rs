//! Field constraints and the validated inputs the store accepts.
//!
//! Request types in [`crate::api`] are converted into the types here through
//! their `validate` methods. Everything past this boundary can assume every
//! constraint already holds.

use serde::Serialize;

use crate::models::Gender;

pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 120;
pub const MAX_NAME_CHARS: usize = 100;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// One or more fields failed their constraints.
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("Validation failed: {}", describe(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    #[cfg(test)]
    pub(crate) fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates field errors so a caller sees every problem at once.
#[derive(Debug, Default)]
pub(crate) struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub(crate) fn check(&mut self, field: &'static str, result: Result<(), String>) {
        if let Err(message) = result {
            self.push(field, message);
        }
    }

    pub(crate) fn absorb(&mut self, err: ValidationError) {
        self.errors.extend(err.errors);
    }

    pub(crate) fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.into_error())
        }
    }

    pub(crate) fn into_error(self) -> ValidationError {
        ValidationError {
            errors: self.errors,
        }
    }
}

/// Non-empty, at most `max_chars` characters. Whitespace counts.
pub fn validate_text(value: &str, max_chars: Option<usize>) -> Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".into());
    }
    if let Some(max) = max_chars {
        let len = value.chars().count();
        if len > max {
            return Err(format!("must be at most {max} characters, got {len}"));
        }
    }
    Ok(())
}

pub fn validate_age(age: i64) -> Result<(), String> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(format!(
            "must be between {MIN_AGE} and {MAX_AGE}, got {age}"
        ));
    }
    Ok(())
}

/// A validated page window: `page >= 1`, `limit` in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: i64,
    limit: i64,
}

impl Page {
    pub fn new(page: i64, limit: i64) -> Result<Self, ValidationError> {
        let mut checker = Checker::new();
        if page < 1 {
            checker.push("page", format!("must be at least 1, got {page}"));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            checker.push(
                "limit",
                format!("must be between 1 and {MAX_LIMIT}, got {limit}"),
            );
        }
        checker.finish(Self { page, limit })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows to skip. Saturates so absurd page numbers just land past the end.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Conjunctive filters for listing profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileFilter {
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub name: String,
    pub age: i64,
    pub gender: Gender,
    pub description: Option<String>,
    pub interests: Option<String>,
    pub contact: String,
}

/// Changes for a partial profile update. `None` leaves the stored value alone.
/// For the nullable text fields, `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub description: Option<Option<String>>,
    pub interests: Option<Option<String>>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub author_name: String,
    pub content: String,
}
