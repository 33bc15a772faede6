use crate::error::{AppError, FieldErrors};

/// A validation failure on a single field, for checks that need the store.
pub fn field_error(field: &'static str, message: impl Into<String>) -> AppError {
    let mut errors = FieldErrors::new();
    errors.insert(field, message.into());
    AppError::Validation(errors)
}

/// Collects per-field messages; the first failure for a field wins.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) -> &mut Self {
        self.errors.entry(field).or_insert_with(|| message.into());
        self
    }

    pub fn required(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, format!("{field} is required"));
        }
        self
    }

    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 {
            return self.required(field, value);
        }
        if len < min {
            self.add(field, format!("{field} must have at least {min} characters"));
        } else if len > max {
            self.add(field, format!("{field} must have at most {max} characters"));
        }
        self
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        let value = value.trim();
        if value.is_empty() {
            return self.required(field, value);
        }
        let valid = value
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            self.add(field, format!("{field} must be a valid email address"));
        }
        self
    }

    pub fn positive(&mut self, field: &'static str, value: i64) -> &mut Self {
        if value < 1 {
            self.add(field, format!("{field} must be greater than 0"));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
