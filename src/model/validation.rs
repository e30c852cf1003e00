use thiserror::Error;

/// A record failed local checks and was not submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{field} is required")]
  Missing { field: &'static str },

  #[error("{field} is invalid: {reason}")]
  Invalid { field: &'static str, reason: String },
}

impl ValidationError {
  pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Invalid {
      field,
      reason: reason.into(),
    }
  }
}

/// Fail with `Missing` when the trimmed value is empty.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    Err(ValidationError::Missing { field })
  } else {
    Ok(())
  }
}

/// Fail unless `value` is a finite number that is not negative.
pub fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
  if value.is_finite() && value >= 0.0 {
    Ok(())
  } else {
    Err(ValidationError::invalid(field, "must be zero or more"))
  }
}
