//! Form-boundary validation.
//!
//! Presence and range checks applied before input reaches the store. The
//! store never produces or receives a [`ValidationError`].

use super::comment::CommentDraft;
use super::product::ProductDraft;

/// Errors that can occur when validating form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The product name is empty after trimming.
    #[error("product name cannot be empty")]
    EmptyName,
    /// The image location is empty after trimming.
    #[error("image URL is required")]
    EmptyImageUrl,
    /// The weight is empty after trimming.
    #[error("weight is required")]
    EmptyWeight,
    /// The comment text is empty after trimming.
    #[error("comment cannot be empty")]
    EmptyDescription,
    /// A dimension is zero or negative.
    #[error("{field} must be greater than zero (got {value})")]
    NonPositiveDimension {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A dimension is NaN or infinite.
    #[error("{field} must be a finite number")]
    NonFiniteDimension {
        /// Offending field.
        field: &'static str,
    },
}

impl ProductDraft {
    /// Validate and normalize the draft.
    ///
    /// Trims the name, image URL and weight.
    ///
    /// # Errors
    ///
    /// Returns an error if a text field is blank or a dimension is not a
    /// finite positive number.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.image_url = self.image_url.trim().to_owned();
        if self.image_url.is_empty() {
            return Err(ValidationError::EmptyImageUrl);
        }
        self.weight = self.weight.trim().to_owned();
        if self.weight.is_empty() {
            return Err(ValidationError::EmptyWeight);
        }
        check_dimension("width", self.size.width)?;
        check_dimension("height", self.size.height)?;
        Ok(self)
    }
}

impl CommentDraft {
    /// Validate and trim the comment text.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDescription`] if the text is blank.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.description = self.description.trim().to_owned();
        if self.description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        Ok(self)
    }
}

fn check_dimension(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteDimension { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveDimension { field, value });
    }
    Ok(())
}
