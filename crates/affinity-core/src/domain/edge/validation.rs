//! Field validation shared by the edge, graph and traversal layers
//!
//! Every offending field is collected before failing so callers see the full
//! list at once, in the order the checks were declared.

use crate::error::{Error, Result};

/// Accumulates offending field names
#[derive(Debug, Default)]
pub struct FieldCheck {
    fields: Vec<String>,
}

impl FieldCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a non-blank value
    pub fn require(self, field: &str, value: &str) -> Self {
        self.check(field, !value.trim().is_empty())
    }

    /// Optional value; when present it must not be blank
    pub fn optional(self, field: &str, value: Option<&str>) -> Self {
        self.check(field, value.is_none_or(|v| !v.trim().is_empty()))
    }

    /// Require a finite number
    pub fn finite(self, field: &str, value: f64) -> Self {
        self.check(field, value.is_finite())
    }

    /// Flag `field` unless `ok` holds
    pub fn check(mut self, field: &str, ok: bool) -> Self {
        if !ok && !self.fields.iter().any(|f| f == field) {
            self.fields.push(field.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fail with a validation error if anything was flagged
    pub fn finish(self, message: &str) -> Result<()> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(self.fields, message))
        }
    }
}
