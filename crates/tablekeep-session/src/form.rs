//! Placing a normalized error on a form.

use std::collections::BTreeMap;

use tablekeep_protocol::ApiError;

/// Where an [`ApiError`] should be shown on a form.
///
/// A validation failure with `details` becomes one message per field,
/// rendered next to the offending input. Everything else (bad
/// credentials, a server error, no connection) becomes a single root
/// message, rendered as a banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, String>,
    root: Option<String>,
}

impl FormErrors {
    pub fn from_api_error(err: &ApiError) -> Self {
        if !err.has_field_errors() {
            return Self {
                fields: BTreeMap::new(),
                root: Some(err.message.clone()),
            };
        }

        // Later details for the same field replace earlier ones.
        let fields = err
            .field_errors()
            .iter()
            .map(|detail| (detail.field.clone(), detail.message.clone()))
            .collect();

        Self { fields, root: None }
    }

    /// The message for `field`, if the server rejected it.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The form-wide message, if the error wasn't about specific fields.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Field messages in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.root.is_none()
    }
}

impl From<&ApiError> for FormErrors {
    fn from(err: &ApiError) -> Self {
        Self::from_api_error(err)
    }
}
