//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every validation failure becomes an `invalid_request` error whose
//! `details` name the offending payload field and a stable code.

use serde_json::json;

use crate::domain::{
    BirthdayWindowError, ContactValidationError, CredentialsValidationError, Error,
    QueryValidationError,
};

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) const FIRST_NAME: FieldName = FieldName::new("first_name");
pub(crate) const LAST_NAME: FieldName = FieldName::new("last_name");
pub(crate) const EMAIL: FieldName = FieldName::new("email");
pub(crate) const PHONE: FieldName = FieldName::new("phone");
pub(crate) const DATA: FieldName = FieldName::new("data");
pub(crate) const PASSWORD: FieldName = FieldName::new("password");

fn field_error(field: FieldName, message: impl std::fmt::Display, code: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field}: {message}")).with_details(json!({
        "field": field,
        "code": code,
    }))
}

/// Map a contact field validation failure onto `field`.
pub(crate) fn contact_field_error(field: FieldName) -> impl FnOnce(ContactValidationError) -> Error {
    move |err| field_error(field, &err, err.code())
}

pub(crate) fn credentials_error(err: CredentialsValidationError) -> Error {
    let (field, code) = match err {
        CredentialsValidationError::EmptyEmail => (EMAIL, "empty"),
        CredentialsValidationError::EmptyPassword => (PASSWORD, "empty"),
        CredentialsValidationError::PasswordTooShort => (PASSWORD, "too_short"),
        CredentialsValidationError::PasswordTooLong { .. } => (PASSWORD, "too_long"),
    };
    field_error(field, &err, code)
}

pub(crate) fn query_error(err: QueryValidationError) -> Error {
    match err {
        QueryValidationError::NoSearchFilters => Error::invalid_request(err.to_string()),
        QueryValidationError::LimitOutOfRange { .. } => {
            field_error(FieldName::new("limit"), &err, "out_of_range")
        }
    }
}

pub(crate) fn birthday_window_error(err: BirthdayWindowError) -> Error {
    field_error(FieldName::new("days"), &err, "out_of_range")
}
