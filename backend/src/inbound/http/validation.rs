//! Shared validation helpers for the HTTP adapter.
//!
//! Validation failures are `invalid_request` errors carrying a structured
//! `{field, code}` detail object so clients can highlight the offending
//! input.

use chrono::{DateTime, Utc};
use pagination::{PageRequest, PageRequestError};
use serde_json::json;

use crate::domain::{BloodType, Error, RequestStatus, Urgency};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidValue,
    InvalidUuid,
    InvalidTimestamp,
    OutOfRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::OutOfRange => "out_of_range",
        }
    }
}

/// Newtype for HTTP field names so call sites cannot mix them up with
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn value_error(field: FieldName, message: String, code: ErrorCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

/// Reject empty or whitespace-only required strings.
pub(crate) fn require_non_empty(value: &str, field: FieldName) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(missing_field_error(field));
    }
    Ok(())
}

pub(crate) fn parse_blood_type(value: &str, field: FieldName) -> Result<BloodType, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        value_error(
            field,
            format!("{name} must be an ABO/Rh blood type such as A+ or O-"),
            ErrorCode::InvalidValue,
            value,
        )
    })
}

pub(crate) fn parse_urgency(value: &str, field: FieldName) -> Result<Urgency, Error> {
    value.parse().map_err(|()| {
        let name = field.as_str();
        value_error(
            field,
            format!("{name} must be one of low, medium, high, critical"),
            ErrorCode::InvalidValue,
            value,
        )
    })
}

pub(crate) fn parse_request_status(value: &str, field: FieldName) -> Result<RequestStatus, Error> {
    value.parse().map_err(|()| {
        let name = field.as_str();
        value_error(
            field,
            format!("{name} must be one of open, in-progress, fulfilled, closed"),
            ErrorCode::InvalidValue,
            value,
        )
    })
}

pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    value.parse().map_err(|_| {
        let name = field.as_str();
        value_error(
            field,
            format!("{name} must be a valid UUID"),
            ErrorCode::InvalidUuid,
            value,
        )
    })
}

pub(crate) fn parse_rfc3339_timestamp(
    value: &str,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            let name = field.as_str();
            value_error(
                field,
                format!("{name} must be an RFC 3339 timestamp"),
                ErrorCode::InvalidTimestamp,
                value,
            )
        })
}

/// Map pagination query parameters onto a validated [`PageRequest`].
pub(crate) fn parse_page_request(
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<PageRequest, Error> {
    PageRequest::try_new(page, limit).map_err(|err| {
        let field = match err {
            PageRequestError::ZeroPage => FieldName::new("page"),
            PageRequestError::ZeroLimit | PageRequestError::LimitTooLarge { .. } => {
                FieldName::new("limit")
            }
        };
        field_error(field, err.to_string(), ErrorCode::OutOfRange)
    })
}

/// Units must be at least one.
pub(crate) fn require_positive_units(value: u32, field: FieldName) -> Result<u32, Error> {
    if value == 0 {
        let name = field.as_str();
        return Err(field_error(
            field,
            format!("{name} must be at least 1"),
            ErrorCode::OutOfRange,
        ));
    }
    Ok(value)
}
