//! Request field parsing and validation.
//!
//! Request bodies arrive either as JSON objects or as multipart text fields.
//! Both are collected into [Fields], and each field is parsed on its own so
//! that every problem with a request can be reported at once in a
//! [FieldErrors].
//!
//! Strings are trimmed and empty strings are treated as null, so a form that
//! submits `notas=""` clears the notes.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use axum::{Json, extract::rejection::JsonRejection};
use serde::Serialize;
use serde_json::{Map, Value};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, database_id::DatabaseId};

/// The maximum number of characters in a short text field.
pub const MAX_TEXT_LENGTH: usize = 255;

/// The largest amount that can be stored (ten digits with two decimal places).
pub const MAX_AMOUNT: f64 = 99_999_999.99;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The error messages for each invalid field in a request, keyed by field
/// name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty set of field errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create field errors with a single message for `field`.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Add an error message for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Whether there are no errors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The error messages for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Convert into a [Error::Validation] if there are any errors.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.values().flatten().map(String::as_str).collect();

        write!(f, "{}", messages.join(" "))
    }
}

/// The state of a single field after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// The field was not in the request.
    Absent,
    /// The field was null or an empty string.
    Null,
    /// The field was present but could not be parsed. The reason has already
    /// been added to the [FieldErrors].
    Invalid,
    /// The parsed value.
    Value(T),
}

impl<T> Field<T> {
    /// Resolve a field that must have a value.
    ///
    /// An absent field falls back to `current`, the stored value when
    /// updating a record. Null, or absent with nothing stored, is an error.
    pub fn required(self, name: &str, current: Option<T>, errors: &mut FieldErrors) -> Option<T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Invalid => None,
            Field::Absent if current.is_some() => current,
            Field::Absent | Field::Null => {
                errors.add(name, format!("The {} field is required.", label(name)));
                None
            }
        }
    }

    /// Resolve a field that may be cleared.
    ///
    /// An absent field falls back to `current`, null clears the field.
    pub fn nullable(self, current: Option<T>) -> Option<T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Absent => current,
            Field::Null | Field::Invalid => None,
        }
    }
}

/// The fields of a request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Map<String, Value>);

impl Fields {
    /// Create an empty set of fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the fields from a JSON value.
    ///
    /// # Errors
    /// Returns an [Error::InvalidPayload] if `value` is not a JSON object.
    pub fn from_json(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(Error::InvalidPayload(
                "The request body must be a JSON object.".to_owned(),
            )),
        }
    }

    /// Add a text field, e.g. from a multipart form.
    pub fn insert_text(&mut self, name: &str, value: String) {
        self.0.insert(name.to_owned(), Value::String(value));
    }

    fn raw(&self, name: &str) -> Field<&Value> {
        match self.0.get(name) {
            None => Field::Absent,
            Some(Value::Null) => Field::Null,
            Some(Value::String(text)) if text.trim().is_empty() => Field::Null,
            Some(value) => Field::Value(value),
        }
    }

    /// Parse a string field, rejecting strings longer than `max_length`
    /// characters.
    pub fn text(
        &self,
        name: &str,
        max_length: Option<usize>,
        errors: &mut FieldErrors,
    ) -> Field<String> {
        let value = match self.raw(name) {
            Field::Value(value) => value,
            Field::Absent => return Field::Absent,
            _ => return Field::Null,
        };

        let Value::String(text) = value else {
            errors.add(name, format!("The {} field must be a string.", label(name)));
            return Field::Invalid;
        };

        let text = text.trim();

        match max_length {
            Some(max_length) if text.chars().count() > max_length => {
                errors.add(
                    name,
                    format!(
                        "The {} field must not be greater than {max_length} characters.",
                        label(name)
                    ),
                );
                Field::Invalid
            }
            _ => Field::Value(text.to_owned()),
        }
    }

    /// Parse a non-negative money amount, rounded to cents.
    ///
    /// Both JSON numbers and numeric strings are accepted.
    pub fn amount(&self, name: &str, errors: &mut FieldErrors) -> Field<f64> {
        let value = match self.raw(name) {
            Field::Value(value) => value,
            Field::Absent => return Field::Absent,
            _ => return Field::Null,
        };

        let amount = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };

        match amount {
            Some(amount) if amount.is_finite() => {
                if amount < 0.0 {
                    errors.add(
                        name,
                        format!("The {} field must be at least 0.", label(name)),
                    );
                    Field::Invalid
                } else if amount > MAX_AMOUNT {
                    errors.add(
                        name,
                        format!(
                            "The {} field must not be greater than {MAX_AMOUNT}.",
                            label(name)
                        ),
                    );
                    Field::Invalid
                } else {
                    Field::Value((amount * 100.0).round() / 100.0)
                }
            }
            _ => {
                errors.add(name, format!("The {} field must be a number.", label(name)));
                Field::Invalid
            }
        }
    }

    /// Parse a calendar date in the form `YYYY-MM-DD`.
    pub fn date(&self, name: &str, errors: &mut FieldErrors) -> Field<Date> {
        let value = match self.raw(name) {
            Field::Value(value) => value,
            Field::Absent => return Field::Absent,
            _ => return Field::Null,
        };

        match value
            .as_str()
            .and_then(|text| Date::parse(text.trim(), DATE_FORMAT).ok())
        {
            Some(date) => Field::Value(date),
            None => {
                errors.add(
                    name,
                    format!("The {} field must be a valid date.", label(name)),
                );
                Field::Invalid
            }
        }
    }

    /// Parse a database ID.
    ///
    /// Both JSON integers and numeric strings are accepted.
    pub fn id(&self, name: &str, errors: &mut FieldErrors) -> Field<DatabaseId> {
        let value = match self.raw(name) {
            Field::Value(value) => value,
            Field::Absent => return Field::Absent,
            _ => return Field::Null,
        };

        let id = match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse::<DatabaseId>().ok(),
            _ => None,
        };

        match id {
            Some(id) => Field::Value(id),
            None => {
                errors.add(
                    name,
                    format!("The {} field must be an integer.", label(name)),
                );
                Field::Invalid
            }
        }
    }

    /// Parse one of a fixed set of string tags.
    pub fn choice<T: FromStr>(&self, name: &str, errors: &mut FieldErrors) -> Field<T> {
        let value = match self.raw(name) {
            Field::Value(value) => value,
            Field::Absent => return Field::Absent,
            _ => return Field::Null,
        };

        match value.as_str().and_then(|text| text.trim().parse().ok()) {
            Some(choice) => Field::Value(choice),
            None => {
                errors.add(name, format!("The selected {} is invalid.", label(name)));
                Field::Invalid
            }
        }
    }
}

/// Read the fields from a JSON request body.
///
/// # Errors
/// Returns an [Error::InvalidPayload] if the body is not a JSON object.
pub fn fields_from_json(payload: Result<Json<Value>, JsonRejection>) -> Result<Fields, Error> {
    let Json(value) = payload.map_err(|rejection| Error::InvalidPayload(rejection.body_text()))?;

    Fields::from_json(value)
}

/// The human readable name of a field, e.g. "fecha emision" for "fecha_emision".
fn label(name: &str) -> String {
    name.replace('_', " ")
}
