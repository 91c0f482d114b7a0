//! Per-field payload validation.
//!
//! Handlers run every check on a payload before touching the store, so a
//! response lists all failing fields at once and nothing is partially applied.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const NOT_A_STRING: &str = "Not a valid string.";

/// Field name → messages, serialised as a JSON object.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn single(field: &str, message: impl Into<String>) -> Self {
    let mut errors = Self::default();
    errors.add(field, message);
    errors
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  /// `Ok` if nothing was recorded, otherwise the collected errors.
  pub fn finish(self) -> Result<(), ApiError> {
    if self.is_empty() { Ok(()) } else { Err(ApiError::Validation(self)) }
  }
}

/// Options for a single text field.
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
  pub max_len: usize,
  /// Strip surrounding whitespace before checking.
  pub trim:    bool,
}

impl TextRule {
  pub const fn trimmed(max_len: usize) -> Self { Self { max_len, trim: true } }

  pub const fn raw(max_len: usize) -> Self { Self { max_len, trim: false } }
}

/// A field that must be present and non-blank.
///
/// Payload fields arrive as raw JSON so a value of the wrong type is reported
/// against its field instead of failing the whole body.
pub fn required(
  errors: &mut FieldErrors,
  field:  &str,
  value:  Option<Value>,
  rule:   TextRule,
) -> Option<String> {
  match value {
    Some(v) => check_text(errors, field, v, rule),
    None => {
      errors.add(field, REQUIRED);
      None
    }
  }
}

/// A field that may be absent; when present it must be non-blank.
pub fn optional(
  errors: &mut FieldErrors,
  field:  &str,
  value:  Option<Value>,
  rule:   TextRule,
) -> Option<String> {
  value.and_then(|v| check_text(errors, field, v, rule))
}

fn check_text(
  errors: &mut FieldErrors,
  field:  &str,
  value:  Value,
  rule:   TextRule,
) -> Option<String> {
  let Value::String(value) = value else {
    errors.add(field, NOT_A_STRING);
    return None;
  };
  let value = if rule.trim { value.trim().to_owned() } else { value };

  if value.is_empty() {
    errors.add(field, BLANK);
    return None;
  }
  if value.chars().count() > rule.max_len {
    errors.add(
      field,
      format!("Ensure this field has no more than {} characters.", rule.max_len),
    );
    return None;
  }
  Some(value)
}

/// Shape check for an email address: a dot-atom local part, one `@`, and a
/// dotted hostname (or `localhost`).
pub fn is_valid_email(email: &str) -> bool {
  match email.split_once('@') {
    Some((local, domain)) => is_valid_local_part(local) && is_valid_domain(domain),
    None => false,
  }
}

fn is_valid_local_part(local: &str) -> bool {
  const SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-";
  !local.is_empty()
    && local.split('.').all(|atom| {
      !atom.is_empty()
        && atom.chars().all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c))
    })
}

fn is_valid_domain(domain: &str) -> bool {
  if domain.eq_ignore_ascii_case("localhost") {
    return true;
  }
  let labels: Vec<&str> = domain.split('.').collect();
  let Some(tld) = labels.last() else {
    return false;
  };
  labels.len() >= 2
    && tld.len() >= 2
    && labels.iter().all(|label| {
      (1..=63).contains(&label.len())
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// [`required`]/[`optional`] output, further checked as an email address.
pub fn email(errors: &mut FieldErrors, value: Option<String>) -> Option<String> {
  let value = value?;
  if is_valid_email(&value) {
    Some(value)
  } else {
    errors.add("email", INVALID_EMAIL);
    None
  }
}
