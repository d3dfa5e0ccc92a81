//! Form capture: named text inputs coerced into typed record patches.

use crate::collection::merge_patch;
use crate::error::{AccordError, Result};
use crate::money::Money;
use crate::schema::{parse_date, FieldKind, Record};
use crate::validation::{validate_form, validate_partial, RuleSet, ValidationErrors};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Named string fields as read from an input surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` pairs. The value may itself contain `=`.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut form = FormData::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                AccordError::Other(format!("Expected key=value, got '{pair}'"))
            })?;
            form.set(key.trim(), value);
        }
        Ok(form)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// Coerce every field of `form` by its declared kind.
///
/// Fields missing from the record's allow-list are rejected. Blank numeric
/// and id inputs become `null`, which a merge leaves untouched.
pub fn to_patch<R: Record>(form: &FormData) -> Result<Map<String, Value>> {
    let mut patch = Map::new();
    let mut errors = ValidationErrors::new();
    for (name, raw) in &form.fields {
        let Some(spec) = R::field(name) else {
            errors.add(name, format!("Unknown field '{name}'"));
            continue;
        };
        match coerce(spec.kind, raw) {
            Ok(value) => {
                patch.insert(name.clone(), value);
            }
            Err(message) => errors.add(name, message),
        }
    }
    errors.into_result()?;
    Ok(patch)
}

fn coerce(kind: FieldKind, raw: &str) -> std::result::Result<Value, String> {
    let trimmed = raw.trim();
    let value = match kind {
        FieldKind::Text => Value::String(raw.to_string()),
        FieldKind::Number => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            let n: f64 = trimmed.parse().map_err(|_| "must be a number".to_string())?;
            if n.fract() == 0.0 && n >= 0.0 {
                Value::from(n as u64)
            } else {
                serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| "must be a number".to_string())?
            }
        }
        FieldKind::Money => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            let amount = Money::parse(trimmed).ok_or_else(|| "must be an amount".to_string())?;
            serde_json::to_value(amount).map_err(|e| e.to_string())?
        }
        FieldKind::Bool => Value::Bool(matches!(
            trimmed.to_lowercase().as_str(),
            "true" | "on" | "yes" | "1"
        )),
        FieldKind::Date => {
            if trimmed.is_empty() {
                Value::String(String::new())
            } else {
                let date = parse_date(trimmed)
                    .ok_or_else(|| "must be a date (YYYY-MM-DD)".to_string())?;
                Value::String(date.format("%Y-%m-%d").to_string())
            }
        }
        FieldKind::List => Value::Array(
            split_list(trimmed)
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        FieldKind::Id => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            let id: i64 = trimmed.parse().map_err(|_| "must be a record id".to_string())?;
            Value::from(id)
        }
        FieldKind::IdList => {
            let mut ids = Vec::new();
            for part in split_list(trimmed) {
                let id: i64 = part.parse().map_err(|_| format!("'{part}' is not a record id"))?;
                ids.push(Value::from(id));
            }
            Value::Array(ids)
        }
        FieldKind::Object => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(trimmed).map_err(|e| format!("must be JSON: {e}"))?
        }
    };
    Ok(value)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Build a new record from a submitted form. The id is left at zero for
/// the collection to assign.
pub fn capture_new<R: Record + Default>(form: &FormData, rules: &RuleSet) -> Result<R> {
    validate_form(form.values(), rules).into_result()?;
    let patch = to_patch::<R>(form)?;
    merge_patch(&R::default(), &patch)
}

/// A validated patch for an edit form. Only submitted fields are checked.
pub fn capture_update<R: Record>(form: &FormData, rules: &RuleSet) -> Result<Map<String, Value>> {
    validate_partial(form.values(), rules).into_result()?;
    to_patch::<R>(form)
}
