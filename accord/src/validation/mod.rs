//! Typed form validation: per-field rules producing a field → message map.

use crate::error::Result;
use crate::money::Money;
use crate::schema::Record;
use crate::settings::Settings;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` unless the field already has one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        for (field, message) in other.errors {
            self.add(field, message);
        }
    }

    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.errors.values().map(String::as_str).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Format checks a value must pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Email,
    Phone,
    Number,
    /// A currency amount such as `1234.50` or `$1,234.50`.
    Money,
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub label: String,
    pub required: bool,
    pub value_type: Option<ValueType>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Rule {
    pub fn new(label: impl Into<String>) -> Self {
        Rule {
            label: label.into(),
            required: false,
            value_type: None,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn required_if(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn of(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    /// First failing check for `value`, if any.
    pub fn check(&self, value: Option<&str>) -> Option<String> {
        let label = &self.label;
        let value = value.map(str::trim).unwrap_or("");
        if value.is_empty() {
            return self.required.then(|| format!("{label} is required"));
        }

        if let Some(kind) = self.value_type {
            let ok = match kind {
                ValueType::Email => email_regex().is_match(value),
                ValueType::Phone => phone_regex().is_match(value),
                ValueType::Number => value.parse::<f64>().is_ok(),
                ValueType::Money => Money::parse(value).is_some(),
                ValueType::Date => crate::schema::parse_date(value).is_some(),
            };
            if !ok {
                return Some(match kind {
                    ValueType::Email => format!("{label} must be a valid email"),
                    ValueType::Phone => format!("{label} must be a valid phone number"),
                    ValueType::Number => format!("{label} must be a number"),
                    ValueType::Money => format!("{label} must be a valid amount"),
                    ValueType::Date => format!("{label} must be a valid date"),
                });
            }
        }

        let chars = value.chars().count();
        if let Some(n) = self.min_length {
            if chars < n {
                return Some(format!("{label} must be at least {n} characters"));
            }
        }
        if let Some(n) = self.max_length {
            if chars > n {
                return Some(format!("{label} must be no more than {n} characters"));
            }
        }

        if self.min.is_some() || self.max.is_some() {
            let Some(number) = self.numeric(value) else {
                return Some(format!("{label} must be a number"));
            };
            if let Some(min) = self.min {
                if number < min {
                    return Some(format!("{label} must be at least {}", trim_float(min)));
                }
            }
            if let Some(max) = self.max {
                if number > max {
                    return Some(format!("{label} must be no more than {}", trim_float(max)));
                }
            }
        }
        None
    }

    fn numeric(&self, value: &str) -> Option<f64> {
        match self.value_type {
            Some(ValueType::Money) => Money::parse(value).map(Money::as_f64),
            _ => value.parse().ok(),
        }
    }
}

fn trim_float(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\(?([0-9]{3})\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$")
            .expect("valid phone regex")
    })
}

/// Ordered rules keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<(String, Rule)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn get(&self, field: &str) -> Option<&Rule> {
        self.rules.iter().find(|(k, _)| k == field).map(|(_, r)| r)
    }
}

/// Check every rule against `values`.
pub fn validate_form(values: &BTreeMap<String, String>, rules: &RuleSet) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (field, rule) in rules.iter() {
        if let Some(message) = rule.check(values.get(field).map(String::as_str)) {
            errors.add(field, message);
        }
    }
    errors
}

/// Check only the rules whose field is present in `values`.
pub fn validate_partial(values: &BTreeMap<String, String>, rules: &RuleSet) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (field, rule) in rules.iter() {
        if let Some(value) = values.get(field) {
            if let Some(message) = rule.check(Some(value)) {
                errors.add(field, message);
            }
        }
    }
    errors
}

/// Scalar fields of a record flattened to form strings.
pub fn record_values<R: Record>(record: &R) -> Result<BTreeMap<String, String>> {
    let value = serde_json::to_value(record)?;
    let mut values = BTreeMap::new();
    if let Value::Object(map) = value {
        for (key, v) in map {
            let text = match v {
                Value::Null => String::new(),
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(items) => items
                    .iter()
                    .map(|i| match i {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                Value::Object(_) => continue,
            };
            values.insert(key, text);
        }
    }
    Ok(values)
}

/// Validate a whole record against `rules`.
pub fn validate_record<R: Record>(record: &R, rules: &RuleSet) -> Result<()> {
    let values = record_values(record)?;
    validate_form(&values, rules).into_result()?;
    Ok(())
}

pub fn member_rules(settings: &Settings) -> RuleSet {
    RuleSet::new()
        .field("firstName", Rule::new("First name").required().max_length(50))
        .field("lastName", Rule::new("Last name").required().max_length(50))
        .field(
            "email",
            Rule::new("Email").required_if(settings.require_email).of(ValueType::Email),
        )
        .field(
            "phone",
            Rule::new("Phone").required_if(settings.require_phone).of(ValueType::Phone),
        )
        .field("mobilePhone", Rule::new("Mobile phone").of(ValueType::Phone))
        .field("workPhone", Rule::new("Work phone").of(ValueType::Phone))
        .field("address", Rule::new("Address").required_if(settings.require_address))
        .field(
            "birthDate",
            Rule::new("Birth date").required_if(settings.require_birth_date).of(ValueType::Date),
        )
        .field("gender", Rule::new("Gender").required_if(settings.require_gender))
        .field(
            "maritalStatus",
            Rule::new("Marital status").required_if(settings.require_marital_status),
        )
        .field("anniversaryDate", Rule::new("Anniversary date").of(ValueType::Date))
        .field("membershipStatus", Rule::new("Membership status").required())
        .field("dateJoined", Rule::new("Date joined").of(ValueType::Date))
        .field("baptismDate", Rule::new("Baptism date").of(ValueType::Date))
        .field("confirmationDate", Rule::new("Confirmation date").of(ValueType::Date))
}

pub fn event_rules() -> RuleSet {
    RuleSet::new()
        .field("title", Rule::new("Title").required().max_length(120))
        .field("type", Rule::new("Event type").required())
        .field("startDate", Rule::new("Start date").required().of(ValueType::Date))
        .field("endDate", Rule::new("End date").of(ValueType::Date))
        .field("repeatUntil", Rule::new("Repeat until").of(ValueType::Date))
        .field("registrationDeadline", Rule::new("Registration deadline").of(ValueType::Date))
        .field("maxCapacity", Rule::new("Max capacity").min(0.0))
        .field("registrationFee", Rule::new("Registration fee").of(ValueType::Money).min(0.0))
        .field("budget", Rule::new("Budget").of(ValueType::Money).min(0.0))
}

pub fn donation_rules() -> RuleSet {
    RuleSet::new()
        .field("donorName", Rule::new("Donor").required())
        .field("amount", Rule::new("Amount").required().of(ValueType::Money).min(0.01))
        .field("date", Rule::new("Date").required().of(ValueType::Date))
        .field("type", Rule::new("Donation type").required())
        .field("method", Rule::new("Payment method").required())
}

pub fn ministry_rules() -> RuleSet {
    RuleSet::new()
        .field("name", Rule::new("Ministry name").required().max_length(100))
        .field("category", Rule::new("Category").required())
        .field("contactEmail", Rule::new("Contact email").of(ValueType::Email))
        .field("annualBudget", Rule::new("Annual budget").of(ValueType::Money).min(0.0))
}

pub fn opportunity_rules() -> RuleSet {
    RuleSet::new()
        .field("title", Rule::new("Title").required().max_length(100))
        .field("ministryId", Rule::new("Ministry").required())
        .field("volunteersNeeded", Rule::new("Volunteers needed").min(1.0))
}

pub fn settings_rules() -> RuleSet {
    RuleSet::new()
        .field("churchName", Rule::new("Church name").required())
        .field("churchEmail", Rule::new("Church email").of(ValueType::Email))
        .field("churchPhone", Rule::new("Church phone").of(ValueType::Phone))
        .field("monthlyGoal", Rule::new("Monthly goal").min(0.0))
        .field("annualGoal", Rule::new("Annual goal").min(0.0))
        .field("buildingFundGoal", Rule::new("Building fund goal").min(0.0))
        .field("defaultEventDuration", Rule::new("Default event duration").min(15.0).max(1440.0))
        .field("weekStartDay", Rule::new("Week start day").min(0.0).max(6.0))
        .field("smtpPort", Rule::new("SMTP port").min(1.0).max(65535.0))
        .field("minPasswordLength", Rule::new("Minimum password length").min(6.0).max(32.0))
        .field("sessionTimeout", Rule::new("Session timeout").min(5.0))
        .field("apiRateLimit", Rule::new("API rate limit").min(1.0))
        .field("backupRetention", Rule::new("Backup retention").min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Member;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_required_message_uses_label() {
        let rules = RuleSet::new().field("firstName", Rule::new("First name").required());
        let errors = validate_form(&values(&[("firstName", "  ")]), &rules);
        assert_eq!(errors.get("firstName"), Some("First name is required"));
    }

    #[test]
    fn test_type_checks() {
        let rules = RuleSet::new()
            .field("email", Rule::new("Email").of(ValueType::Email))
            .field("phone", Rule::new("Phone").of(ValueType::Phone))
            .field("amount", Rule::new("Amount").of(ValueType::Number))
            .field("date", Rule::new("Date").of(ValueType::Date));

        let bad = validate_form(
            &values(&[
                ("email", "not-an-email"),
                ("phone", "12345"),
                ("amount", "ten"),
                ("date", "yesterday"),
            ]),
            &rules,
        );
        assert_eq!(bad.len(), 4);
        assert_eq!(bad.get("email"), Some("Email must be a valid email"));
        assert_eq!(bad.get("phone"), Some("Phone must be a valid phone number"));
        assert_eq!(bad.get("amount"), Some("Amount must be a number"));
        assert_eq!(bad.get("date"), Some("Date must be a valid date"));

        let good = validate_form(
            &values(&[
                ("email", "pastor@accordchurch.org"),
                ("phone", "(555) 123-4567"),
                ("amount", "12.50"),
                ("date", "2024-02-29"),
            ]),
            &rules,
        );
        assert!(good.is_empty());
    }

    #[test]
    fn test_money_fields_accept_currency_formatting() {
        let rules = donation_rules();
        let form = values(&[("amount", "$1,234.50")]);
        assert!(validate_partial(&form, &rules).is_empty());

        let errors = validate_partial(&values(&[("amount", "$0.00")]), &rules);
        assert_eq!(errors.get("amount"), Some("Amount must be at least 0.01"));
        let errors = validate_partial(&values(&[("amount", "92233720368547758.99")]), &rules);
        assert_eq!(errors.get("amount"), Some("Amount must be a valid amount"));
    }

    #[test]
    fn test_optional_blank_values_pass() {
        let rules = RuleSet::new().field("email", Rule::new("Email").of(ValueType::Email));
        assert!(validate_form(&values(&[]), &rules).is_empty());
        assert!(validate_form(&values(&[("email", "")]), &rules).is_empty());
    }

    #[test]
    fn test_length_and_range() {
        let rules = RuleSet::new()
            .field("name", Rule::new("Name").min_length(3).max_length(5))
            .field("amount", Rule::new("Amount").min(1.0).max(100.0));

        let errors = validate_form(&values(&[("name", "Al"), ("amount", "0.5")]), &rules);
        assert_eq!(errors.get("name"), Some("Name must be at least 3 characters"));
        assert_eq!(errors.get("amount"), Some("Amount must be at least 1"));

        let errors = validate_form(&values(&[("name", "Abigail"), ("amount", "250")]), &rules);
        assert_eq!(errors.get("name"), Some("Name must be no more than 5 characters"));
        assert_eq!(errors.get("amount"), Some("Amount must be no more than 100"));
    }

    #[test]
    fn test_member_rules_follow_settings() {
        let mut settings = Settings::default();
        let member = values(&[
            ("firstName", "Esi"),
            ("lastName", "Boateng"),
            ("membershipStatus", "Active"),
        ]);
        assert!(validate_form(&member, &member_rules(&settings)).is_empty());

        settings.require_email = true;
        let errors = validate_form(&member, &member_rules(&settings));
        assert_eq!(errors.get("email"), Some("Email is required"));
    }

    #[test]
    fn test_partial_only_checks_present_fields() {
        let rules = member_rules(&Settings::default());
        let patch = values(&[("email", "bad")]);
        let errors = validate_partial(&patch, &rules);
        assert_eq!(errors.len(), 1);
        assert!(errors.get("firstName").is_none());
    }

    #[test]
    fn test_validate_record() {
        let member = Member {
            first_name: "Esi".into(),
            last_name: "".into(),
            membership_status: "Active".into(),
            ..Default::default()
        };
        let err = validate_record(&member, &member_rules(&Settings::default())).unwrap_err();
        assert!(err.to_string().contains("Last name is required"));
    }

    #[test]
    fn test_display_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("a", "A is required");
        errors.add("b", "B must be a number");
        errors.add("a", "ignored second message");
        assert_eq!(errors.to_string(), "A is required; B must be a number");
    }
}
