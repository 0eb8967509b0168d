// Insert-contract validation.
//
// `parse` turns untrusted JSON into an entity's insert struct, checking every
// field against its descriptor and reporting all violations at once.
// `verify` runs the same checks on an already-typed insert struct; both
// storage backends call it before touching storage.

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::descriptor::{EntityDescriptor, FieldDescriptor, FieldType, TextFormat};
use crate::models::{self, Entity};

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 ().\-]{5,30}$").unwrap();
    static ref CURRENCY_RE: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
}

/// Field-level validation report for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("validation failed for {entity}: {}", summary(.fields))]
pub struct ValidationError {
    pub entity: &'static str,
    pub fields: BTreeMap<String, Vec<String>>,
}

fn summary(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, reasons)| format!("{} {}", field, reasons.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            fields: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, field: &str, reason: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn reasons(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Validate untrusted input against `E`'s insert contract.
///
/// Unknown keys and server-assigned keys are rejected, never ignored.
/// Absent or null optional fields are left out so storage defaults apply.
pub fn parse<E: Entity>(input: &Value) -> Result<E::Insert, ValidationError> {
    let fields = check_payload(E::DESCRIPTOR, input, E::check_rules)?;
    serde_json::from_value(Value::Object(fields)).map_err(|e| {
        let mut report = ValidationError::new(E::DESCRIPTOR.table);
        report.add("_payload", e.to_string());
        report
    })
}

/// Re-check a typed insert struct; used by stores before persisting
pub fn verify<E: Entity>(new: &E::Insert) -> Result<E::Insert, ValidationError> {
    let value = serde_json::to_value(new).map_err(|e| {
        let mut report = ValidationError::new(E::DESCRIPTOR.table);
        report.add("_payload", e.to_string());
        report
    })?;
    parse::<E>(&value)
}

/// Validate a payload for the entity stored in `table`
pub fn validate_payload(table: &str, input: &Value) -> Result<(), ValidationError> {
    fn check<E: Entity>(input: &Value) -> Result<(), ValidationError> {
        parse::<E>(input).map(|_| ())
    }

    match table {
        "users" => check::<models::User>(input),
        "user_profiles" => check::<models::UserProfile>(input),
        "billing_history" => check::<models::BillingHistory>(input),
        "team_members" => check::<models::TeamMember>(input),
        "funnels" => check::<models::Funnel>(input),
        "pages" => check::<models::Page>(input),
        "lead_magnets" => check::<models::LeadMagnet>(input),
        "leads" => check::<models::Lead>(input),
        "templates" => check::<models::Template>(input),
        "email_campaigns" => check::<models::EmailCampaign>(input),
        "email_templates" => check::<models::EmailTemplate>(input),
        "email_contacts" => check::<models::EmailContact>(input),
        "email_automations" => check::<models::EmailAutomation>(input),
        "email_sends" => check::<models::EmailSend>(input),
        _ => {
            let mut report = ValidationError::new("unknown");
            report.add("_entity", format!("unknown entity {}", table));
            Err(report)
        },
    }
}

/// Check every field, returning the normalized field map
fn check_payload(
    descriptor: &'static EntityDescriptor,
    input: &Value,
    rules: fn(&Map<String, Value>, &mut ValidationError),
) -> Result<Map<String, Value>, ValidationError> {
    let mut report = ValidationError::new(descriptor.table);

    let Some(object) = input.as_object() else {
        report.add("_payload", "must be a JSON object");
        return Err(report);
    };

    for key in object.keys() {
        match descriptor.field(key) {
            None => report.add(key, "unknown field"),
            Some(field) if field.is_server_assigned() => {
                report.add(key, "is assigned by the server and cannot be supplied")
            },
            Some(_) => {},
        }
    }

    let mut normalized = Map::new();
    for field in descriptor.insertable_fields() {
        match object.get(field.name) {
            None | Some(Value::Null) => {
                if field.is_required() {
                    report.add(field.name, "is required");
                } else if field.nullable {
                    normalized.insert(field.name.to_string(), Value::Null);
                }
            },
            Some(value) => match check_value(field, value) {
                Ok(value) => {
                    normalized.insert(field.name.to_string(), value);
                },
                Err(reason) => report.add(field.name, reason),
            },
        }
    }

    // Cross-field rules only make sense once each field is well-formed
    if report.is_empty() {
        rules(&normalized, &mut report);
    }

    report.into_result()?;
    Ok(normalized)
}

/// Check one present, non-null value and return its canonical form
fn check_value(field: &FieldDescriptor, value: &Value) -> Result<Value, String> {
    match field.ty {
        FieldType::Serial => Err("is assigned by the server".to_string()),
        FieldType::Text { max_len, format } => {
            let text = value.as_str().ok_or("must be a string")?;
            if !field.nullable && text.trim().is_empty() {
                return Err("must not be blank".to_string());
            }
            if let Some(max) = max_len {
                if text.chars().count() > max {
                    return Err(format!("must be at most {} characters", max));
                }
            }
            check_format(text, format)?;
            Ok(value.clone())
        },
        FieldType::Integer { min } => {
            let number = value.as_i64().ok_or("must be an integer")?;
            if number < i64::from(i32::MIN) || number > i64::from(i32::MAX) {
                return Err("is out of range".to_string());
            }
            if let Some(min) = min {
                if number < min {
                    return Err(format!("must be at least {}", min));
                }
            }
            Ok(value.clone())
        },
        FieldType::Boolean => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| "must be a boolean".to_string()),
        FieldType::Timestamp => {
            let text = value.as_str().ok_or("must be an RFC 3339 timestamp")?;
            let parsed = DateTime::parse_from_rfc3339(text)
                .map_err(|_| "must be an RFC 3339 timestamp".to_string())?;
            Ok(Value::String(
                parsed
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ))
        },
        FieldType::Decimal { precision, scale } => {
            check_decimal(value, precision, scale).map(Value::String)
        },
        FieldType::Json => {
            if value.is_object() || value.is_array() {
                Ok(value.clone())
            } else {
                Err("must be a JSON object or array".to_string())
            }
        },
        FieldType::JsonList { min_items } => {
            let items = value.as_array().ok_or("must be a JSON array")?;
            if items.len() < min_items {
                return Err(format!("must contain at least {} item(s)", min_items));
            }
            Ok(value.clone())
        },
        FieldType::TextList => {
            let items = value.as_array().ok_or("must be an array of strings")?;
            if items.iter().all(Value::is_string) {
                Ok(value.clone())
            } else {
                Err("must be an array of strings".to_string())
            }
        },
        FieldType::Enum(values) => {
            let text = value.as_str().ok_or("must be a string")?;
            if values.contains(&text) {
                Ok(value.clone())
            } else {
                Err(format!("must be one of: {}", values.join(", ")))
            }
        },
    }
}

fn check_format(text: &str, format: TextFormat) -> Result<(), String> {
    let reason = match format {
        TextFormat::Plain => return Ok(()),
        TextFormat::Email if validator::validate_email(text) => return Ok(()),
        TextFormat::Url if validator::validate_url(text) => return Ok(()),
        TextFormat::Phone if PHONE_RE.is_match(text) => return Ok(()),
        TextFormat::Currency if CURRENCY_RE.is_match(text) => return Ok(()),
        TextFormat::Email => "must be a valid email address",
        TextFormat::Url => "must be a valid URL",
        TextFormat::Phone => "must be a valid phone number",
        TextFormat::Currency => "must be a three-letter upper-case currency code",
    };
    Err(reason.to_string())
}

/// Fixed-point check: excess fractional digits are rejected, never rounded.
/// Returns the value rendered at exactly `scale` digits.
fn check_decimal(value: &Value, precision: u32, scale: u32) -> Result<String, String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        // Original digits survive: serde_json keeps arbitrary precision
        Value::Number(n) => n.to_string(),
        _ => return Err("must be a decimal number".to_string()),
    };
    // Exponents far outside any column's precision never parse into BigDecimal
    if let Some((_, exp)) = text.split_once(['e', 'E']) {
        if exp.parse::<i32>().map_or(true, |e| e.unsigned_abs() > 1000) {
            return Err("must be a decimal number".to_string());
        }
    }
    let decimal = BigDecimal::from_str(&text).map_err(|_| "must be a decimal number".to_string())?;

    // Exponent stays i64: a narrowing cast would let "1e-4294967297" through
    let normalized = decimal.normalized();
    let (digits, exponent) = normalized.as_bigint_and_exponent();
    if exponent > i64::from(scale) {
        return Err(format!(
            "must have at most {} decimal places (got {})",
            scale, text
        ));
    }

    let significant = digits.to_string().trim_start_matches('-').len() as i64;
    let integer_digits = if digits.to_string() == "0" {
        0
    } else {
        (significant - exponent).max(0)
    };
    let max_integer_digits = i64::from(precision - scale);
    if integer_digits > max_integer_digits {
        return Err(format!(
            "must have at most {} digits before the decimal point",
            max_integer_digits
        ));
    }

    // Both checks passed, so the rescale is bounded by precision
    Ok(normalized.with_scale(i64::from(scale)).to_string())
}
