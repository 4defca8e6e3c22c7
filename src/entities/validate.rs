use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

use super::{EntityDef, FieldDef, FieldKind};
use crate::database::SqlValue;
use crate::error::FieldErrors;

const PAYLOAD_KEY: &str = "_payload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// A payload value that passed validation, ready to bind
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedField {
    pub field: &'static FieldDef,
    pub value: SqlValue,
}

#[derive(Debug, Default, Error)]
#[error("validation failed for {} field(s)", .0.len())]
pub struct ValidationErrors(FieldErrors);

impl ValidationErrors {
    pub fn single(field: &str, reason: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, reason);
        errors
    }

    pub fn add(&mut self, field: &str, reason: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn into_inner(self) -> FieldErrors {
        self.0
    }

    fn into_result<T>(self, ok: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(ok)
        } else {
            Err(self)
        }
    }
}

/// Check a create/update body against the entity's field definitions.
///
/// Keys the server owns (primary key, `created_at`, `created_by`, `*_label`)
/// are ignored; any other unknown key is an error.
pub fn validate_payload(entity: &EntityDef, payload: &Value, mode: Mode) -> Result<Vec<ValidatedField>, ValidationErrors> {
    let Some(object) = payload.as_object() else {
        return Err(ValidationErrors::single(PAYLOAD_KEY, "expected a JSON object"));
    };

    let mut errors = ValidationErrors::default();

    for key in object.keys() {
        let server_owned = key == entity.primary_key
            || key == "created_at"
            || key == "created_by"
            || key.ends_with("_label");
        if !server_owned && entity.field(key).is_none() {
            errors.add(key, "unknown field");
        }
    }

    let mut fields = Vec::new();
    for field in entity.fields {
        let raw = object.get(field.name);

        if is_blank(raw) {
            match (mode, raw) {
                (Mode::Create, _) if field.required => errors.add(field.name, "is required"),
                // Leaving the password empty on update keeps the stored one
                (Mode::Update, Some(_)) if field.is_hidden() => {}
                (Mode::Update, Some(_)) if field.required => errors.add(field.name, "cannot be empty"),
                (_, Some(_)) | (Mode::Create, None) if field.default.is_some() || raw.is_some() => {
                    fields.push(ValidatedField {
                        field,
                        value: field.blank_value(),
                    })
                }
                _ => {}
            }
            continue;
        }

        if let Some(raw) = raw {
            match parse_value(field, raw) {
                Ok(value) => fields.push(ValidatedField { field, value }),
                Err(reason) => errors.add(field.name, reason),
            }
        }
    }

    if errors.is_empty() && mode == Mode::Update && fields.is_empty() {
        errors.add(PAYLOAD_KEY, "no updatable fields supplied");
    }

    errors.into_result(fields)
}

/// Enforce `start <= end` for every configured date pair, reading the side
/// missing from `fields` out of `existing` when updating.
pub fn check_date_ranges(
    entity: &EntityDef,
    fields: &[ValidatedField],
    existing: Option<&Map<String, Value>>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for (start, end) in entity.date_ranges {
        let start_date = date_of(start, fields, existing);
        let end_date = date_of(end, fields, existing);
        if let (Some(s), Some(e)) = (start_date, end_date) {
            if s > e {
                errors.add(end, format!("must not be before {}", start));
            }
        }
    }

    errors.into_result(())
}

fn date_of(name: &str, fields: &[ValidatedField], existing: Option<&Map<String, Value>>) -> Option<NaiveDate> {
    match fields.iter().find(|f| f.field.name == name) {
        Some(f) => f.value.as_date(),
        None => existing
            .and_then(|row| row.get(name))
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
    }
}

fn is_blank(raw: Option<&Value>) -> bool {
    match raw {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn parse_value(field: &FieldDef, raw: &Value) -> Result<SqlValue, String> {
    match field.kind {
        FieldKind::Text => {
            let s = scalar_string(raw)?;
            check_len(&s, field.max_len)?;
            Ok(SqlValue::Text(s))
        }
        FieldKind::Email => {
            let s = scalar_string(raw)?.to_lowercase();
            check_len(&s, field.max_len)?;
            if !is_email(&s) {
                return Err("must be a valid email address".to_string());
            }
            Ok(SqlValue::Text(s))
        }
        FieldKind::Phone => {
            let s = scalar_string(raw)?;
            let allowed = s.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
            let digits = s.chars().filter(char::is_ascii_digit).count();
            if !allowed || !(6..=20).contains(&digits) {
                return Err("must be a phone number".to_string());
            }
            Ok(SqlValue::Text(s))
        }
        FieldKind::Integer => {
            let n = match raw {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| "must be an integer".to_string())?;
            if field.reference.is_some() && n <= 0 {
                return Err("must be a valid id".to_string());
            }
            Ok(SqlValue::BigInt(n))
        }
        FieldKind::Decimal => {
            let text = match raw {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.trim().to_string(),
                _ => return Err("must be a number".to_string()),
            };
            let d = Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| "must be a number".to_string())?;
            if d.is_sign_negative() && !d.is_zero() {
                return Err("must not be negative".to_string());
            }
            Ok(SqlValue::Numeric(d.round_dp(2)))
        }
        FieldKind::Date => {
            let s = raw.as_str().ok_or_else(|| "must be a date (YYYY-MM-DD)".to_string())?;
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(SqlValue::Date)
                .map_err(|_| "must be a date (YYYY-MM-DD)".to_string())
        }
        FieldKind::Enum(values) => {
            let s = raw
                .as_str()
                .map(|s| s.trim().to_lowercase())
                .ok_or_else(|| format!("must be one of: {}", values.join(", ")))?;
            if values.contains(&s.as_str()) {
                Ok(SqlValue::Text(s))
            } else {
                Err(format!("must be one of: {}", values.join(", ")))
            }
        }
        FieldKind::Password => {
            let s = raw.as_str().ok_or_else(|| "must be a string".to_string())?;
            let len = s.chars().count();
            if len < 6 {
                return Err("must be at least 6 characters".to_string());
            }
            if len > field.max_len {
                return Err(format!("must be at most {} characters", field.max_len));
            }
            Ok(SqlValue::Text(s.to_string()))
        }
    }
}

fn scalar_string(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err("must be a string".to_string()),
    }
}

fn check_len(s: &str, max: usize) -> Result<(), String> {
    if s.chars().count() > max {
        Err(format!("must be at most {} characters", max))
    } else {
        Ok(())
    }
}

fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{find, SqlType};
    use serde_json::json;

    fn ticket() -> Value {
        json!({
            "pnr": "AB12CD",
            "passenger_name": "  Omar Haddad ",
            "customer_id": 3,
            "supp_id": "4",
            "from_place": "DXB",
            "to_place": "LHR",
            "flight_date": "2026-11-02",
            "return_date": "2026-11-20",
            "flight_type": "Return",
            "net_price": 1200.5,
            "sale": "1450",
            "currency_id": 1
        })
    }

    fn value_of<'a>(fields: &'a [ValidatedField], name: &str) -> Option<&'a SqlValue> {
        fields.iter().find(|f| f.field.name == name).map(|f| &f.value)
    }

    #[test]
    fn valid_ticket_is_normalized() {
        let entity = find("tickets").unwrap();
        let fields = validate_payload(entity, &ticket(), Mode::Create).unwrap();

        assert_eq!(value_of(&fields, "passenger_name"), Some(&SqlValue::Text("Omar Haddad".into())));
        assert_eq!(value_of(&fields, "supp_id"), Some(&SqlValue::BigInt(4)));
        assert_eq!(value_of(&fields, "flight_type"), Some(&SqlValue::Text("return".into())));
        assert_eq!(value_of(&fields, "sale"), Some(&SqlValue::Numeric(Decimal::new(1450, 0))));
        assert_eq!(value_of(&fields, "net_price"), Some(&SqlValue::Numeric(Decimal::new(12005, 1))));
        assert!(value_of(&fields, "remarks").is_none());
    }

    #[test]
    fn missing_required_fields_are_reported_together() {
        let entity = find("tickets").unwrap();
        let errors = validate_payload(entity, &json!({ "pnr": "X1" }), Mode::Create).unwrap_err();
        assert_eq!(errors.get("passenger_name"), Some("is required"));
        assert_eq!(errors.get("sale"), Some("is required"));
        assert!(errors.get("remarks").is_none());
    }

    #[test]
    fn unknown_fields_are_rejected_but_server_keys_ignored() {
        let entity = find("branches").unwrap();
        let payload = json!({
            "branch_id": 9,
            "branch_name": "Deira",
            "created_at": "2026-01-01T00:00:00Z",
            "manager_label": "x",
            "colour": "blue"
        });
        let errors = validate_payload(entity, &payload, Mode::Create).unwrap_err();
        assert_eq!(errors.get("colour"), Some("unknown field"));
        assert!(errors.get("branch_id").is_none());
        assert!(errors.get("manager_label").is_none());
    }

    #[test]
    fn negative_money_and_bad_enum_fail() {
        let entity = find("tickets").unwrap();
        let mut payload = ticket();
        payload["sale"] = json!(-5);
        payload["flight_type"] = json!("round-the-world");
        let errors = validate_payload(entity, &payload, Mode::Create).unwrap_err();
        assert_eq!(errors.get("sale"), Some("must not be negative"));
        assert_eq!(errors.get("flight_type"), Some("must be one of: one_way, return"));
    }

    #[test]
    fn email_phone_and_date_formats() {
        let entity = find("customers").unwrap();
        let payload = json!({
            "customer_name": "Layla",
            "customer_email": "layla@@mail",
            "customer_phone": "call me"
        });
        let errors = validate_payload(entity, &payload, Mode::Create).unwrap_err();
        assert!(errors.get("customer_email").is_some());
        assert!(errors.get("customer_phone").is_some());

        let ok = json!({
            "customer_name": "Layla",
            "customer_email": "Layla@Mail.COM",
            "customer_phone": "+971 (50) 123-4567"
        });
        let fields = validate_payload(entity, &ok, Mode::Create).unwrap();
        assert_eq!(value_of(&fields, "customer_email"), Some(&SqlValue::Text("layla@mail.com".into())));

        let hotels = find("hotels").unwrap();
        let errors = validate_payload(hotels, &json!({ "check_in": "02/11/2026" }), Mode::Update).unwrap_err();
        assert_eq!(errors.get("check_in"), Some("must be a date (YYYY-MM-DD)"));
    }

    #[test]
    fn update_is_partial() {
        let entity = find("tickets").unwrap();
        let fields = validate_payload(entity, &json!({ "remarks": "", "sale": 99 }), Mode::Update).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(value_of(&fields, "remarks"), Some(&SqlValue::Null(SqlType::Text)));

        let errors = validate_payload(entity, &json!({ "pnr": null }), Mode::Update).unwrap_err();
        assert_eq!(errors.get("pnr"), Some("cannot be empty"));

        let errors = validate_payload(entity, &json!({}), Mode::Update).unwrap_err();
        assert!(errors.get("_payload").is_some());
    }

    #[test]
    fn blank_enums_fall_back_to_their_default() {
        let customers = find("customers").unwrap();
        let fields = validate_payload(customers, &json!({ "customer_name": "Ali", "status": null }), Mode::Create).unwrap();
        assert_eq!(value_of(&fields, "status"), Some(&SqlValue::Text("active".into())));

        let residences = find("residences").unwrap();
        let payload = json!({
            "passenger_name": "Yusuf",
            "customer_id": 1,
            "supp_id": 2,
            "nationality": "Jordanian",
            "passport_number": "N1234567",
            "net_price": 900,
            "sale": 1100,
            "currency_id": 1,
            "stage": ""
        });
        let fields = validate_payload(residences, &payload, Mode::Create).unwrap();
        assert_eq!(value_of(&fields, "stage"), Some(&SqlValue::Text("offer_letter".into())));

        let visas = find("visas").unwrap();
        let fields = validate_payload(visas, &json!({ "status": "" }), Mode::Update).unwrap();
        assert_eq!(value_of(&fields, "status"), Some(&SqlValue::Text("pending".into())));
    }

    #[test]
    fn omitted_enum_is_stored_as_default_on_create() {
        let entity = find("tickets").unwrap();
        let mut payload = ticket();
        payload.as_object_mut().unwrap().remove("flight_type");
        let fields = validate_payload(entity, &payload, Mode::Create).unwrap();
        assert_eq!(value_of(&fields, "flight_type"), Some(&SqlValue::Text("one_way".into())));
        assert!(value_of(&fields, "remarks").is_none());
    }

    #[test]
    fn blank_password_on_update_keeps_existing() {
        let entity = find("staff").unwrap();
        let fields = validate_payload(entity, &json!({ "password": "", "staff_name": "Sara" }), Mode::Update).unwrap();
        assert_eq!(
            fields,
            vec![ValidatedField {
                field: entity.field("staff_name").unwrap(),
                value: SqlValue::Text("Sara".into()),
            }]
        );

        let errors = validate_payload(entity, &json!({ "password": "abc" }), Mode::Update).unwrap_err();
        assert_eq!(errors.get("password"), Some("must be at least 6 characters"));
    }

    #[test]
    fn reference_ids_must_be_positive() {
        let entity = find("expenses").unwrap();
        let errors = validate_payload(entity, &json!({ "expense_type_id": 0 }), Mode::Update).unwrap_err();
        assert_eq!(errors.get("expense_type_id"), Some("must be a valid id"));
    }

    #[test]
    fn non_object_payload() {
        let entity = find("roles").unwrap();
        let errors = validate_payload(entity, &json!(["role"]), Mode::Create).unwrap_err();
        assert_eq!(errors.get("_payload"), Some("expected a JSON object"));
    }

    #[test]
    fn date_ranges_use_existing_row_for_missing_side() {
        let entity = find("hotels").unwrap();
        let fields = validate_payload(entity, &json!({ "check_out": "2026-03-01" }), Mode::Update).unwrap();

        let existing: Map<String, Value> = json!({ "check_in": "2026-03-05", "check_out": "2026-03-09" })
            .as_object()
            .cloned()
            .unwrap();
        let errors = check_date_ranges(entity, &fields, Some(&existing)).unwrap_err();
        assert_eq!(errors.get("check_out"), Some("must not be before check_in"));

        let fields = validate_payload(entity, &json!({ "check_out": "2026-03-05" }), Mode::Update).unwrap();
        assert!(check_date_ranges(entity, &fields, Some(&existing)).is_ok());
    }

    #[test]
    fn ticket_without_return_date_has_no_range() {
        let entity = find("tickets").unwrap();
        let mut payload = ticket();
        payload.as_object_mut().unwrap().remove("return_date");
        let fields = validate_payload(entity, &payload, Mode::Create).unwrap();
        assert!(check_date_ranges(entity, &fields, None).is_ok());
    }
}
