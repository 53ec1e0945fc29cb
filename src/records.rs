//! Entities served over HTTP: request-body normalization, defaults, coercion, and field rules.

use crate::case::object_keys_to_upper_snake;
use crate::coerce::{coerce_flag, coerce_integer, coerce_json_text, Flag};
use crate::config::{Settings, TableSpec, LOCATIONS, ORGANIZATIONS, PROVIDERS};
use crate::error::AppError;
use crate::service::{DesiredRecord, FieldRule, Format, RequestValidator, WriteMode};
use serde_json::Value;

const PHONE: &str = r"^[0-9+()\-.\s]{7,20}$";
const NPI: &str = r"^\d{10}$";
const ZIP: &str = r"^\d{5}(-\d{4})?$";

type Prepare = fn(&mut DesiredRecord, &WriteMode, &Settings) -> Result<(), AppError>;

/// One REST resource backed by one table.
pub struct EntityDef {
    /// Human-readable name used in responses ("Provider not found").
    pub label: &'static str,
    pub table: &'static TableSpec,
    pub rules: &'static [FieldRule],
    pub prepare: Prepare,
    /// Query-string key -> column for exact-match list filters.
    pub list_filters: &'static [(&'static str, &'static str)],
}

pub static ORGANIZATION: EntityDef = EntityDef {
    label: "Organization",
    table: &ORGANIZATIONS,
    rules: &[
        FieldRule::required("ORGANIZATION_NAME").max_length(255),
        FieldRule::optional("ACCOUNT_ID").max_length(100),
        FieldRule::optional("CONTACT_EMAIL").max_length(255).format(Format::Email),
        FieldRule::optional("CONTACT_PHONE").pattern(PHONE),
        FieldRule::optional("TIME_ZONE").max_length(64),
    ],
    prepare: prepare_organization,
    list_filters: &[("accountId", "ACCOUNT_ID")],
};

pub static PROVIDER: EntityDef = EntityDef {
    label: "Provider",
    table: &PROVIDERS,
    rules: &[
        FieldRule::required("FIRST_NAME").max_length(100),
        FieldRule::optional("MIDDLE_NAME").max_length(100),
        FieldRule::required("LAST_NAME").max_length(100),
        FieldRule::optional("CREDENTIALS").max_length(50),
        FieldRule::optional("SPECIALTY").max_length(255),
        FieldRule::optional("NPI").pattern(NPI),
        FieldRule::optional("EXTERNAL_PROVIDER_ID").max_length(100),
        FieldRule::optional("EMAIL").max_length(255).format(Format::Email),
        FieldRule::optional("PHONE").pattern(PHONE),
    ],
    prepare: prepare_provider,
    list_filters: &[("organizationId", "ORGANIZATION_ID"), ("npi", "NPI")],
};

pub static LOCATION: EntityDef = EntityDef {
    label: "Location",
    table: &LOCATIONS,
    rules: &[
        FieldRule::required("LOCATION_NAME").max_length(255),
        FieldRule::required("ORGANIZATION_ID"),
        FieldRule::optional("ADDRESS_LINE1").max_length(255),
        FieldRule::optional("ADDRESS_LINE2").max_length(255),
        FieldRule::optional("CITY").max_length(100),
        FieldRule::optional("STATE").max_length(50),
        FieldRule::optional("ZIP_CODE").pattern(ZIP),
        FieldRule::optional("PHONE").pattern(PHONE),
        FieldRule::optional("TIME_ZONE").max_length(64),
    ],
    prepare: prepare_location,
    list_filters: &[("organizationId", "ORGANIZATION_ID")],
};

/// Turn a request body into a validated record ready for the writer.
pub fn prepare_record(
    entity: &EntityDef,
    body: Value,
    mode: &WriteMode,
    settings: &Settings,
) -> Result<DesiredRecord, AppError> {
    let Value::Object(obj) = body else {
        return Err(AppError::BadRequest("body must be a JSON object".into()));
    };
    let mut record = object_keys_to_upper_snake(obj);
    (entity.prepare)(&mut record, mode, settings)?;
    match mode {
        WriteMode::Insert => RequestValidator::validate(&record, entity.rules)?,
        WriteMode::Update { .. } => RequestValidator::validate_partial(&record, entity.rules)?,
    }
    Ok(record)
}

fn insert_default(mode: &WriteMode, flag: Flag) -> Option<Flag> {
    matches!(mode, WriteMode::Insert).then_some(flag)
}

fn prepare_organization(record: &mut DesiredRecord, mode: &WriteMode, _settings: &Settings) -> Result<(), AppError> {
    coerce_flag(record, "IS_ACTIVE", insert_default(mode, Flag::ON))?;
    coerce_json_text(record, "SETTINGS");
    Ok(())
}

fn prepare_provider(record: &mut DesiredRecord, mode: &WriteMode, settings: &Settings) -> Result<(), AppError> {
    // Older clients send a STATUS label instead of the flag.
    if let Some(status) = record.remove("STATUS") {
        record.entry("IS_ACTIVE".to_string()).or_insert(status);
    }
    coerce_flag(record, "IS_ACTIVE", insert_default(mode, Flag::ON))?;
    coerce_flag(record, "IS_ENABLED", insert_default(mode, Flag::ON))?;
    coerce_integer(record, "ORGANIZATION_ID")?;
    if matches!(mode, WriteMode::Insert) && record.get("ORGANIZATION_ID").map(Value::is_null).unwrap_or(true) {
        record.insert("ORGANIZATION_ID".into(), Value::from(settings.default_organization_id));
    }
    coerce_json_text(record, "PREFERENCES");
    Ok(())
}

fn prepare_location(record: &mut DesiredRecord, mode: &WriteMode, _settings: &Settings) -> Result<(), AppError> {
    coerce_flag(record, "IS_ACTIVE", insert_default(mode, Flag::ON))?;
    coerce_integer(record, "ORGANIZATION_ID")?;
    Ok(())
}

/// Exact-match list filters from the query string, for the keys this entity supports.
pub fn list_filters(entity: &EntityDef, params: &std::collections::HashMap<String, String>) -> Vec<(&'static str, Value)> {
    entity
        .list_filters
        .iter()
        .filter_map(|(key, column)| {
            let raw = params.get(*key)?.trim();
            if raw.is_empty() {
                return None;
            }
            let v = raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string()));
            Some((*column, v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn provider_defaults_on_insert() {
        let settings = Settings {
            default_organization_id: 7,
            ..Settings::default()
        };
        let r = prepare_record(
            &PROVIDER,
            json!({"firstName": "Ada", "lastName": "Lovelace", "status": "Active"}),
            &WriteMode::Insert,
            &settings,
        )
        .unwrap();
        assert_eq!(r["FIRST_NAME"], json!("Ada"));
        assert_eq!(r["IS_ACTIVE"], json!(1));
        assert_eq!(r["IS_ENABLED"], json!(1));
        assert_eq!(r["ORGANIZATION_ID"], json!(7));
        assert!(!r.contains_key("STATUS"));
    }

    #[test]
    fn provider_update_has_no_defaults() {
        let r = prepare_record(
            &PROVIDER,
            json!({"SPECIALTY": "Cardiology", "STATUS": "Inactive"}),
            &WriteMode::Update { id: json!(1) },
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(r["IS_ACTIVE"], json!(0));
        assert!(!r.contains_key("IS_ENABLED"));
        assert!(!r.contains_key("ORGANIZATION_ID"));
    }

    #[test]
    fn explicit_flag_beats_status_label() {
        let r = prepare_record(
            &PROVIDER,
            json!({"IS_ACTIVE": true, "STATUS": "Inactive"}),
            &WriteMode::Update { id: json!(1) },
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(r["IS_ACTIVE"], json!(1));
    }

    #[test]
    fn organization_requires_name() {
        let err = prepare_record(&ORGANIZATION, json!({"ACCOUNT_ID": "A1"}), &WriteMode::Insert, &Settings::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "ORGANIZATION_NAME is required");
    }

    #[test]
    fn location_zip_and_org_id() {
        let ok = prepare_record(
            &LOCATION,
            json!({"locationName": "Main", "organizationId": "3", "zipCode": "12345-6789"}),
            &WriteMode::Insert,
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(ok["ORGANIZATION_ID"], json!(3));
        assert!(prepare_record(
            &LOCATION,
            json!({"LOCATION_NAME": "Main", "ORGANIZATION_ID": 3, "ZIP_CODE": "ABCDE"}),
            &WriteMode::Insert,
            &Settings::default(),
        )
        .is_err());
    }

    #[test]
    fn non_object_body_rejected() {
        assert!(prepare_record(&LOCATION, json!([1]), &WriteMode::Insert, &Settings::default()).is_err());
    }

    #[test]
    fn filters_from_query() {
        let params: HashMap<String, String> = [
            ("organizationId".to_string(), "4".to_string()),
            ("npi".to_string(), "".to_string()),
            ("other".to_string(), "x".to_string()),
        ]
        .into();
        assert_eq!(list_filters(&PROVIDER, &params), vec![("ORGANIZATION_ID", json!(4))]);
    }
}
