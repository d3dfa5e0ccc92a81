//! Application configuration persisted under [`SETTINGS_KEY`], plus the
//! whole-store maintenance actions offered on the settings page.

use crate::aggregate::Goals;
use crate::error::{AccordError, Result};
use crate::money::Money;
use crate::schema::{parse_date, ChurchData};
use crate::store::{Store, CHURCH_DATA_KEY, SETTINGS_KEY};
use crate::validation::{settings_rules, validate_partial, ValidationErrors};
use chrono::{DateTime, Days, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Version stamped on exports and backups.
pub const EXPORT_VERSION: &str = "1.0.0";

/// Phrase that must be typed to wipe the store.
pub const CLEAR_ALL_PHRASE: &str = "DELETE ALL DATA";

const BACKUP_DIR: &str = "backups";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    // General
    pub church_name: String,
    pub denomination: String,
    pub church_address: String,
    pub church_city: String,
    pub church_state: String,
    pub church_zip: String,
    pub church_phone: String,
    pub church_email: String,
    pub church_website: String,
    pub time_zone: String,
    pub date_format: String,
    pub currency: String,
    pub language: String,

    // Members
    pub require_approval: bool,
    pub auto_generate_id: bool,
    pub member_id_format: String,
    pub require_email: bool,
    pub require_phone: bool,
    pub require_address: bool,
    pub require_birth_date: bool,
    pub require_gender: bool,
    pub require_marital_status: bool,
    pub allow_photo_sharing: bool,
    pub allow_contact_sharing: bool,
    pub show_birthday_anniversary: bool,

    // Events
    pub default_event_duration: u32,
    pub default_venue: String,
    pub require_event_approval: bool,
    pub enable_event_registration: bool,
    pub send_event_reminders: bool,
    pub default_calendar_view: String,
    /// 0 = Sunday.
    pub week_start_day: u8,
    pub show_past_events: bool,

    // Donations
    pub monthly_goal: Money,
    pub annual_goal: Money,
    pub building_fund_goal: Money,
    pub auto_send_receipts: bool,
    pub receipt_template: String,
    pub tax_statement_period: String,
    pub enable_cash: bool,
    pub enable_check: bool,
    pub enable_credit_card: bool,
    pub enable_bank_transfer: bool,
    pub enable_online_payment: bool,
    pub enable_mobile_app: bool,

    // Communication
    pub smtp_server: String,
    pub smtp_port: u32,
    pub email_username: String,
    pub email_password: String,
    pub from_name: String,
    pub email_new_members: bool,
    pub email_new_donations: bool,
    pub email_event_reminders: bool,
    pub email_birthday_reminders: bool,

    // Security
    pub min_password_length: u32,
    pub require_uppercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
    pub session_timeout: u32,
    pub enable_two_factor: bool,
    pub log_user_activity: bool,

    // Advanced
    pub enable_debug_mode: bool,
    pub enable_api_access: bool,
    pub api_rate_limit: u32,
    #[serde(rename = "customCSS")]
    pub custom_css: String,
    pub enable_auto_backup: bool,
    pub backup_frequency: String,
    /// Days a backup file is kept.
    pub backup_retention: u32,

    /// Persisted keys this version does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            church_name: "Accord Church".into(),
            denomination: String::new(),
            church_address: String::new(),
            church_city: String::new(),
            church_state: String::new(),
            church_zip: String::new(),
            church_phone: String::new(),
            church_email: String::new(),
            church_website: String::new(),
            time_zone: "America/New_York".into(),
            date_format: "MM/DD/YYYY".into(),
            currency: "USD".into(),
            language: "en".into(),

            require_approval: false,
            auto_generate_id: true,
            member_id_format: "sequential".into(),
            require_email: false,
            require_phone: false,
            require_address: false,
            require_birth_date: false,
            require_gender: false,
            require_marital_status: false,
            allow_photo_sharing: true,
            allow_contact_sharing: true,
            show_birthday_anniversary: true,

            default_event_duration: 60,
            default_venue: "main-sanctuary".into(),
            require_event_approval: false,
            enable_event_registration: true,
            send_event_reminders: true,
            default_calendar_view: "month".into(),
            week_start_day: 0,
            show_past_events: false,

            monthly_goal: Money::from_major(10_000),
            annual_goal: Money::from_major(120_000),
            building_fund_goal: Money::from_major(50_000),
            auto_send_receipts: true,
            receipt_template: "standard".into(),
            tax_statement_period: "calendar".into(),
            enable_cash: true,
            enable_check: true,
            enable_credit_card: false,
            enable_bank_transfer: false,
            enable_online_payment: false,
            enable_mobile_app: false,

            smtp_server: String::new(),
            smtp_port: 587,
            email_username: String::new(),
            email_password: String::new(),
            from_name: "Accord Church".into(),
            email_new_members: true,
            email_new_donations: true,
            email_event_reminders: true,
            email_birthday_reminders: false,

            min_password_length: 8,
            require_uppercase: true,
            require_numbers: true,
            require_special_chars: false,
            session_timeout: 60,
            enable_two_factor: false,
            log_user_activity: true,

            enable_debug_mode: false,
            enable_api_access: false,
            api_rate_limit: 100,
            custom_css: String::new(),
            enable_auto_backup: true,
            backup_frequency: "weekly".into(),
            backup_retention: 30,

            extra: Map::new(),
        }
    }
}

/// Contact block printed on receipts and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChurchInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsExport {
    pub settings: Settings,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub settings: Settings,
    pub church_data: Value,
    pub backup_date: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// Bytes of the church-data blob.
    pub database_size: usize,
    pub total_records: usize,
    pub last_updated: NaiveDate,
}

impl SystemInfo {
    /// Size as shown on the settings page: `0.01 MB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.database_size as f64 / (1024.0 * 1024.0))
    }
}

impl Settings {
    /// Persisted overrides merged shallowly over the defaults.
    pub fn load(store: &Store) -> Result<Self> {
        let Some(saved) = store.load_raw(SETTINGS_KEY)? else {
            return Ok(Settings::default());
        };
        let Value::Object(overrides) = saved else {
            return Err(AccordError::Other(format!(
                "Stored '{SETTINGS_KEY}' is not a JSON object"
            )));
        };
        let mut merged = match serde_json::to_value(Settings::default())? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            merged.insert(key, value);
        }
        serde_json::from_value(Value::Object(merged)).map_err(|source| AccordError::MalformedBlob {
            key: SETTINGS_KEY.to_string(),
            source,
        })
    }

    pub fn save(&self, store: &Store) -> Result<()> {
        store.save(SETTINGS_KEY, self)?;
        log::info!("settings saved");
        Ok(())
    }

    /// Replace the stored settings with the defaults.
    pub fn reset(store: &Store) -> Result<Self> {
        let settings = Settings::default();
        settings.save(store)?;
        log::info!("settings reset to defaults");
        Ok(settings)
    }

    pub fn get(&self, key: &str) -> Result<Value> {
        let value = serde_json::to_value(self)?;
        value
            .get(key)
            .cloned()
            .ok_or_else(|| unknown_setting(key))
    }

    /// Set one key from text, coerced to the type the key already holds.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let Value::Object(mut map) = serde_json::to_value(&*self)? else {
            return Err(AccordError::Other("Settings did not serialize to an object".into()));
        };
        let current = map.get(key).ok_or_else(|| unknown_setting(key))?;
        let label = key.to_string();
        let coerced = match current {
            Value::Bool(_) => Value::Bool(parse_bool(raw).ok_or_else(|| {
                invalid_setting(&label, format!("{label} must be true or false"))
            })?),
            Value::Number(n) => {
                let number: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| invalid_setting(&label, format!("{label} must be a number")))?;
                if n.is_f64() {
                    serde_json::Number::from_f64(number)
                        .map(Value::Number)
                        .ok_or_else(|| {
                            invalid_setting(&label, format!("{label} must be a number"))
                        })?
                } else {
                    if number < 0.0 || number.fract() != 0.0 {
                        return Err(invalid_setting(
                            &label,
                            format!("{label} must be a whole number"),
                        ));
                    }
                    Value::from(number as u64)
                }
            }
            Value::String(_) => Value::String(raw.to_string()),
            _ => serde_json::from_str(raw)?,
        };

        let values = BTreeMap::from([(key.to_string(), raw.trim().to_string())]);
        validate_partial(&values, &settings_rules()).into_result()?;

        map.insert(key.to_string(), coerced);
        *self = serde_json::from_value(Value::Object(map))
            .map_err(|e| invalid_setting(&label, e.to_string()))?;
        Ok(())
    }

    pub fn export(&self, now: DateTime<Utc>) -> SettingsExport {
        SettingsExport {
            settings: self.clone(),
            export_date: now,
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn goals(&self) -> Goals {
        Goals {
            monthly: self.monthly_goal,
            annual: self.annual_goal,
            building_fund: self.building_fund_goal,
        }
    }

    pub fn week_start(&self) -> Weekday {
        match self.week_start_day % 7 {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }

    pub fn church_info(&self) -> ChurchInfo {
        let locality = format!("{} {}", self.church_state, self.church_zip);
        let address = [self.church_address.trim(), self.church_city.trim(), locality.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        ChurchInfo {
            name: self.church_name.clone(),
            address,
            phone: self.church_phone.clone(),
            email: self.church_email.clone(),
            website: self.church_website.clone(),
        }
    }

    /// `date` in the configured display format.
    pub fn format_date(&self, date: NaiveDate) -> String {
        let pattern = match self.date_format.as_str() {
            "DD/MM/YYYY" => "%d/%m/%Y",
            "YYYY-MM-DD" => "%Y-%m-%d",
            _ => "%-m/%-d/%Y",
        };
        date.format(pattern).to_string()
    }

    /// File-name prefix derived from the church name.
    pub fn file_prefix(&self) -> String {
        let prefix = slug::slugify(&self.church_name);
        if prefix.is_empty() {
            "accord-church".to_string()
        } else {
            prefix
        }
    }
}

fn unknown_setting(key: &str) -> AccordError {
    invalid_setting(key, format!("Unknown setting '{key}'"))
}

fn invalid_setting(key: &str, message: String) -> AccordError {
    let mut errors = ValidationErrors::new();
    errors.add(key, message);
    AccordError::Validation(errors)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Settings plus the raw church-data blob.
pub fn backup(store: &Store, settings: &Settings, now: DateTime<Utc>) -> Result<Backup> {
    let church_data = store
        .load_raw(CHURCH_DATA_KEY)?
        .unwrap_or_else(|| Value::Object(Map::new()));
    Ok(Backup {
        settings: settings.clone(),
        church_data,
        backup_date: now,
        version: EXPORT_VERSION.to_string(),
    })
}

/// Write a backup file into `<data-dir>/backups/` and return its path.
pub fn write_backup(store: &Store, settings: &Settings, now: DateTime<Utc>) -> Result<PathBuf> {
    let root = store
        .root()
        .ok_or_else(|| AccordError::Other("Backups need an on-disk data directory".into()))?;
    let dir = root.join(BACKUP_DIR);
    std::fs::create_dir_all(&dir)?;

    let snapshot = backup(store, settings, now)?;
    let path = dir.join(format!(
        "{}-backup-{}.json",
        settings.file_prefix(),
        now.format("%Y-%m-%d")
    ));
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
    log::info!("backup written to {}", path.display());
    Ok(path)
}

/// Backup files, oldest first.
pub fn list_backups(store: &Store) -> Result<Vec<PathBuf>> {
    let Some(root) = store.root() else {
        return Ok(Vec::new());
    };
    let pattern = format!("{}/{BACKUP_DIR}/*-backup-*.json", root.display());
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| AccordError::Other(format!("Glob error: {e}")))?
        .filter_map(|r| r.ok())
        .collect();
    files.sort_by_key(|p| backup_date(p));
    Ok(files)
}

fn backup_date(path: &std::path::Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let (_, date) = stem.rsplit_once("-backup-")?;
    parse_date(date)
}

/// Delete backups older than `retention_days` before `today`.
pub fn prune_backups(store: &Store, retention_days: u32, today: NaiveDate) -> Result<usize> {
    let Some(cutoff) = today.checked_sub_days(Days::new(retention_days.into())) else {
        return Ok(0);
    };
    let mut removed = 0;
    for path in list_backups(store)? {
        if backup_date(&path).is_some_and(|d| d < cutoff) {
            std::fs::remove_file(&path)?;
            log::info!("pruned backup {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

/// The church-data blob with an `exportDate`/`version` stamp.
pub fn export_data(store: &Store, now: DateTime<Utc>) -> Result<Value> {
    let mut map = match store.load_raw(CHURCH_DATA_KEY)? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    map.insert("exportDate".into(), Value::String(now.to_rfc3339()));
    map.insert("version".into(), Value::String(EXPORT_VERSION.into()));
    Ok(Value::Object(map))
}

/// Replace the church-data blob with an exported document.
pub fn import_data(store: &Store, data: Value) -> Result<()> {
    let Value::Object(mut map) = data else {
        return Err(AccordError::InvalidImport("expected a JSON object".into()));
    };
    if !["members", "events", "donations"]
        .iter()
        .any(|k| map.contains_key(*k))
    {
        return Err(AccordError::InvalidImport(
            "file has no members, events or donations".into(),
        ));
    }
    map.remove("exportDate");
    map.remove("version");

    let value = Value::Object(map);
    serde_json::from_value::<ChurchData>(value.clone())
        .map_err(|e| AccordError::InvalidImport(e.to_string()))?;
    store.save(CHURCH_DATA_KEY, &value)?;
    log::info!("church data imported");
    Ok(())
}

/// Remove every blob. `phrase` must equal [`CLEAR_ALL_PHRASE`].
pub fn clear_all(store: &Store, phrase: &str) -> Result<()> {
    if phrase != CLEAR_ALL_PHRASE {
        log::warn!("clear-all declined: confirmation phrase did not match");
        return Err(AccordError::ConfirmationDeclined(
            "Data clearing cancelled".into(),
        ));
    }
    store.remove(CHURCH_DATA_KEY)?;
    store.remove(SETTINGS_KEY)?;
    log::warn!("all church data and settings cleared");
    Ok(())
}

pub fn system_info(store: &Store, today: NaiveDate) -> Result<SystemInfo> {
    let data = store.load_data()?;
    Ok(SystemInfo {
        database_size: store.size_of(CHURCH_DATA_KEY)?,
        total_records: data.total_records(),
        last_updated: today,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Member;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_load_merges_over_defaults() {
        let store = Store::in_memory();
        store
            .save(
                SETTINGS_KEY,
                &json!({"churchName": "Grace Chapel", "monthlyGoal": 2500, "legacyFlag": true}),
            )
            .unwrap();

        let settings = Settings::load(&store).unwrap();
        assert_eq!(settings.church_name, "Grace Chapel");
        assert_eq!(settings.monthly_goal, Money::from_major(2500));
        assert_eq!(settings.annual_goal, Money::from_major(120_000));
        assert_eq!(settings.smtp_port, 587);
        assert_eq!(settings.extra.get("legacyFlag"), Some(&json!(true)));
    }

    #[test]
    fn test_defaults_when_absent() {
        let settings = Settings::load(&Store::in_memory()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.week_start(), Weekday::Sun);
    }

    #[test]
    fn test_serialized_keys_match_stored_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(value["customCSS"], "");
        assert_eq!(value["buildingFundGoal"], 50000.0);
        assert_eq!(value["weekStartDay"], 0);
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_set_coerces_by_type() {
        let mut settings = Settings::default();
        settings.set("requireEmail", "yes").unwrap();
        settings.set("smtpPort", "2525").unwrap();
        settings.set("monthlyGoal", "12500.50").unwrap();
        settings.set("churchName", "New Hope").unwrap();

        assert!(settings.require_email);
        assert_eq!(settings.smtp_port, 2525);
        assert_eq!(settings.monthly_goal, Money::from_cents(1_250_050));
        assert_eq!(settings.church_name, "New Hope");
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = Settings::default();
        assert!(settings.set("noSuchKey", "1").is_err());
        assert!(settings.set("requireEmail", "maybe").is_err());
        assert!(settings.set("smtpPort", "abc").is_err());
        assert!(settings.set("weekStartDay", "9").is_err());
        assert!(settings.set("churchEmail", "not-an-email").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let store = Store::in_memory();
        let mut settings = Settings::default();
        settings.church_name = "Changed".into();
        settings.save(&store).unwrap();

        let reset = Settings::reset(&store).unwrap();
        assert_eq!(reset, Settings::default());
        assert_eq!(Settings::load(&store).unwrap(), Settings::default());
    }

    #[test]
    fn test_export_envelope() {
        let export = serde_json::to_value(Settings::default().export(now())).unwrap();
        assert_eq!(export["version"], "1.0.0");
        assert_eq!(export["settings"]["churchName"], "Accord Church");
        assert!(export["exportDate"].as_str().unwrap().starts_with("2024-05-15T12:00:00"));
    }

    #[test]
    fn test_church_info_and_date_format() {
        let mut settings = Settings::default();
        settings.church_address = "123 Church Street".into();
        settings.church_city = "Springfield".into();
        settings.church_state = "IL".into();
        settings.church_zip = "62701".into();
        assert_eq!(
            settings.church_info().address,
            "123 Church Street, Springfield, IL 62701"
        );

        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(settings.format_date(date), "1/5/2024");
        settings.date_format = "DD/MM/YYYY".into();
        assert_eq!(settings.format_date(date), "05/01/2024");
        assert_eq!(settings.file_prefix(), "accord-church");
    }

    #[test]
    fn test_import_requires_known_sections() {
        let store = Store::in_memory();
        let err = import_data(&store, json!({"theme": "dark"})).unwrap_err();
        assert!(matches!(err, AccordError::InvalidImport(_)));

        import_data(
            &store,
            json!({
                "members": [{"id": 1, "firstName": "Abena"}],
                "exportDate": "x",
                "version": "1.0.0",
            }),
        )
        .unwrap();
        let raw = store.load_raw(CHURCH_DATA_KEY).unwrap().unwrap();
        assert!(raw.get("exportDate").is_none());
        assert_eq!(store.load_data().unwrap().members[0].first_name, "Abena");
    }

    #[test]
    fn test_import_rejects_mistyped_records() {
        let store = Store::in_memory();
        let err = import_data(&store, json!({"members": "nope"})).unwrap_err();
        assert!(matches!(err, AccordError::InvalidImport(_)));
        assert!(!store.exists(CHURCH_DATA_KEY).unwrap());
    }

    #[test]
    fn test_import_keeps_basic_records_across_saves() {
        use crate::collection::Collection;
        use crate::filter::FilterContext;
        use crate::schema::{Donation, Event};

        let store = Store::in_memory();
        let data = json!({
            "events": [{
                "id": 1,
                "title": "Sunday Service",
                "date": "2024-01-07",
                "time": "10:00",
                "location": "Main Sanctuary",
                "type": "Service",
                "recurring": true,
                "attendees": [],
                "livestreamUrl": "https://example.org/live"
            }],
            "donations": [{
                "id": 1,
                "memberId": 1,
                "memberName": "John Smith",
                "amount": 100.0,
                "date": "2024-01-01",
                "type": "Tithe",
                "method": "Cash"
            }]
        });
        import_data(&store, data).unwrap();

        let ctx = FilterContext::new(now().date_naive());
        let mut events = Collection::<Event>::load(&store, ctx).unwrap();
        let service = events.require(1).unwrap();
        assert_eq!(service.start_date, NaiveDate::from_ymd_opt(2024, 1, 7));
        assert_eq!(service.start_time, "10:00");
        assert_eq!(service.venue, "Main Sanctuary");

        let donations = Collection::<Donation>::load(&store, ctx).unwrap();
        let tithe = donations.require(1).unwrap();
        assert_eq!(tithe.donor_id, Some(1));
        assert_eq!(tithe.donor_name, "John Smith");

        let other = Event {
            title: "Choir Practice".into(),
            ..Default::default()
        };
        events.insert(&store, other, now()).unwrap();

        let stored = store.load_raw(CHURCH_DATA_KEY).unwrap().unwrap();
        let saved = &stored["events"][0];
        assert_eq!(saved["startDate"], "2024-01-07");
        assert_eq!(saved["venue"], "Main Sanctuary");
        assert_eq!(saved["livestreamUrl"], "https://example.org/live");
        let reloaded = Collection::<Event>::load(&store, ctx).unwrap();
        assert_eq!(reloaded.require(1).unwrap().start_time, "10:00");
    }

    #[test]
    fn test_export_data_stamps_envelope() {
        let store = Store::in_memory();
        store
            .update_data(|d| {
                d.members.push(Member {
                    id: 1,
                    ..Default::default()
                });
                Ok(())
            })
            .unwrap();
        let exported = export_data(&store, now()).unwrap();
        assert_eq!(exported["version"], "1.0.0");
        assert_eq!(exported["members"][0]["id"], 1);
    }

    #[test]
    fn test_clear_all_needs_phrase() {
        let store = Store::in_memory();
        Settings::default().save(&store).unwrap();
        store.save_data(&ChurchData::default()).unwrap();

        let err = clear_all(&store, "delete all data").unwrap_err();
        assert!(matches!(err, AccordError::ConfirmationDeclined(_)));
        assert!(store.exists(SETTINGS_KEY).unwrap());

        clear_all(&store, CLEAR_ALL_PHRASE).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_backup_files_and_pruning() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();
        let settings = Settings::default();
        store.save_data(&ChurchData::default()).unwrap();

        let old = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let first = write_backup(&store, &settings, old).unwrap();
        let second = write_backup(&store, &settings, now()).unwrap();
        assert!(first.ends_with("backups/accord-church-backup-2024-03-01.json"));
        assert_eq!(list_backups(&store).unwrap(), vec![first.clone(), second.clone()]);

        let snapshot: Backup =
            serde_json::from_str(&std::fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(snapshot.version, "1.0.0");

        let removed = prune_backups(&store, 30, now().date_naive()).unwrap();
        assert_eq!(removed, 1);
        assert!(!first.exists());
        assert!(second.exists());
    }

    #[test]
    fn test_prune_keeps_everything_when_cutoff_predates_calendar() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();
        store.save_data(&ChurchData::default()).unwrap();
        let path = write_backup(&store, &Settings::default(), now()).unwrap();

        assert_eq!(prune_backups(&store, u32::MAX, now().date_naive()).unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_system_info() {
        let store = Store::in_memory();
        store
            .update_data(|d| {
                d.members.push(Member::default());
                d.members.push(Member::default());
                Ok(())
            })
            .unwrap();
        let info = system_info(&store, now().date_naive()).unwrap();
        assert_eq!(info.total_records, 2);
        assert!(info.database_size > 0);
        assert_eq!(info.size_label(), "0.00 MB");
    }
}
