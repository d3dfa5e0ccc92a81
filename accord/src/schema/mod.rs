//! Record types and the aggregate blob they are persisted in.

mod donation;
mod event;
mod member;
mod ministry;
mod report;

pub use donation::{Donation, GuestDonor};
pub use event::{event_template, Event, EventTemplate, Recurrence, EVENT_TEMPLATES};
pub use member::Member;
pub use ministry::{Ministry, VolunteerOpportunity};
pub use report::{ReportKind, ReportRecord, ScheduledReport};

use chrono::{Datelike, Months, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record identifier: the creation timestamp in milliseconds.
pub type RecordId = i64;

/// The kinds of record a dashboard manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Entity {
    Member,
    Event,
    Donation,
    Ministry,
    Opportunity,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::Member,
        Entity::Event,
        Entity::Donation,
        Entity::Ministry,
        Entity::Opportunity,
    ];

    /// Key of this entity's array inside the church-data blob.
    pub fn collection_name(self) -> &'static str {
        match self {
            Entity::Member => "members",
            Entity::Event => "events",
            Entity::Donation => "donations",
            Entity::Ministry => "ministries",
            Entity::Opportunity => "volunteerOpportunities",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Entity::Member => "Member",
            Entity::Event => "Event",
            Entity::Donation => "Donation",
            Entity::Ministry => "Ministry",
            Entity::Opportunity => "Volunteer Opportunity",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Entity::Member => "member",
            Entity::Event => "event",
            Entity::Donation => "donation",
            Entity::Ministry => "ministry",
            Entity::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "member" | "members" => Ok(Entity::Member),
            "event" | "events" => Ok(Entity::Event),
            "donation" | "donations" => Ok(Entity::Donation),
            "ministry" | "ministries" => Ok(Entity::Ministry),
            "opportunity" | "opportunities" | "volunteer-opportunity" => Ok(Entity::Opportunity),
            other => Err(format!("Unknown entity '{other}'")),
        }
    }
}

/// How a form value is coerced before it is merged into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Money,
    Bool,
    Date,
    List,
    Id,
    IdList,
    /// Nested object supplied as JSON text.
    Object,
}

/// One entry of a record's field allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

pub(crate) const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// A record stored as one array of the church-data blob.
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug {
    const ENTITY: Entity;

    /// Every writable field, keyed by its persisted name. `id` is not listed.
    const FIELDS: &'static [FieldSpec];

    fn id(&self) -> RecordId;

    fn set_id(&mut self, id: RecordId);

    /// The date list views order by.
    fn sort_date(&self) -> Option<NaiveDate>;

    /// Short human label used in prompts and notifications.
    fn display_name(&self) -> String;

    fn slice(data: &ChurchData) -> &Vec<Self>;

    fn slice_mut(data: &mut ChurchData) -> &mut Vec<Self>;

    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }
}

/// The aggregate blob stored under [`crate::store::CHURCH_DATA_KEY`].
///
/// Sections this crate does not model are carried through `extra`
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurchData {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub donations: Vec<Donation>,
    #[serde(default)]
    pub pledges: Vec<serde_json::Value>,
    #[serde(default)]
    pub recurring_donations: Vec<serde_json::Value>,
    #[serde(default)]
    pub ministries: Vec<Ministry>,
    #[serde(default)]
    pub volunteer_opportunities: Vec<VolunteerOpportunity>,
    #[serde(default)]
    pub report_history: Vec<ReportRecord>,
    #[serde(default)]
    pub scheduled_reports: Vec<ScheduledReport>,
    #[serde(default)]
    pub custom_reports: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChurchData {
    /// Members, events and donations: the count shown as "total records".
    pub fn total_records(&self) -> usize {
        self.members.len() + self.events.len() + self.donations.len()
    }

    pub fn member_name(&self, id: RecordId) -> Option<String> {
        self.members
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.full_name())
    }
}

/// Repeat interval shared by recurring events and scheduled reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    #[serde(alias = "yearly")]
    Annually,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Annually => "annually",
        }
    }

    /// The next date after `date`. Month arithmetic clamps to month end.
    pub fn advance(self, date: NaiveDate) -> NaiveDate {
        let next = match self {
            Frequency::Daily => date.checked_add_days(chrono::Days::new(1)),
            Frequency::Weekly => date.checked_add_days(chrono::Days::new(7)),
            Frequency::Biweekly => date.checked_add_days(chrono::Days::new(14)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Quarterly => date.checked_add_months(Months::new(3)),
            Frequency::Annually => date.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(date)
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "annually" | "yearly" => Ok(Frequency::Annually),
            other => Err(format!("Unknown frequency '{other}'")),
        }
    }
}

/// Parse `YYYY-MM-DD`, also accepting a full ISO timestamp by its date part.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Serde adapter for required `YYYY-MM-DD` dates.
pub(crate) mod date_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date '{raw}'")))
    }
}

/// Serde adapter for optional dates; an empty string reads as `None`.
pub(crate) mod opt_date_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_date(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date '{s}'"))),
        }
    }
}

/// Serde adapter for optional counts entered as numbers or form strings.
pub(crate) mod opt_count_format {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(count: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        match count {
            Some(n) => s.serialize_u32(*n),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let raw: Option<Raw> = Option::deserialize(d)?;
        let value = match raw {
            None => return Ok(None),
            Some(Raw::Int(n)) => n as f64,
            Some(Raw::Float(f)) => f,
            Some(Raw::Text(t)) if t.trim().is_empty() => return Ok(None),
            Some(Raw::Text(t)) => t
                .trim()
                .parse::<f64>()
                .map_err(|_| de::Error::custom(format!("invalid number '{t}'")))?,
        };
        if value < 0.0 || value > u32::MAX as f64 {
            return Err(de::Error::custom(format!("count out of range: {value}")));
        }
        Ok(Some(value.round() as u32))
    }
}
