use super::{
    field, opt_count_format, opt_date_format, ChurchData, Entity, FieldKind as K, FieldSpec,
    Frequency, Record, RecordId,
};
use crate::money::Money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub category: String,
    #[serde(alias = "date", with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "time")]
    pub start_time: String,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub end_time: String,
    pub all_day: bool,
    pub recurring: bool,
    pub repeat_frequency: String,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub repeat_until: Option<NaiveDate>,
    #[serde(alias = "location")]
    pub venue: String,
    pub room: String,
    pub off_site_address: String,
    #[serde(with = "opt_count_format", skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<u32>,
    pub registration_required: String,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub registration_deadline: Option<NaiveDate>,
    pub registration_fee: Money,
    pub primary_organizer: String,
    pub contact_phone: String,
    pub organizers: Vec<String>,
    pub equipment: Vec<String>,
    pub special_requirements: String,
    pub budget: Money,
    pub audience: Vec<String>,
    pub event_notes: String,
    pub public_event: bool,
    pub childcare_provided: bool,
    pub attendees: Vec<RecordId>,
    pub status: String,
    /// Keys this crate does not model, kept so a save never drops them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repeat rule of a recurring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    pub frequency: Frequency,
    pub until: Option<NaiveDate>,
}

impl Event {
    pub fn recurrence(&self) -> Option<Recurrence> {
        if !self.recurring {
            return None;
        }
        let frequency = self.repeat_frequency.parse().ok()?;
        Some(Recurrence {
            frequency,
            until: self.repeat_until,
        })
    }

    /// Dates in `start..=end` on which this event takes place.
    pub fn occurrences_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let Some(first) = self.start_date else {
            return Vec::new();
        };
        let Some(rule) = self.recurrence() else {
            return if first >= start && first <= end {
                vec![first]
            } else {
                Vec::new()
            };
        };

        let last = match rule.until {
            Some(until) if until < end => until,
            _ => end,
        };
        let mut dates = Vec::new();
        let mut current = first;
        while current <= last {
            if current >= start {
                dates.push(current);
            }
            let next = rule.frequency.advance(current);
            if next <= current {
                break;
            }
            current = next;
        }
        dates
    }

    pub fn attendance(&self) -> usize {
        self.attendees.len()
    }
}

impl Record for Event {
    const ENTITY: Entity = Entity::Event;

    const FIELDS: &'static [FieldSpec] = &[
        field("title", K::Text),
        field("description", K::Text),
        field("type", K::Text),
        field("category", K::Text),
        field("startDate", K::Date),
        field("startTime", K::Text),
        field("endDate", K::Date),
        field("endTime", K::Text),
        field("allDay", K::Bool),
        field("recurring", K::Bool),
        field("repeatFrequency", K::Text),
        field("repeatUntil", K::Date),
        field("venue", K::Text),
        field("room", K::Text),
        field("offSiteAddress", K::Text),
        field("maxCapacity", K::Number),
        field("registrationRequired", K::Text),
        field("registrationDeadline", K::Date),
        field("registrationFee", K::Money),
        field("primaryOrganizer", K::Text),
        field("contactPhone", K::Text),
        field("organizers", K::List),
        field("equipment", K::List),
        field("specialRequirements", K::Text),
        field("budget", K::Money),
        field("audience", K::List),
        field("eventNotes", K::Text),
        field("publicEvent", K::Bool),
        field("childcareProvided", K::Bool),
        field("attendees", K::IdList),
        field("status", K::Text),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn sort_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    fn display_name(&self) -> String {
        self.title.clone()
    }

    fn slice(data: &ChurchData) -> &Vec<Self> {
        &data.events
    }

    fn slice_mut(data: &mut ChurchData) -> &mut Vec<Self> {
        &mut data.events
    }
}

/// Preset used by the quick-create actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTemplate {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub event_type: &'static str,
    pub category: &'static str,
    pub start_time: &'static str,
    pub end_time: &'static str,
    pub venue: &'static str,
    pub equipment: &'static [&'static str],
    pub audience: &'static [&'static str],
    pub public_event: bool,
    pub childcare_provided: bool,
}

impl EventTemplate {
    /// A new, unsaved event on `date` filled from this preset.
    pub fn instantiate(&self, date: NaiveDate) -> Event {
        Event {
            title: self.title.to_string(),
            description: self.description.to_string(),
            event_type: self.event_type.to_string(),
            category: self.category.to_string(),
            start_date: Some(date),
            start_time: self.start_time.to_string(),
            end_date: Some(date),
            end_time: self.end_time.to_string(),
            venue: self.venue.to_string(),
            equipment: self.equipment.iter().map(|s| s.to_string()).collect(),
            audience: self.audience.iter().map(|s| s.to_string()).collect(),
            public_event: self.public_event,
            childcare_provided: self.childcare_provided,
            status: "confirmed".to_string(),
            ..Default::default()
        }
    }
}

pub const EVENT_TEMPLATES: &[EventTemplate] = &[
    EventTemplate {
        key: "sunday-service",
        title: "Sunday Service",
        description: "Weekly Sunday worship service",
        event_type: "service",
        category: "worship",
        start_time: "10:00",
        end_time: "11:30",
        venue: "main-sanctuary",
        equipment: &["sound-system", "projector", "microphones"],
        audience: &["all-ages"],
        public_event: true,
        childcare_provided: true,
    },
    EventTemplate {
        key: "bible-study",
        title: "Bible Study",
        description: "Weekly Bible study and discussion",
        event_type: "study",
        category: "education",
        start_time: "19:00",
        end_time: "20:30",
        venue: "fellowship-hall",
        equipment: &["chairs"],
        audience: &["adults"],
        public_event: true,
        childcare_provided: false,
    },
    EventTemplate {
        key: "youth-meeting",
        title: "Youth Meeting",
        description: "Youth group meeting with activities and fellowship",
        event_type: "youth",
        category: "fellowship",
        start_time: "18:00",
        end_time: "20:00",
        venue: "youth-room",
        equipment: &["sound-system"],
        audience: &["youth"],
        public_event: true,
        childcare_provided: false,
    },
    EventTemplate {
        key: "board-meeting",
        title: "Board Meeting",
        description: "Monthly church board meeting",
        event_type: "meeting",
        category: "administration",
        start_time: "19:30",
        end_time: "21:00",
        venue: "conference-room",
        equipment: &[],
        audience: &["adults"],
        public_event: false,
        childcare_provided: false,
    },
    EventTemplate {
        key: "outreach",
        title: "Community Outreach",
        description: "Community service and outreach event",
        event_type: "outreach",
        category: "community",
        start_time: "09:00",
        end_time: "15:00",
        venue: "off-site",
        equipment: &[],
        audience: &["all-ages"],
        public_event: true,
        childcare_provided: false,
    },
    EventTemplate {
        key: "special-event",
        title: "Special Event",
        description: "Special church event",
        event_type: "special",
        category: "fellowship",
        start_time: "18:00",
        end_time: "21:00",
        venue: "fellowship-hall",
        equipment: &["sound-system", "decorations"],
        audience: &["all-ages"],
        public_event: true,
        childcare_provided: false,
    },
];

pub fn event_template(key: &str) -> Option<&'static EventTemplate> {
    EVENT_TEMPLATES.iter().find(|t| t.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekly(start: NaiveDate) -> Event {
        Event {
            title: "Bible Study".into(),
            start_date: Some(start),
            recurring: true,
            repeat_frequency: "weekly".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_occurrence() {
        let event = Event {
            start_date: Some(ymd(2024, 3, 10)),
            ..Default::default()
        };
        assert_eq!(
            event.occurrences_between(ymd(2024, 3, 1), ymd(2024, 3, 31)),
            vec![ymd(2024, 3, 10)]
        );
        assert!(event
            .occurrences_between(ymd(2024, 4, 1), ymd(2024, 4, 30))
            .is_empty());
    }

    #[test]
    fn test_weekly_occurrences_in_month() {
        let event = weekly(ymd(2024, 2, 21));
        assert_eq!(
            event.occurrences_between(ymd(2024, 3, 1), ymd(2024, 3, 31)),
            vec![ymd(2024, 3, 6), ymd(2024, 3, 13), ymd(2024, 3, 20), ymd(2024, 3, 27)]
        );
    }

    #[test]
    fn test_repeat_until_stops_expansion() {
        let mut event = weekly(ymd(2024, 3, 6));
        event.repeat_until = Some(ymd(2024, 3, 15));
        assert_eq!(
            event.occurrences_between(ymd(2024, 3, 1), ymd(2024, 3, 31)),
            vec![ymd(2024, 3, 6), ymd(2024, 3, 13)]
        );
    }

    #[test]
    fn test_unknown_frequency_is_not_recurring() {
        let mut event = weekly(ymd(2024, 3, 6));
        event.repeat_frequency = String::new();
        assert_eq!(event.recurrence(), None);
    }

    #[test]
    fn test_template_instantiate() {
        let template = event_template("board-meeting").unwrap();
        let event = template.instantiate(ymd(2024, 5, 1));
        assert_eq!(event.title, "Board Meeting");
        assert_eq!(event.venue, "conference-room");
        assert_eq!(event.start_date, Some(ymd(2024, 5, 1)));
        assert!(!event.public_event);
        assert!(event.attendees.is_empty());
        assert!(event_template("picnic").is_none());
        assert_eq!(EVENT_TEMPLATES.len(), 6);
    }

    #[test]
    fn test_deserialize_form_strings() {
        let raw = r#"{
            "id": 3,
            "title": "Youth Group",
            "type": "youth",
            "startDate": "2024-04-01",
            "maxCapacity": "",
            "registrationFee": "5",
            "budget": 100,
            "attendees": [1, 2]
        }"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, "youth");
        assert_eq!(event.max_capacity, None);
        assert_eq!(event.registration_fee, Money::from_major(5));
        assert_eq!(event.budget, Money::from_major(100));
        assert_eq!(event.attendance(), 2);
    }
}
