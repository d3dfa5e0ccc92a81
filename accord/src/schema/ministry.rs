use super::{
    field, opt_count_format, ChurchData, Entity, FieldKind as K, FieldSpec, Record, RecordId,
};
use crate::money::Money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ministry {
    pub id: RecordId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub meeting_day: String,
    pub meeting_time: String,
    pub location: String,
    /// Leader by display name; not checked against the member list.
    pub leader: String,
    pub assistant_leaders: Vec<String>,
    pub is_active: bool,
    pub accepts_volunteers: bool,
    pub requires_training: bool,
    pub contact_email: String,
    pub annual_budget: Money,
    pub volunteers: u32,
    pub events: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Ministry {
    /// The leader plus every assistant.
    pub fn leader_count(&self) -> usize {
        1 + self.assistant_leaders.len()
    }
}

impl Record for Ministry {
    const ENTITY: Entity = Entity::Ministry;

    const FIELDS: &'static [FieldSpec] = &[
        field("name", K::Text),
        field("category", K::Text),
        field("description", K::Text),
        field("meetingDay", K::Text),
        field("meetingTime", K::Text),
        field("location", K::Text),
        field("leader", K::Text),
        field("assistantLeaders", K::List),
        field("isActive", K::Bool),
        field("acceptsVolunteers", K::Bool),
        field("requiresTraining", K::Bool),
        field("contactEmail", K::Text),
        field("annualBudget", K::Money),
        field("volunteers", K::Number),
        field("events", K::Number),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn sort_date(&self) -> Option<NaiveDate> {
        None
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn slice(data: &ChurchData) -> &Vec<Self> {
        &data.ministries
    }

    fn slice_mut(data: &mut ChurchData) -> &mut Vec<Self> {
        &mut data.ministries
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolunteerOpportunity {
    pub id: RecordId,
    pub title: String,
    pub ministry_id: Option<RecordId>,
    /// Copied from the ministry when the opportunity is saved.
    pub ministry_name: String,
    pub description: String,
    pub time_commitment: String,
    #[serde(with = "opt_count_format", skip_serializing_if = "Option::is_none")]
    pub volunteers_needed: Option<u32>,
    pub skills_required: String,
    pub background_check_required: bool,
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for VolunteerOpportunity {
    fn default() -> Self {
        VolunteerOpportunity {
            id: 0,
            title: String::new(),
            ministry_id: None,
            ministry_name: String::new(),
            description: String::new(),
            time_commitment: String::new(),
            volunteers_needed: None,
            skills_required: String::new(),
            background_check_required: false,
            is_active: true,
            extra: Map::new(),
        }
    }
}

impl Record for VolunteerOpportunity {
    const ENTITY: Entity = Entity::Opportunity;

    const FIELDS: &'static [FieldSpec] = &[
        field("title", K::Text),
        field("ministryId", K::Id),
        field("ministryName", K::Text),
        field("description", K::Text),
        field("timeCommitment", K::Text),
        field("volunteersNeeded", K::Number),
        field("skillsRequired", K::Text),
        field("backgroundCheckRequired", K::Bool),
        field("isActive", K::Bool),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn sort_date(&self) -> Option<NaiveDate> {
        None
    }

    fn display_name(&self) -> String {
        self.title.clone()
    }

    fn slice(data: &ChurchData) -> &Vec<Self> {
        &data.volunteer_opportunities
    }

    fn slice_mut(data: &mut ChurchData) -> &mut Vec<Self> {
        &mut data.volunteer_opportunities
    }
}
