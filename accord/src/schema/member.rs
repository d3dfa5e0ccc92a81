use super::{
    field, opt_date_format, ChurchData, Entity, FieldKind as K, FieldSpec, Record, RecordId,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    pub id: RecordId,
    pub title: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub suffix: String,
    pub email: String,
    pub phone: String,
    pub mobile_phone: String,
    pub work_phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    pub gender: String,
    pub marital_status: String,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub anniversary_date: Option<NaiveDate>,
    pub membership_status: String,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<NaiveDate>,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub baptism_date: Option<NaiveDate>,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub confirmation_date: Option<NaiveDate>,
    pub ministries: Vec<String>,
    pub skills_talents: String,
    pub family_name: String,
    pub relationship_status: String,
    pub emergency_contact: String,
    pub occupation: String,
    pub employer: String,
    pub special_needs: String,
    pub member_notes: String,
    pub photo: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Member {
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whole years on `today`, or `None` without a birth date.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let born = self.birth_date?;
        let mut years = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    pub fn is_active(&self) -> bool {
        self.membership_status.eq_ignore_ascii_case("active")
    }

    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect()
    }
}

impl Record for Member {
    const ENTITY: Entity = Entity::Member;

    const FIELDS: &'static [FieldSpec] = &[
        field("title", K::Text),
        field("firstName", K::Text),
        field("middleName", K::Text),
        field("lastName", K::Text),
        field("suffix", K::Text),
        field("email", K::Text),
        field("phone", K::Text),
        field("mobilePhone", K::Text),
        field("workPhone", K::Text),
        field("address", K::Text),
        field("city", K::Text),
        field("state", K::Text),
        field("zipCode", K::Text),
        field("country", K::Text),
        field("birthDate", K::Date),
        field("gender", K::Text),
        field("maritalStatus", K::Text),
        field("anniversaryDate", K::Date),
        field("membershipStatus", K::Text),
        field("dateJoined", K::Date),
        field("baptismDate", K::Date),
        field("confirmationDate", K::Date),
        field("ministries", K::List),
        field("skillsTalents", K::Text),
        field("familyName", K::Text),
        field("relationshipStatus", K::Text),
        field("emergencyContact", K::Text),
        field("occupation", K::Text),
        field("employer", K::Text),
        field("specialNeeds", K::Text),
        field("memberNotes", K::Text),
        field("photo", K::Text),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn sort_date(&self) -> Option<NaiveDate> {
        self.date_joined
    }

    fn display_name(&self) -> String {
        self.full_name()
    }

    fn slice(data: &ChurchData) -> &Vec<Self> {
        &data.members
    }

    fn slice_mut(data: &mut ChurchData) -> &mut Vec<Self> {
        &mut data.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let member = Member {
            birth_date: Some(ymd(1990, 6, 15)),
            ..Default::default()
        };
        assert_eq!(member.age_on(ymd(2024, 6, 14)), Some(33));
        assert_eq!(member.age_on(ymd(2024, 6, 15)), Some(34));
        assert_eq!(Member::default().age_on(ymd(2024, 1, 1)), None);
    }

    #[test]
    fn test_deserialize_blank_dates_and_missing_fields() {
        let raw = r#"{
            "id": 1700000000000,
            "firstName": "Ruth",
            "lastName": "Okafor",
            "birthDate": "",
            "dateJoined": "2019-03-10",
            "ministries": ["worship", "youth"]
        }"#;
        let member: Member = serde_json::from_str(raw).unwrap();
        assert_eq!(member.full_name(), "Ruth Okafor");
        assert_eq!(member.birth_date, None);
        assert_eq!(member.date_joined, Some(ymd(2019, 3, 10)));
        assert_eq!(member.ministries, vec!["worship", "youth"]);
        assert_eq!(member.initials(), "RO");

        let json = serde_json::to_value(&member).unwrap();
        assert!(json.get("birthDate").is_none());
        assert_eq!(json["dateJoined"], "2019-03-10");
    }
}
