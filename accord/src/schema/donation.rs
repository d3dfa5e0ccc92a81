use super::{
    field, opt_date_format, ChurchData, Entity, FieldKind as K, FieldSpec, Record, RecordId,
};
use crate::money::Money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Contact details for a donor who is not a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestDonor {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Donation {
    pub id: RecordId,
    /// Member reference; `None` for guests.
    #[serde(alias = "memberId")]
    pub donor_id: Option<RecordId>,
    #[serde(alias = "memberName")]
    pub donor_name: String,
    pub amount: Money,
    #[serde(with = "opt_date_format", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub donation_type: String,
    pub method: String,
    pub fund: String,
    pub purpose: String,
    pub notes: String,
    pub tax_deductible: bool,
    pub anonymous: bool,
    pub receipt_sent: bool,
    pub check_number: String,
    pub transaction_id: String,
    pub recurring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_donor: Option<GuestDonor>,
    /// Keys this crate does not model, kept so a save never drops them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Donation {
    fn default() -> Self {
        Donation {
            id: 0,
            donor_id: None,
            donor_name: String::new(),
            amount: Money::ZERO,
            date: None,
            donation_type: String::new(),
            method: String::new(),
            fund: Donation::DEFAULT_FUND.to_string(),
            purpose: String::new(),
            notes: String::new(),
            tax_deductible: true,
            anonymous: false,
            receipt_sent: false,
            check_number: String::new(),
            transaction_id: String::new(),
            recurring: false,
            guest_donor: None,
            extra: Map::new(),
        }
    }
}

impl Donation {
    pub const DEFAULT_FUND: &'static str = "general-fund";

    /// Name printed on receipts and lists.
    pub fn public_donor_name(&self) -> &str {
        if self.anonymous {
            "Anonymous"
        } else {
            &self.donor_name
        }
    }

    /// Key grouping a donor's gifts: member id when known, else the name.
    pub fn donor_key(&self) -> String {
        match self.donor_id {
            Some(id) => format!("member:{id}"),
            None => format!("guest:{}", self.donor_name.trim().to_lowercase()),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.donor_id.is_none()
    }
}

impl Record for Donation {
    const ENTITY: Entity = Entity::Donation;

    const FIELDS: &'static [FieldSpec] = &[
        field("donorId", K::Id),
        field("donorName", K::Text),
        field("amount", K::Money),
        field("date", K::Date),
        field("type", K::Text),
        field("method", K::Text),
        field("fund", K::Text),
        field("purpose", K::Text),
        field("notes", K::Text),
        field("taxDeductible", K::Bool),
        field("anonymous", K::Bool),
        field("receiptSent", K::Bool),
        field("checkNumber", K::Text),
        field("transactionId", K::Text),
        field("recurring", K::Bool),
        field("guestDonor", K::Object),
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn sort_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn display_name(&self) -> String {
        format!("{} donation from {}", self.amount, self.donor_name)
    }

    fn slice(data: &ChurchData) -> &Vec<Self> {
        &data.donations
    }

    fn slice_mut(data: &mut ChurchData) -> &mut Vec<Self> {
        &mut data.donations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_guest_donation_from_blob() {
        let raw = r#"{
            "id": 1706000000000,
            "donorId": null,
            "donorName": "Visiting Family",
            "amount": 75.5,
            "date": "2024-01-21",
            "type": "offering",
            "method": "cash",
            "guestDonor": {"name": "Visiting Family", "email": "v@example.com"}
        }"#;
        let donation: Donation = serde_json::from_str(raw).unwrap();
        assert!(donation.is_guest());
        assert_eq!(donation.amount, Money::from_cents(7550));
        assert_eq!(donation.fund, "general-fund");
        assert_eq!(donation.guest_donor.as_ref().unwrap().phone, "");
        assert_eq!(donation.donor_key(), "guest:visiting family");
    }

    #[test]
    fn test_anonymous_name_hidden() {
        let donation = Donation {
            donor_id: Some(4),
            donor_name: "Grace Lee".into(),
            anonymous: true,
            ..Default::default()
        };
        assert_eq!(donation.public_donor_name(), "Anonymous");
        assert_eq!(donation.donor_key(), "member:4");
    }
}
