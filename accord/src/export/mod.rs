//! CSV export of record collections.
//!
//! Every field is quoted with embedded quotes doubled, rows are joined
//! with `\n`. The reader accepts the same dialect, including newlines
//! inside quoted fields.

use crate::error::{AccordError, Result};
use crate::money::Money;
use crate::schema::{Donation, Entity, Event, Member, Ministry, Record, VolunteerOpportunity};
use crate::view::labels;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// A record type with a fixed CSV column layout.
pub trait CsvExport: Record {
    const HEADERS: &'static [&'static str];

    /// One cell per header, already formatted for display.
    fn csv_row(&self) -> Vec<String>;
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn write_row<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Header row plus one row per record.
pub fn to_csv<'a, R: CsvExport + 'a>(records: impl IntoIterator<Item = &'a R>) -> String {
    let mut lines = vec![write_row(R::HEADERS)];
    lines.extend(records.into_iter().map(|r| write_row(&r.csv_row())));
    lines.join("\n")
}

/// Split CSV text into rows of cells.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(ch);
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            _ => cell.push(ch),
        }
    }
    if in_quotes {
        return Err(AccordError::Csv("unterminated quoted field".into()));
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    Ok(rows)
}

/// Rows keyed by the header row.
pub fn parse_records(text: &str) -> Result<Vec<BTreeMap<String, String>>> {
    let mut rows = parse_csv(text)?.into_iter();
    let headers = rows
        .next()
        .ok_or_else(|| AccordError::Csv("CSV is empty".into()))?;
    rows.enumerate()
        .map(|(i, row)| {
            if row.len() != headers.len() {
                return Err(AccordError::Csv(format!(
                    "row {} has {} fields, expected {}",
                    i + 2,
                    row.len(),
                    headers.len()
                )));
            }
            Ok(headers.iter().cloned().zip(row).collect())
        })
        .collect()
}

/// `accord-church-members-2024-05-15.csv`.
pub fn export_filename(prefix: &str, entity: Entity, date: NaiveDate) -> String {
    let name = match entity {
        Entity::Member => "members",
        Entity::Event => "events",
        Entity::Donation => "donations",
        Entity::Ministry => "ministries",
        Entity::Opportunity => "volunteer-opportunities",
    };
    format!("{prefix}-{name}-{}.csv", date.format("%Y-%m-%d"))
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn yes_no(flag: bool) -> String {
    let label = if flag { "Yes" } else { "No" };
    label.to_string()
}

/// `500`, `150.5`; zero renders empty.
fn plain_amount(amount: Money) -> String {
    if amount.is_zero() {
        return String::new();
    }
    number_text(amount)
}

fn number_text(amount: Money) -> String {
    let text = amount.to_decimal_string();
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl CsvExport for Member {
    const HEADERS: &'static [&'static str] = &[
        "Title",
        "First Name",
        "Middle Name",
        "Last Name",
        "Suffix",
        "Email",
        "Phone",
        "Mobile Phone",
        "Work Phone",
        "Address",
        "City",
        "State",
        "ZIP Code",
        "Country",
        "Birth Date",
        "Gender",
        "Marital Status",
        "Anniversary Date",
        "Membership Status",
        "Date Joined",
        "Baptism Date",
        "Confirmation Date",
        "Ministries",
        "Skills & Talents",
        "Family Name",
        "Relationship Status",
        "Emergency Contact",
        "Occupation",
        "Employer",
        "Special Needs",
        "Notes",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.first_name.clone(),
            self.middle_name.clone(),
            self.last_name.clone(),
            self.suffix.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.mobile_phone.clone(),
            self.work_phone.clone(),
            self.address.clone(),
            self.city.clone(),
            self.state.clone(),
            self.zip_code.clone(),
            self.country.clone(),
            date_cell(self.birth_date),
            self.gender.clone(),
            self.marital_status.clone(),
            date_cell(self.anniversary_date),
            self.membership_status.clone(),
            date_cell(self.date_joined),
            date_cell(self.baptism_date),
            date_cell(self.confirmation_date),
            self.ministries.join("; "),
            self.skills_talents.clone(),
            self.family_name.clone(),
            self.relationship_status.clone(),
            self.emergency_contact.clone(),
            self.occupation.clone(),
            self.employer.clone(),
            self.special_needs.clone(),
            self.member_notes.clone(),
        ]
    }
}

impl CsvExport for Event {
    const HEADERS: &'static [&'static str] = &[
        "Title",
        "Description",
        "Type",
        "Category",
        "Start Date",
        "Start Time",
        "End Date",
        "End Time",
        "Venue",
        "Room",
        "Max Capacity",
        "Registration Required",
        "Primary Organizer",
        "Contact Phone",
        "Equipment",
        "Budget",
        "Public Event",
        "Childcare Provided",
        "Notes",
        "Status",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.description.clone(),
            self.event_type.clone(),
            self.category.clone(),
            date_cell(self.start_date),
            self.start_time.clone(),
            date_cell(self.end_date),
            self.end_time.clone(),
            labels::venue(&self.venue),
            self.room.clone(),
            self.max_capacity
                .filter(|&n| n > 0)
                .map(|n| n.to_string())
                .unwrap_or_default(),
            self.registration_required.clone(),
            self.primary_organizer.clone(),
            self.contact_phone.clone(),
            self.equipment.join("; "),
            plain_amount(self.budget),
            yes_no(self.public_event),
            yes_no(self.childcare_provided),
            self.event_notes.clone(),
            self.status.clone(),
        ]
    }
}

impl CsvExport for Donation {
    const HEADERS: &'static [&'static str] = &[
        "Date",
        "Donor Name",
        "Amount",
        "Type",
        "Method",
        "Fund",
        "Purpose",
        "Check Number",
        "Transaction ID",
        "Tax Deductible",
        "Anonymous",
        "Notes",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            date_cell(self.date),
            self.public_donor_name().to_string(),
            number_text(self.amount),
            labels::donation_type(&self.donation_type),
            labels::payment_method(&self.method),
            labels::fund(&self.fund),
            self.purpose.clone(),
            self.check_number.clone(),
            self.transaction_id.clone(),
            yes_no(self.tax_deductible),
            yes_no(self.anonymous),
            self.notes.clone(),
        ]
    }
}

impl CsvExport for Ministry {
    const HEADERS: &'static [&'static str] = &[
        "Name",
        "Category",
        "Description",
        "Meeting Schedule",
        "Location",
        "Leader",
        "Assistant Leaders",
        "Active",
        "Volunteers",
        "Events",
        "Contact Email",
        "Annual Budget",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            labels::ministry_category(&self.category),
            self.description.clone(),
            labels::meeting_schedule(&self.meeting_day, &self.meeting_time),
            labels::venue(&self.location),
            self.leader.clone(),
            self.assistant_leaders.join("; "),
            yes_no(self.is_active),
            self.volunteers.to_string(),
            self.events.to_string(),
            self.contact_email.clone(),
            plain_amount(self.annual_budget),
        ]
    }
}

impl CsvExport for VolunteerOpportunity {
    const HEADERS: &'static [&'static str] = &[
        "Title",
        "Ministry",
        "Description",
        "Time Commitment",
        "Volunteers Needed",
        "Skills Required",
        "Background Check Required",
        "Active",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.ministry_name.clone(),
            self.description.clone(),
            labels::time_commitment(&self.time_commitment),
            self.volunteers_needed
                .map(|n| n.to_string())
                .unwrap_or_default(),
            self.skills_required.clone(),
            yes_no(self.background_check_required),
            yes_no(self.is_active),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_date;
    use pretty_assertions::assert_eq;

    fn tricky_member() -> Member {
        Member {
            first_name: "Ama \"Sunshine\"".into(),
            last_name: "Owusu, Jr".into(),
            member_notes: "line one\nline two".into(),
            ministries: vec!["worship".into(), "youth".into()],
            date_joined: parse_date("2023-09-10"),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_field_quoted() {
        let csv = to_csv(&[Member {
            first_name: "Kofi".into(),
            ..Default::default()
        }]);
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("\"Title\",\"First Name\","));
        assert!(lines.next().unwrap().starts_with("\"\",\"Kofi\","));
        assert_eq!(Member::HEADERS.len(), 31);
        assert_eq!(Event::HEADERS.len(), 20);
        assert_eq!(Donation::HEADERS.len(), 12);
    }

    #[test]
    fn test_round_trip_with_commas_quotes_and_newlines() {
        let members = vec![tricky_member(), Member::default()];
        let csv = to_csv(&members);
        let rows = parse_csv(&csv).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], Member::HEADERS.to_vec());
        for (row, member) in rows[1..].iter().zip(&members) {
            assert_eq!(row, &member.csv_row());
        }
        assert_eq!(rows[1][1], "Ama \"Sunshine\"");
        assert_eq!(rows[1][3], "Owusu, Jr");
        assert_eq!(rows[1][22], "worship; youth");
    }

    #[test]
    fn test_parse_records_keyed_by_header() {
        let donation = Donation {
            donor_name: "Yaw, Sr".into(),
            amount: Money::from_cents(15_050),
            date: parse_date("2024-01-10"),
            donation_type: "offering".into(),
            method: "credit-card".into(),
            ..Default::default()
        };
        let records = parse_records(&to_csv(&[donation])).unwrap();
        assert_eq!(records[0]["Donor Name"], "Yaw, Sr");
        assert_eq!(records[0]["Amount"], "150.5");
        assert_eq!(records[0]["Method"], "Credit Card");
        assert_eq!(records[0]["Fund"], "General Fund");
        assert_eq!(records[0]["Tax Deductible"], "Yes");
    }

    #[test]
    fn test_anonymous_donor_hidden() {
        let donation = Donation {
            donor_name: "Secret".into(),
            anonymous: true,
            ..Default::default()
        };
        assert_eq!(donation.csv_row()[1], "Anonymous");
    }

    #[test]
    fn test_event_row_formatting() {
        let event = Event {
            title: "Picnic".into(),
            venue: "fellowship-hall".into(),
            equipment: vec!["grill".into(), "tables".into()],
            public_event: true,
            ..Default::default()
        };
        let row = event.csv_row();
        assert_eq!(row[8], "Fellowship Hall");
        assert_eq!(row[10], "");
        assert_eq!(row[14], "grill; tables");
        assert_eq!(row[15], "");
        assert_eq!(row[16], "Yes");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_csv("\"open"), Err(AccordError::Csv(_))));
        assert!(parse_records("").is_err());
        assert!(parse_records("\"a\",\"b\"\n\"1\"").is_err());
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(
            export_filename("accord-church", Entity::Donation, date),
            "accord-church-donations-2024-05-15.csv"
        );
    }
}
