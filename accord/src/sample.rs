//! First-run data for a fresh data directory.

use crate::money::Money;
use crate::schema::{ChurchData, Donation, Event, Member, Ministry, VolunteerOpportunity};
use chrono::{Datelike, Days, Months, NaiveDate};

fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Sample members, events, donations, ministries and opportunities.
/// Donation and event dates are placed around `today` so every overview
/// figure has something to show.
pub fn church_data(today: NaiveDate) -> ChurchData {
    let this_month = ymd(today.year(), today.month(), 1);
    let last_month = this_month
        .and_then(|d| d.checked_sub_months(Months::new(1)))
        .and_then(|d| d.with_day(15));
    let in_days = |n: u64| today.checked_add_days(Days::new(n));

    ChurchData {
        members: members(),
        events: vec![
            Event {
                id: 1,
                title: "Sunday Worship Service".into(),
                description: "Weekly worship service with communion".into(),
                event_type: "worship".into(),
                category: "regular".into(),
                start_date: in_days(u64::from(7 - today.weekday().num_days_from_sunday())),
                start_time: "10:00".into(),
                end_time: "11:30".into(),
                recurring: true,
                repeat_frequency: "weekly".into(),
                venue: "main-sanctuary".into(),
                max_capacity: Some(300),
                primary_organizer: "Pastor Williams".into(),
                audience: vec!["all-ages".into()],
                public_event: true,
                childcare_provided: true,
                status: "confirmed".into(),
                ..Default::default()
            },
            Event {
                id: 2,
                title: "Midweek Bible Study".into(),
                description: "Study of the Gospel of John".into(),
                event_type: "bible-study".into(),
                category: "education".into(),
                start_date: in_days(3),
                start_time: "19:00".into(),
                end_time: "20:30".into(),
                venue: "fellowship-hall".into(),
                max_capacity: Some(40),
                primary_organizer: "John Smith".into(),
                audience: vec!["adults".into()],
                public_event: true,
                status: "confirmed".into(),
                ..Default::default()
            },
            Event {
                id: 3,
                title: "Youth Game Night".into(),
                description: "Games, pizza and a short devotional".into(),
                event_type: "youth".into(),
                category: "fellowship".into(),
                start_date: today.checked_sub_days(Days::new(10)),
                start_time: "18:00".into(),
                end_time: "21:00".into(),
                venue: "youth-room".into(),
                max_capacity: Some(50),
                primary_organizer: "Mary Johnson".into(),
                equipment: vec!["projector".into(), "tables".into()],
                audience: vec!["youth".into()],
                attendees: vec![2, 3],
                status: "completed".into(),
                ..Default::default()
            },
        ],
        donations: vec![
            Donation {
                id: 1,
                donor_id: Some(1),
                donor_name: "John Smith".into(),
                amount: Money::from_major(500),
                date: this_month,
                donation_type: "tithe".into(),
                method: "bank-transfer".into(),
                purpose: "Monthly tithe".into(),
                notes: "Regular monthly contribution".into(),
                receipt_sent: true,
                transaction_id: "TXN001".into(),
                ..Default::default()
            },
            Donation {
                id: 2,
                donor_id: Some(2),
                donor_name: "Mary Johnson".into(),
                amount: Money::from_major(150),
                date: this_month,
                donation_type: "offering".into(),
                method: "cash".into(),
                purpose: "Sunday offering".into(),
                ..Default::default()
            },
            Donation {
                id: 3,
                donor_id: Some(3),
                donor_name: "David Wilson".into(),
                amount: Money::from_major(1000),
                date: last_month,
                donation_type: "building".into(),
                method: "check".into(),
                fund: "building-fund".into(),
                purpose: "Building fund contribution".into(),
                notes: "For new sanctuary construction".into(),
                receipt_sent: true,
                check_number: "1001".into(),
                ..Default::default()
            },
            Donation {
                id: 4,
                donor_name: "Anonymous Friend".into(),
                amount: Money::from_cents(7_550),
                date: last_month,
                donation_type: "missions".into(),
                method: "online".into(),
                fund: "missions-fund".into(),
                anonymous: true,
                ..Default::default()
            },
        ],
        ministries: vec![
            Ministry {
                id: 1,
                name: "Worship Ministry".into(),
                category: "worship".into(),
                description: "Leads music and worship for Sunday services".into(),
                meeting_day: "thursday".into(),
                meeting_time: "19:00".into(),
                location: "Main Sanctuary".into(),
                leader: "John Smith".into(),
                assistant_leaders: vec!["Sarah Davis".into()],
                is_active: true,
                accepts_volunteers: true,
                requires_training: true,
                contact_email: "worship@church.org".into(),
                annual_budget: Money::from_major(5_000),
                volunteers: 15,
                events: 52,
                ..Default::default()
            },
            Ministry {
                id: 2,
                name: "Youth Ministry".into(),
                category: "youth".into(),
                description: "Discipleship and fellowship for teenagers".into(),
                meeting_day: "friday".into(),
                meeting_time: "18:00".into(),
                location: "Youth Room".into(),
                leader: "Mary Johnson".into(),
                is_active: true,
                accepts_volunteers: true,
                contact_email: "youth@church.org".into(),
                annual_budget: Money::from_major(3_000),
                volunteers: 8,
                events: 24,
                ..Default::default()
            },
        ],
        volunteer_opportunities: vec![
            VolunteerOpportunity {
                id: 1,
                title: "Sound Technician".into(),
                ministry_id: Some(1),
                ministry_name: "Worship Ministry".into(),
                description: "Run the sound board during services".into(),
                time_commitment: "weekly".into(),
                volunteers_needed: Some(2),
                skills_required: "Audio equipment experience".into(),
                ..Default::default()
            },
            VolunteerOpportunity {
                id: 2,
                title: "Youth Small Group Leader".into(),
                ministry_id: Some(2),
                ministry_name: "Youth Ministry".into(),
                description: "Lead a weekly small group discussion".into(),
                time_commitment: "weekly".into(),
                volunteers_needed: Some(4),
                background_check_required: true,
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

fn members() -> Vec<Member> {
    vec![
        Member {
            id: 1,
            title: "Mr.".into(),
            first_name: "John".into(),
            middle_name: "David".into(),
            last_name: "Smith".into(),
            email: "john.smith@email.com".into(),
            phone: "(555) 123-4567".into(),
            mobile_phone: "(555) 123-4568".into(),
            address: "123 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            country: "United States".into(),
            birth_date: ymd(1985, 6, 20),
            gender: "Male".into(),
            marital_status: "Married".into(),
            anniversary_date: ymd(2010, 8, 15),
            membership_status: "Active".into(),
            date_joined: ymd(2023, 1, 15),
            baptism_date: ymd(2023, 2, 1),
            ministries: vec!["worship".into(), "administration".into()],
            skills_talents: "Guitar, Leadership, Public Speaking".into(),
            family_name: "The Smith Family".into(),
            relationship_status: "Head of Household".into(),
            emergency_contact: "Jane Smith - (555) 123-4570".into(),
            occupation: "Teacher".into(),
            employer: "Springfield Elementary".into(),
            member_notes: "Active in worship ministry".into(),
            ..Default::default()
        },
        Member {
            id: 2,
            title: "Ms.".into(),
            first_name: "Mary".into(),
            middle_name: "Elizabeth".into(),
            last_name: "Johnson".into(),
            email: "mary.johnson@email.com".into(),
            phone: "(555) 234-5678".into(),
            address: "456 Oak Ave".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62702".into(),
            country: "United States".into(),
            birth_date: ymd(1990, 3, 15),
            gender: "Female".into(),
            marital_status: "Single".into(),
            membership_status: "Active".into(),
            date_joined: ymd(2023, 2, 20),
            baptism_date: ymd(2023, 3, 15),
            ministries: vec!["youth".into(), "children".into()],
            skills_talents: "Teaching, Childcare, Organization".into(),
            emergency_contact: "Robert Johnson - (555) 234-5680".into(),
            occupation: "Nurse".into(),
            ..Default::default()
        },
        Member {
            id: 3,
            first_name: "David".into(),
            last_name: "Wilson".into(),
            email: "david.wilson@email.com".into(),
            phone: "(555) 345-6789".into(),
            address: "789 Pine Rd".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62703".into(),
            birth_date: ymd(1958, 11, 2),
            gender: "Male".into(),
            marital_status: "Widowed".into(),
            membership_status: "Inactive".into(),
            date_joined: ymd(2015, 9, 6),
            family_name: "The Wilson Family".into(),
            occupation: "Retired".into(),
            ..Default::default()
        },
    ]
}
