//! Code → display-label tables. Unknown codes are shown as-is.

type Table = &'static [(&'static str, &'static str)];

pub const PAYMENT_METHODS: Table = &[
    ("cash", "Cash"),
    ("check", "Check"),
    ("credit-card", "Credit Card"),
    ("debit-card", "Debit Card"),
    ("bank-transfer", "Bank Transfer"),
    ("online", "Online Payment"),
    ("mobile-app", "Mobile App"),
];

pub const FUNDS: Table = &[
    ("general-fund", "General Fund"),
    ("building-fund", "Building Fund"),
    ("mission-fund", "Mission Fund"),
    ("youth-ministry", "Youth Ministry"),
    ("children-ministry", "Children's Ministry"),
    ("music-ministry", "Music Ministry"),
    ("outreach", "Community Outreach"),
];

pub const DONATION_TYPES: Table = &[
    ("tithe", "Tithe"),
    ("offering", "Offering"),
    ("special", "Special Offering"),
    ("building", "Building Fund"),
    ("mission", "Mission"),
    ("pledge", "Pledge Payment"),
    ("memorial", "Memorial Gift"),
    ("thanksgiving", "Thanksgiving"),
];

pub const VENUES: Table = &[
    ("main-sanctuary", "Main Sanctuary"),
    ("fellowship-hall", "Fellowship Hall"),
    ("youth-room", "Youth Room"),
    ("conference-room", "Conference Room"),
    ("children-room", "Children's Room"),
    ("off-site", "Off-site Location"),
];

pub const EVENT_TYPES: Table = &[
    ("service", "Service"),
    ("study", "Bible Study"),
    ("meeting", "Meeting"),
    ("social", "Social"),
    ("outreach", "Outreach"),
    ("youth", "Youth"),
    ("children", "Children"),
    ("special", "Special Event"),
];

/// Icon names shown on event cards, by event type.
pub const EVENT_ICONS: Table = &[
    ("service", "church"),
    ("study", "book"),
    ("youth", "users"),
    ("meeting", "handshake"),
    ("outreach", "hands-helping"),
    ("special", "star"),
];

pub const MINISTRY_CATEGORIES: Table = &[
    ("worship", "Worship"),
    ("education", "Education"),
    ("outreach", "Outreach"),
    ("fellowship", "Fellowship"),
    ("support", "Support"),
    ("youth", "Youth"),
    ("children", "Children"),
    ("seniors", "Seniors"),
];

/// Short ministry tags shown on member cards.
pub const MEMBER_MINISTRIES: Table = &[
    ("worship", "Worship"),
    ("youth", "Youth"),
    ("children", "Children"),
    ("outreach", "Outreach"),
    ("administration", "Admin"),
    ("hospitality", "Hospitality"),
];

pub const MEETING_DAYS: Table = &[
    ("sunday", "Sunday"),
    ("monday", "Monday"),
    ("tuesday", "Tuesday"),
    ("wednesday", "Wednesday"),
    ("thursday", "Thursday"),
    ("friday", "Friday"),
    ("saturday", "Saturday"),
];

pub const TIME_COMMITMENTS: Table = &[
    ("one-time", "One-time"),
    ("weekly", "Weekly"),
    ("monthly", "Monthly"),
    ("seasonal", "Seasonal"),
    ("ongoing", "Ongoing"),
];

pub const FREQUENCIES: Table = &[
    ("daily", "Daily"),
    ("weekly", "Weekly"),
    ("biweekly", "Biweekly"),
    ("monthly", "Monthly"),
    ("quarterly", "Quarterly"),
    ("annually", "Annually"),
];

pub fn lookup(table: Table, code: &str) -> String {
    table
        .iter()
        .find(|(k, _)| *k == code)
        .map_or_else(|| code.to_string(), |(_, label)| label.to_string())
}

pub fn payment_method(code: &str) -> String {
    lookup(PAYMENT_METHODS, code)
}

pub fn fund(code: &str) -> String {
    lookup(FUNDS, code)
}

pub fn donation_type(code: &str) -> String {
    lookup(DONATION_TYPES, code)
}

pub fn venue(code: &str) -> String {
    lookup(VENUES, code)
}

pub fn event_type(code: &str) -> String {
    lookup(EVENT_TYPES, code)
}

pub fn event_icon(event_type: &str) -> &'static str {
    EVENT_ICONS
        .iter()
        .find(|(k, _)| *k == event_type)
        .map_or("calendar", |(_, icon)| *icon)
}

pub fn ministry_category(code: &str) -> String {
    lookup(MINISTRY_CATEGORIES, code)
}

pub fn member_ministry(code: &str) -> String {
    lookup(MEMBER_MINISTRIES, code)
}

pub fn time_commitment(code: &str) -> String {
    lookup(TIME_COMMITMENTS, code)
}

pub fn frequency(code: &str) -> String {
    lookup(FREQUENCIES, code)
}

/// `19:00` → `7:00 PM`. Input that is not `HH:MM` is returned unchanged.
pub fn time_of_day(time: &str) -> String {
    match chrono::NaiveTime::parse_from_str(time.trim(), "%H:%M") {
        Ok(t) => t.format("%-I:%M %p").to_string(),
        Err(_) => time.to_string(),
    }
}

/// `Wednesday 7:00 PM`.
pub fn meeting_schedule(day: &str, time: &str) -> String {
    let time = if time.trim().is_empty() {
        String::new()
    } else {
        time_of_day(time)
    };
    format!("{} {}", lookup(MEETING_DAYS, day), time).trim().to_string()
}
