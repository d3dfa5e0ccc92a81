//! Pure predicates deriving a filtered view from a collection.
//!
//! Every predicate receives the calendar date it is evaluated on through
//! [`FilterContext`]; nothing here reads the wall clock.

use crate::money::Money;
use crate::schema::{
    month_start, Donation, Event, Member, Ministry, Record, RecordId, VolunteerOpportunity,
};
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Evaluation context shared by every filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterContext {
    pub today: NaiveDate,
    pub week_start: Weekday,
}

impl FilterContext {
    pub fn new(today: NaiveDate) -> Self {
        FilterContext {
            today,
            week_start: Weekday::Sun,
        }
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }
}

/// Case-insensitive substring match over `fields`. A blank term matches.
pub fn matches_search(term: &str, fields: &[&str]) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields.iter().any(|f| f.to_lowercase().contains(&needle))
}

/// `Some(v)` unless the select box says "all" or is blank.
pub fn selection(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(v.to_string())
    }
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// First day of the week containing `date`.
pub fn week_start_of(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let day = date.weekday().num_days_from_sunday();
    let offset = (7 + day - week_start.num_days_from_sunday()) % 7;
    date.checked_sub_days(Days::new(offset as u64)).unwrap_or(date)
}

/// Date buckets offered by list filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateRange {
    #[default]
    All,
    Today,
    /// The seven days up to and including today.
    PastWeek,
    /// The calendar week containing today.
    ThisWeek,
    ThisMonth,
    ThisQuarter,
    ThisYear,
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl DateRange {
    /// Inclusive bounds on `ctx.today`; `None` means unbounded on that side.
    pub fn bounds(&self, ctx: &FilterContext) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let today = ctx.today;
        match *self {
            DateRange::All => (None, None),
            DateRange::Today => (Some(today), Some(today)),
            DateRange::PastWeek => (today.checked_sub_days(Days::new(7)), Some(today)),
            DateRange::ThisWeek => {
                let start = week_start_of(today, ctx.week_start);
                (Some(start), start.checked_add_days(Days::new(6)))
            }
            DateRange::ThisMonth => (Some(month_start(today)), Some(last_day_of_month(today))),
            DateRange::ThisQuarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                let start = NaiveDate::from_ymd_opt(today.year(), first_month, 1);
                let end = start
                    .and_then(|s| s.checked_add_months(Months::new(3)))
                    .and_then(|d| d.pred_opt());
                (start, end)
            }
            DateRange::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1),
                NaiveDate::from_ymd_opt(today.year(), 12, 31),
            ),
            DateRange::Custom { start, end } => (start, end),
        }
    }

    /// Undated records only pass the unrestricted range.
    pub fn contains(&self, date: Option<NaiveDate>, ctx: &FilterContext) -> bool {
        if *self == DateRange::All {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        let (start, end) = self.bounds(ctx);
        start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
    }
}

impl FromStr for DateRange {
    type Err = String;

    /// Accepts the select values (`today`, `week`, `month`, ...) and
    /// `custom:START:END` with either side optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if let Some(rest) = value.strip_prefix("custom") {
            let rest = rest.trim_start_matches(':');
            let (start, end) = rest.split_once(':').unwrap_or((rest, ""));
            let parse = |p: &str| -> Result<Option<NaiveDate>, String> {
                if p.is_empty() {
                    Ok(None)
                } else {
                    crate::schema::parse_date(p)
                        .map(Some)
                        .ok_or_else(|| format!("Invalid date '{p}' in range"))
                }
            };
            return Ok(DateRange::Custom {
                start: parse(start)?,
                end: parse(end)?,
            });
        }
        match value.as_str() {
            "" | "all" => Ok(DateRange::All),
            "today" => Ok(DateRange::Today),
            "week" | "past-week" => Ok(DateRange::PastWeek),
            "this-week" => Ok(DateRange::ThisWeek),
            "month" | "this-month" => Ok(DateRange::ThisMonth),
            "quarter" | "this-quarter" => Ok(DateRange::ThisQuarter),
            "year" | "this-year" => Ok(DateRange::ThisYear),
            other => Err(format!("Unknown date range '{other}'")),
        }
    }
}

/// A filter state for records of type `R`.
pub trait RecordFilter<R>: Default + Clone + fmt::Debug {
    fn matches(&self, record: &R, ctx: &FilterContext) -> bool;

    /// Indices of matching records, in collection order.
    fn apply(&self, records: &[R], ctx: &FilterContext) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.matches(r, ctx))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Links a record type to its filter state.
pub trait Filtered: Record {
    type Filter: RecordFilter<Self>;
}

/// Stable date-descending order; undated records go last.
pub fn sort_recent_first<R: Record>(records: &mut [&R]) {
    records.sort_by(|a, b| b.sort_date().cmp(&a.sort_date()));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgeGroup {
    Children,
    Youth,
    YoungAdult,
    Adult,
    Senior,
}

impl AgeGroup {
    pub fn of(age: u32) -> AgeGroup {
        match age {
            0..=12 => AgeGroup::Children,
            13..=17 => AgeGroup::Youth,
            18..=30 => AgeGroup::YoungAdult,
            31..=64 => AgeGroup::Adult,
            _ => AgeGroup::Senior,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Children => "Children (0-12)",
            AgeGroup::Youth => "Youth (13-17)",
            AgeGroup::YoungAdult => "Young Adults (18-30)",
            AgeGroup::Adult => "Adults (31-64)",
            AgeGroup::Senior => "Seniors (65+)",
        }
    }
}

impl FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "children" => Ok(AgeGroup::Children),
            "youth" => Ok(AgeGroup::Youth),
            "young-adult" => Ok(AgeGroup::YoungAdult),
            "adult" => Ok(AgeGroup::Adult),
            "senior" => Ok(AgeGroup::Senior),
            other => Err(format!("Unknown age group '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberFilter {
    pub search: String,
    /// Compared case-insensitively against `membershipStatus`.
    pub status: Option<String>,
    pub age_group: Option<AgeGroup>,
    pub ministry: Option<String>,
}

impl RecordFilter<Member> for MemberFilter {
    fn matches(&self, m: &Member, ctx: &FilterContext) -> bool {
        if !matches_search(&self.search, &[&m.first_name, &m.last_name, &m.email, &m.phone]) {
            return false;
        }
        if let Some(status) = &self.status {
            if !m.membership_status.eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if let Some(group) = self.age_group {
            match m.age_on(ctx.today) {
                Some(age) if AgeGroup::of(age) == group => {}
                _ => return false,
            }
        }
        if let Some(ministry) = &self.ministry {
            if !m.ministries.iter().any(|x| x == ministry) {
                return false;
            }
        }
        true
    }
}

impl Filtered for Member {
    type Filter = MemberFilter;
}

/// Timing buckets of the event status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTiming {
    /// Starting today or later.
    Upcoming,
    Past,
    Today,
    ThisWeek,
    ThisMonth,
}

impl EventTiming {
    pub fn matches(self, start: Option<NaiveDate>, ctx: &FilterContext) -> bool {
        let Some(start) = start else {
            return false;
        };
        match self {
            EventTiming::Upcoming => start >= ctx.today,
            EventTiming::Past => start < ctx.today,
            EventTiming::Today => start == ctx.today,
            EventTiming::ThisWeek => DateRange::ThisWeek.contains(Some(start), ctx),
            EventTiming::ThisMonth => DateRange::ThisMonth.contains(Some(start), ctx),
        }
    }
}

impl FromStr for EventTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Ok(EventTiming::Upcoming),
            "past" => Ok(EventTiming::Past),
            "today" => Ok(EventTiming::Today),
            "this-week" => Ok(EventTiming::ThisWeek),
            "this-month" => Ok(EventTiming::ThisMonth),
            other => Err(format!("Unknown event status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub search: String,
    pub event_type: Option<String>,
    pub timing: Option<EventTiming>,
    pub venue: Option<String>,
}

impl RecordFilter<Event> for EventFilter {
    fn matches(&self, e: &Event, ctx: &FilterContext) -> bool {
        matches_search(&self.search, &[&e.title, &e.description, &e.venue])
            && self.event_type.as_ref().map_or(true, |t| &e.event_type == t)
            && self.timing.map_or(true, |t| t.matches(e.start_date, ctx))
            && self.venue.as_ref().map_or(true, |v| &e.venue == v)
    }
}

impl Filtered for Event {
    type Filter = EventFilter;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonationFilter {
    pub search: String,
    pub donation_type: Option<String>,
    pub method: Option<String>,
    pub fund: Option<String>,
    pub range: DateRange,
}

impl RecordFilter<Donation> for DonationFilter {
    fn matches(&self, d: &Donation, ctx: &FilterContext) -> bool {
        let amount = amount_search_text(d.amount);
        matches_search(&self.search, &[&d.donor_name, &amount, &d.purpose, &d.notes])
            && self.donation_type.as_ref().map_or(true, |t| &d.donation_type == t)
            && self.method.as_ref().map_or(true, |m| &d.method == m)
            && self.fund.as_ref().map_or(true, |f| &d.fund == f)
            && self.range.contains(d.date, ctx)
    }
}

impl Filtered for Donation {
    type Filter = DonationFilter;
}

/// Amount as a user would type it: `500` or `150.5`.
fn amount_search_text(amount: Money) -> String {
    let text = amount.to_decimal_string();
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinistryFilter {
    pub search: String,
    pub category: Option<String>,
    pub active_only: bool,
}

impl RecordFilter<Ministry> for MinistryFilter {
    fn matches(&self, m: &Ministry, _ctx: &FilterContext) -> bool {
        matches_search(&self.search, &[&m.name, &m.description, &m.leader])
            && self.category.as_ref().map_or(true, |c| &m.category == c)
            && (!self.active_only || m.is_active)
    }
}

impl Filtered for Ministry {
    type Filter = MinistryFilter;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpportunityFilter {
    pub search: String,
    pub ministry_id: Option<RecordId>,
    pub active_only: bool,
}

impl RecordFilter<VolunteerOpportunity> for OpportunityFilter {
    fn matches(&self, o: &VolunteerOpportunity, _ctx: &FilterContext) -> bool {
        matches_search(&self.search, &[&o.title, &o.description, &o.ministry_name])
            && self.ministry_id.map_or(true, |id| o.ministry_id == Some(id))
            && (!self.active_only || o.is_active)
    }
}

impl Filtered for VolunteerOpportunity {
    type Filter = OpportunityFilter;
}
