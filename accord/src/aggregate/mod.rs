//! Summary statistics over record collections.
//!
//! Every function is a single pass over its input and takes the reference
//! date explicitly. Inputs are iterators of references so the same code
//! serves both full collections and filtered views.

use crate::filter::{DateRange, FilterContext};
use crate::money::Money;
use crate::schema::{month_start, Donation, Entity, Event, Member, Ministry, RecordId};
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Donation type counted toward the building-fund goal.
pub const BUILDING_TYPE: &str = "building";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub sum: Money,
    pub average: Money,
    pub min: Option<Money>,
    pub max: Option<Money>,
}

impl Stats {
    pub fn of(amounts: impl IntoIterator<Item = Money>) -> Stats {
        let mut stats = Stats::default();
        for amount in amounts {
            stats.count += 1;
            stats.sum += amount;
            stats.min = Some(stats.min.map_or(amount, |m| m.min(amount)));
            stats.max = Some(stats.max.map_or(amount, |m| m.max(amount)));
        }
        stats.average = stats.sum.average(stats.count);
        stats
    }
}

// Donations

pub fn total<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> Money {
    donations.into_iter().map(|d| d.amount).sum()
}

pub fn total_in<'a>(
    donations: impl IntoIterator<Item = &'a Donation>,
    range: &DateRange,
    ctx: &FilterContext,
) -> Money {
    donations
        .into_iter()
        .filter(|d| range.contains(d.date, ctx))
        .map(|d| d.amount)
        .sum()
}

pub fn monthly_total<'a>(
    donations: impl IntoIterator<Item = &'a Donation>,
    year: i32,
    month: u32,
) -> Money {
    donations
        .into_iter()
        .filter(|d| d.date.is_some_and(|date| date.year() == year && date.month() == month))
        .map(|d| d.amount)
        .sum()
}

pub fn yearly_total<'a>(donations: impl IntoIterator<Item = &'a Donation>, year: i32) -> Money {
    donations
        .into_iter()
        .filter(|d| d.date.is_some_and(|date| date.year() == year))
        .map(|d| d.amount)
        .sum()
}

fn group_by<'a, K: Ord>(
    donations: impl IntoIterator<Item = &'a Donation>,
    key: impl Fn(&Donation) -> Option<K>,
) -> BTreeMap<K, Money> {
    let mut groups = BTreeMap::new();
    for d in donations {
        if let Some(k) = key(d) {
            *groups.entry(k).or_insert(Money::ZERO) += d.amount;
        }
    }
    groups
}

pub fn by_type<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> BTreeMap<String, Money> {
    group_by(donations, |d| Some(d.donation_type.clone()))
}

pub fn by_method<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> BTreeMap<String, Money> {
    group_by(donations, |d| Some(d.method.clone()))
}

pub fn by_fund<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> BTreeMap<String, Money> {
    group_by(donations, |d| Some(d.fund.clone()))
}

/// Undated donations are left out.
pub fn by_year<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> BTreeMap<i32, Money> {
    group_by(donations, |d| d.date.map(|date| date.year()))
}

/// Twelve `(month, total)` pairs for `year`, January first.
pub fn monthly_breakdown<'a>(
    donations: impl IntoIterator<Item = &'a Donation>,
    year: i32,
) -> Vec<(u32, Money)> {
    let mut months = [Money::ZERO; 12];
    for d in donations {
        if let Some(date) = d.date.filter(|date| date.year() == year) {
            months[date.month0() as usize] += d.amount;
        }
    }
    months
        .iter()
        .enumerate()
        .map(|(i, m)| (i as u32 + 1, *m))
        .collect()
}

/// Group-by map sorted amount-descending, ties by key.
pub fn ranked<K: Ord + Clone>(groups: &BTreeMap<K, Money>) -> Vec<(K, Money)> {
    let mut entries: Vec<(K, Money)> = groups.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonorTotal {
    pub name: String,
    pub amount: Money,
    pub count: usize,
}

/// The `n` largest donors by total given. Anonymous gifts are excluded.
pub fn top_donors<'a>(
    donations: impl IntoIterator<Item = &'a Donation>,
    n: usize,
) -> Vec<DonorTotal> {
    let mut donors: HashMap<String, DonorTotal> = HashMap::new();
    for d in donations.into_iter().filter(|d| !d.anonymous) {
        let entry = donors.entry(d.donor_key()).or_insert_with(|| DonorTotal {
            name: d.donor_name.clone(),
            amount: Money::ZERO,
            count: 0,
        });
        entry.amount += d.amount;
        entry.count += 1;
    }
    let mut ranked: Vec<DonorTotal> = donors.into_values().collect();
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(n);
    ranked
}

pub fn unique_donors<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> usize {
    donations
        .into_iter()
        .map(Donation::donor_key)
        .collect::<HashSet<_>>()
        .len()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationOverview {
    pub total: Money,
    pub this_month: Money,
    pub average: Money,
    pub count: usize,
    pub unique_donors: usize,
}

pub fn donation_overview(donations: &[Donation], today: NaiveDate) -> DonationOverview {
    let total = total(donations);
    DonationOverview {
        total,
        this_month: monthly_total(donations, today.year(), today.month()),
        average: total.average(donations.len()),
        count: donations.len(),
        unique_donors: unique_donors(donations),
    }
}

/// Fundraising targets, configured in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goals {
    pub monthly: Money,
    pub annual: Money,
    pub building_fund: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub label: &'static str,
    pub raised: Money,
    pub goal: Money,
    /// Capped at 100.
    pub percent: f64,
}

impl GoalProgress {
    fn new(label: &'static str, raised: Money, goal: Money) -> Self {
        GoalProgress {
            label,
            raised,
            goal,
            percent: raised.percent_of(goal),
        }
    }
}

/// Monthly, annual and building-fund progress as of `today`.
pub fn goal_progress(donations: &[Donation], goals: &Goals, today: NaiveDate) -> Vec<GoalProgress> {
    let building: Money = donations
        .iter()
        .filter(|d| d.donation_type == BUILDING_TYPE)
        .map(|d| d.amount)
        .sum();
    vec![
        GoalProgress::new(
            "Monthly Goal",
            monthly_total(donations, today.year(), today.month()),
            goals.monthly,
        ),
        GoalProgress::new("Annual Goal", yearly_total(donations, today.year()), goals.annual),
        GoalProgress::new("Building Fund", building, goals.building_fund),
    ]
}

// Members

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    pub total: usize,
    pub active: usize,
    pub new_this_month: usize,
    /// Distinct non-empty family names.
    pub families: usize,
}

pub fn member_stats(members: &[Member], today: NaiveDate) -> MemberStats {
    let this_month = month_start(today);
    MemberStats {
        total: members.len(),
        active: members.iter().filter(|m| m.membership_status == "Active").count(),
        new_this_month: members
            .iter()
            .filter(|m| m.date_joined.is_some_and(|d| month_start(d) == this_month))
            .count(),
        families: members
            .iter()
            .filter(|m| !m.family_name.is_empty())
            .map(|m| m.family_name.as_str())
            .collect::<HashSet<_>>()
            .len(),
    }
}

pub fn joined_by_year(members: &[Member]) -> BTreeMap<i32, usize> {
    let mut years = BTreeMap::new();
    for year in members.iter().filter_map(|m| m.date_joined.map(|d| d.year())) {
        *years.entry(year).or_insert(0) += 1;
    }
    years
}

// Events

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total: usize,
    pub upcoming: usize,
    pub this_month: usize,
    /// Rounded mean over events that recorded any attendance.
    pub average_attendance: usize,
}

pub fn event_stats(events: &[Event], today: NaiveDate) -> EventStats {
    let this_month = month_start(today);
    let attended: Vec<usize> = events
        .iter()
        .map(Event::attendance)
        .filter(|&n| n > 0)
        .collect();
    let average_attendance = if attended.is_empty() {
        0
    } else {
        let sum: usize = attended.iter().sum();
        (sum as f64 / attended.len() as f64).round() as usize
    };
    EventStats {
        total: events.len(),
        upcoming: events
            .iter()
            .filter(|e| e.start_date.is_some_and(|d| d >= today))
            .count(),
        this_month: events
            .iter()
            .filter(|e| e.start_date.is_some_and(|d| month_start(d) == this_month))
            .count(),
        average_attendance,
    }
}

/// Events attended per member id.
pub fn attendance_by_member(events: &[Event]) -> BTreeMap<RecordId, usize> {
    let mut counts = BTreeMap::new();
    for id in events.iter().flat_map(|e| e.attendees.iter()) {
        *counts.entry(*id).or_insert(0) += 1;
    }
    counts
}

// Ministries

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinistryStats {
    pub total: usize,
    pub active: usize,
    pub volunteers: u32,
    pub leaders: usize,
    /// Events from today through the end of the month.
    pub upcoming_events: usize,
}

pub fn ministry_stats(
    ministries: &[Ministry],
    events: &[Event],
    today: NaiveDate,
) -> MinistryStats {
    let month_end = month_start(today)
        .checked_add_months(chrono::Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(today);
    MinistryStats {
        total: ministries.len(),
        active: ministries.iter().filter(|m| m.is_active).count(),
        volunteers: ministries.iter().map(|m| m.volunteers).sum(),
        leaders: ministries.iter().map(Ministry::leader_count).sum(),
        upcoming_events: events
            .iter()
            .filter(|e| e.start_date.is_some_and(|d| d >= today && d <= month_end))
            .count(),
    }
}

// Home

/// Days ahead counted as "upcoming" on the home page.
pub const HOME_UPCOMING_DAYS: u64 = 30;
pub const HOME_UPCOMING_LIMIT: usize = 5;
pub const ACTIVITY_LIMIT: usize = 10;

/// Headline figures on the home page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    pub total_members: usize,
    pub active_members: usize,
    /// Events from today through [`HOME_UPCOMING_DAYS`] ahead.
    pub upcoming_events: usize,
    pub monthly_donations: Money,
}

pub fn home_stats(
    members: &[Member],
    events: &[Event],
    donations: &[Donation],
    today: NaiveDate,
) -> HomeStats {
    let horizon = today
        .checked_add_days(Days::new(HOME_UPCOMING_DAYS))
        .unwrap_or(NaiveDate::MAX);
    HomeStats {
        total_members: members.len(),
        active_members: members.iter().filter(|m| m.membership_status == "Active").count(),
        upcoming_events: events
            .iter()
            .filter(|e| e.start_date.is_some_and(|d| d >= today && d <= horizon))
            .count(),
        monthly_donations: monthly_total(donations, today.year(), today.month()),
    }
}

/// One line of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub entity: Entity,
    pub record_id: RecordId,
    pub title: String,
    pub date: NaiveDate,
    /// Negative for dates after `today`.
    pub days_ago: i64,
}

/// The newest members, events and donations by position in their
/// collections, merged newest date first. Undated records are skipped.
pub fn recent_activity(
    members: &[Member],
    events: &[Event],
    donations: &[Donation],
    today: NaiveDate,
) -> Vec<Activity> {
    let activity = |entity, record_id, title: String, date: NaiveDate| Activity {
        entity,
        record_id,
        title,
        date,
        days_ago: (today - date).num_days(),
    };

    let mut feed: Vec<Activity> = Vec::new();
    feed.extend(members.iter().rev().take(5).rev().filter_map(|m| {
        let date = m.date_joined?;
        Some(activity(Entity::Member, m.id, format!("New member: {}", m.full_name()), date))
    }));
    feed.extend(events.iter().rev().take(3).rev().filter_map(|e| {
        let date = e.start_date?;
        Some(activity(Entity::Event, e.id, format!("Event scheduled: {}", e.title), date))
    }));
    feed.extend(donations.iter().rev().take(5).rev().filter_map(|d| {
        let date = d.date?;
        let title = format!("Donation received: {} from {}", d.amount, d.public_donor_name());
        Some(activity(Entity::Donation, d.id, title, date))
    }));

    feed.sort_by(|a, b| b.date.cmp(&a.date));
    feed.truncate(ACTIVITY_LIMIT);
    feed
}

/// The next `limit` events on or after `today`, soonest first.
pub fn upcoming_events(events: &[Event], today: NaiveDate, limit: usize) -> Vec<&Event> {
    let mut upcoming: Vec<&Event> = events
        .iter()
        .filter(|e| e.start_date.is_some_and(|d| d >= today))
        .collect();
    upcoming.sort_by(|a, b| {
        (a.start_date, a.start_time.as_str()).cmp(&(b.start_date, b.start_time.as_str()))
    });
    upcoming.truncate(limit);
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_date;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn donation(amount: i64, date: &str, kind: &str) -> Donation {
        Donation {
            amount: Money::from_major(amount),
            date: parse_date(date),
            donation_type: kind.into(),
            ..Default::default()
        }
    }

    fn january() -> Vec<Donation> {
        vec![
            donation(500, "2024-01-05", "tithe"),
            donation(150, "2024-01-10", "offering"),
        ]
    }

    #[test]
    fn test_january_totals() {
        let donations = january();
        let jan = monthly_total(&donations, 2024, 1);
        assert_eq!(jan, Money::from_cents(65_000));
        assert_eq!(jan.to_decimal_string(), "650.00");

        let expected = BTreeMap::from([
            ("offering".to_string(), Money::from_major(150)),
            ("tithe".to_string(), Money::from_major(500)),
        ]);
        assert_eq!(by_type(&donations), expected);
        assert_eq!(monthly_total(&donations, 2024, 2), Money::ZERO);
    }

    #[test]
    fn test_totals_are_repeatable() {
        let donations = january();
        let first = total(&donations);
        let second = total(&donations);
        assert_eq!(first, second);
        assert_eq!(Stats::of(donations.iter().map(|d| d.amount)).sum, first);
    }

    #[test]
    fn test_stats() {
        let stats = Stats::of([
            Money::from_major(10),
            Money::from_major(30),
            Money::from_major(20),
        ]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.average, Money::from_major(20));
        assert_eq!(stats.min, Some(Money::from_major(10)));
        assert_eq!(stats.max, Some(Money::from_major(30)));
        assert_eq!(Stats::of(Vec::new()).average, Money::ZERO);
    }

    #[test]
    fn test_monthly_breakdown_and_by_year() {
        let mut donations = january();
        donations.push(donation(75, "2024-03-01", "offering"));
        donations.push(donation(40, "2023-12-24", "offering"));
        donations.push(Donation::default());

        let months = monthly_breakdown(&donations, 2024);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], (1, Money::from_major(650)));
        assert_eq!(months[2], (3, Money::from_major(75)));
        assert_eq!(
            by_year(&donations),
            BTreeMap::from([(2023, Money::from_major(40)), (2024, Money::from_major(725))])
        );
    }

    #[test]
    fn test_top_donors_excludes_anonymous() {
        let mut a = donation(100, "2024-01-01", "tithe");
        a.donor_id = Some(1);
        a.donor_name = "Ama".into();
        let mut b = a.clone();
        b.amount = Money::from_major(50);
        let mut c = donation(400, "2024-01-02", "offering");
        c.donor_id = Some(2);
        c.donor_name = "Kojo".into();
        c.anonymous = true;
        let mut guest = donation(120, "2024-01-03", "offering");
        guest.donor_name = "Visitor".into();

        let donations = vec![a, b, c, guest];
        let top = top_donors(&donations, 10);
        assert_eq!(
            top,
            vec![
                DonorTotal { name: "Ama".into(), amount: Money::from_major(150), count: 2 },
                DonorTotal { name: "Visitor".into(), amount: Money::from_major(120), count: 1 },
            ]
        );
        assert_eq!(unique_donors(&donations), 3);
        assert_eq!(top_donors(&donations, 1).len(), 1);
    }

    #[test]
    fn test_goal_progress_caps_percent() {
        let mut donations = january();
        donations.push(donation(2_000, "2023-06-01", BUILDING_TYPE));
        let goals = Goals {
            monthly: Money::from_major(500),
            annual: Money::from_major(1_300),
            building_fund: Money::from_major(8_000),
        };
        let progress = goal_progress(&donations, &goals, ymd(2024, 1, 20));
        assert_eq!(progress[0].percent, 100.0);
        assert_eq!(progress[1].percent, 50.0);
        assert_eq!(progress[2].raised, Money::from_major(2_000));
        assert_eq!(progress[2].percent, 25.0);
    }

    #[test]
    fn test_ranked() {
        let ranked = ranked(&by_type(&january()));
        assert_eq!(ranked[0].0, "tithe");
    }

    #[test]
    fn test_member_stats() {
        let members = vec![
            Member {
                membership_status: "Active".into(),
                date_joined: Some(ymd(2024, 5, 2)),
                family_name: "Mensah".into(),
                ..Default::default()
            },
            Member {
                membership_status: "active".into(),
                date_joined: Some(ymd(2023, 5, 2)),
                family_name: "Mensah".into(),
                ..Default::default()
            },
            Member::default(),
        ];
        let stats = member_stats(&members, ymd(2024, 5, 15));
        assert_eq!(
            stats,
            MemberStats { total: 3, active: 1, new_this_month: 1, families: 1 }
        );
        assert_eq!(joined_by_year(&members), BTreeMap::from([(2023, 1), (2024, 1)]));
    }

    #[test]
    fn test_event_stats() {
        let events = vec![
            Event {
                start_date: Some(ymd(2024, 5, 15)),
                attendees: vec![1, 2, 3],
                ..Default::default()
            },
            Event {
                start_date: Some(ymd(2024, 4, 1)),
                attendees: vec![1, 2],
                ..Default::default()
            },
            Event {
                start_date: Some(ymd(2024, 6, 1)),
                ..Default::default()
            },
        ];
        let stats = event_stats(&events, ymd(2024, 5, 15));
        assert_eq!(
            stats,
            EventStats { total: 3, upcoming: 2, this_month: 1, average_attendance: 3 }
        );
        assert_eq!(attendance_by_member(&events)[&1], 2);
    }

    #[test]
    fn test_ministry_stats() {
        let ministries = vec![
            Ministry {
                is_active: true,
                volunteers: 12,
                assistant_leaders: vec!["A".into(), "B".into()],
                ..Default::default()
            },
            Ministry {
                volunteers: 3,
                ..Default::default()
            },
        ];
        let events = vec![
            Event { start_date: Some(ymd(2024, 5, 31)), ..Default::default() },
            Event { start_date: Some(ymd(2024, 6, 1)), ..Default::default() },
        ];
        let stats = ministry_stats(&ministries, &events, ymd(2024, 5, 15));
        assert_eq!(stats.active, 1);
        assert_eq!(stats.volunteers, 15);
        assert_eq!(stats.leaders, 4);
        assert_eq!(stats.upcoming_events, 1);
    }

    fn home_members() -> Vec<Member> {
        (1..=7)
            .map(|i| Member {
                id: i,
                first_name: format!("M{i}"),
                last_name: "Owusu".into(),
                membership_status: (if i % 2 == 0 { "Inactive" } else { "Active" }).into(),
                date_joined: Some(ymd(2024, 5, i as u32)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_home_stats() {
        let events = vec![
            Event { start_date: Some(ymd(2024, 5, 15)), ..Default::default() },
            Event { start_date: Some(ymd(2024, 6, 14)), ..Default::default() },
            Event { start_date: Some(ymd(2024, 6, 15)), ..Default::default() },
            Event { start_date: Some(ymd(2024, 5, 1)), ..Default::default() },
        ];
        let donations = vec![
            donation(500, "2024-05-02", "tithe"),
            donation(150, "2024-04-30", "offering"),
        ];
        let stats = home_stats(&home_members(), &events, &donations, ymd(2024, 5, 15));
        assert_eq!(
            stats,
            HomeStats {
                total_members: 7,
                active_members: 4,
                upcoming_events: 2,
                monthly_donations: Money::from_major(500),
            }
        );
    }

    #[test]
    fn test_recent_activity_merges_newest_first() {
        let events = vec![
            Event {
                id: 20,
                title: "Old".into(),
                start_date: Some(ymd(2024, 1, 1)),
                ..Default::default()
            },
            Event {
                id: 21,
                title: "Retreat".into(),
                start_date: Some(ymd(2024, 5, 20)),
                ..Default::default()
            },
            Event { id: 22, title: "Undated".into(), ..Default::default() },
        ];
        let mut gift = donation(75, "2024-05-14", "offering");
        gift.id = 30;
        gift.donor_name = "Ama".into();

        let feed = recent_activity(&home_members(), &events, &[gift], ymd(2024, 5, 15));
        assert_eq!(feed.len(), 8);
        assert_eq!(feed[0].title, "Event scheduled: Retreat");
        assert_eq!(feed[0].days_ago, -5);
        assert_eq!(feed[1].title, "Donation received: $75.00 from Ama");
        assert_eq!(feed[1].days_ago, 1);
        assert_eq!(feed[2].title, "New member: M7 Owusu");
        // Only the last five members are considered.
        assert!(feed.iter().all(|a| a.title != "New member: M2 Owusu"));
        assert_eq!(feed.last().unwrap().record_id, 20);
    }

    #[test]
    fn test_upcoming_events_soonest_first() {
        let events = vec![
            Event {
                id: 1,
                start_date: Some(ymd(2024, 5, 20)),
                start_time: "19:00".into(),
                ..Default::default()
            },
            Event {
                id: 2,
                start_date: Some(ymd(2024, 5, 20)),
                start_time: "09:00".into(),
                ..Default::default()
            },
            Event { id: 3, start_date: Some(ymd(2024, 5, 10)), ..Default::default() },
            Event { id: 4, start_date: Some(ymd(2024, 5, 16)), ..Default::default() },
        ];
        let ids: Vec<RecordId> = upcoming_events(&events, ymd(2024, 5, 15), 2)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![4, 2]);
    }
}
