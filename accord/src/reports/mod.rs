//! Report generation, history and schedules.
//!
//! Report data is plain JSON so that history entries stay readable by
//! any version of the dashboard, including ones that do not know a kind.

use crate::aggregate::{self, top_donors};
use crate::error::{AccordError, Result};
use crate::money::Money;
use crate::schema::{
    ChurchData, Donation, Event, Frequency, Member, ReportKind, ReportRecord, ScheduledReport,
};
use crate::store::Store;
use crate::validation::{Rule, ValidationErrors, ValueType};
use crate::view::labels;
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Author recorded on generated reports.
pub const GENERATED_BY: &str = "Admin User";

/// Reports listed under "recent".
pub const RECENT_REPORTS: usize = 5;

/// Upcoming birthdays and anniversaries are listed this many days ahead.
pub const CELEBRATION_WINDOW_DAYS: u64 = 30;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn month_year(date: NaiveDate) -> String {
    format!("{} {}", MONTHS[date.month0() as usize], date.year())
}

fn iso(date: Option<NaiveDate>) -> Value {
    date.map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%d").to_string()))
}

fn money_map(groups: BTreeMap<String, Money>) -> Map<String, Value> {
    groups
        .into_iter()
        .map(|(k, v)| (k, json!(v)))
        .collect()
}

/// Data for one report kind as of `today`.
pub fn report_data(kind: ReportKind, data: &ChurchData, today: NaiveDate) -> Value {
    match kind {
        ReportKind::MemberDirectory => member_directory(&data.members),
        ReportKind::MemberDemographics => demographics(&data.members, today),
        ReportKind::MembershipGrowth => growth(&data.members, today.year()),
        ReportKind::InactiveMembers => inactive_members(data),
        ReportKind::BirthdayAnniversary => celebrations(&data.members, today),
        ReportKind::GivingSummary => giving_summary(&data.donations),
        ReportKind::DonorAnalysis => donor_analysis(&data.donations),
        ReportKind::FundPerformance => fund_performance(&data.donations),
        ReportKind::TaxStatements => tax_statements(&data.donations, today.year()),
        ReportKind::AttendanceSummary => attendance_summary(&data.events),
        ReportKind::EventCalendar => event_calendar(&data.events, today),
        ReportKind::PopularEvents => popular_events(&data.events),
        ReportKind::MinistryParticipation => ministry_participation(data),
        ReportKind::PledgeTracking | ReportKind::EventFeedback | ReportKind::Custom => {
            json!({ "message": "Report data not available" })
        }
    }
}

fn member_directory(members: &[Member]) -> Value {
    let entries: Vec<Value> = members
        .iter()
        .map(|m| {
            json!({
                "name": m.full_name(),
                "email": m.email,
                "phone": m.phone,
                "address": format!("{}, {}, {} {}", m.address, m.city, m.state, m.zip_code),
                "status": m.membership_status,
                "joinDate": iso(m.date_joined),
                "ministries": if m.ministries.is_empty() {
                    "None".to_string()
                } else {
                    m.ministries.join(", ")
                },
            })
        })
        .collect();
    json!({
        "totalMembers": members.len(),
        "activeMembers": members.iter().filter(|m| m.membership_status == "Active").count(),
        "members": entries,
    })
}

fn demographics(members: &[Member], today: NaiveDate) -> Value {
    let mut ages: BTreeMap<&str, usize> = ["Under 18", "18-30", "31-50", "51-65", "Over 65"]
        .into_iter()
        .map(|k| (k, 0))
        .collect();
    let mut genders: BTreeMap<String, usize> = ["Male", "Female", "Not Specified"]
        .into_iter()
        .map(|k| (k.to_string(), 0))
        .collect();
    let mut marital: BTreeMap<String, usize> =
        ["Single", "Married", "Divorced", "Widowed", "Not Specified"]
            .into_iter()
            .map(|k| (k.to_string(), 0))
            .collect();

    for m in members {
        if let Some(age) = m.age_on(today) {
            let bucket = match age {
                0..=17 => "Under 18",
                18..=30 => "18-30",
                31..=50 => "31-50",
                51..=65 => "51-65",
                _ => "Over 65",
            };
            *ages.entry(bucket).or_insert(0) += 1;
        }
        let gender = if m.gender.is_empty() { "Not Specified" } else { m.gender.as_str() };
        *genders.entry(gender.to_string()).or_insert(0) += 1;
        let status = if m.marital_status.is_empty() {
            "Not Specified"
        } else {
            m.marital_status.as_str()
        };
        *marital.entry(status.to_string()).or_insert(0) += 1;
    }

    json!({
        "totalMembers": members.len(),
        "ageGroups": ages,
        "genderBreakdown": genders,
        "maritalStatus": marital,
    })
}

fn growth(members: &[Member], year: i32) -> Value {
    let mut counts = [0usize; 12];
    for joined in members.iter().filter_map(|m| m.date_joined) {
        if joined.year() == year {
            counts[joined.month0() as usize] += 1;
        }
    }
    let monthly: Map<String, Value> = MONTHS
        .iter()
        .zip(counts)
        .map(|(name, n)| (name.to_string(), json!(n)))
        .collect();
    let total: usize = counts.iter().sum();
    json!({
        "currentYear": year,
        "monthlyGrowth": monthly,
        "totalNewMembers": total,
        "averageMonthlyGrowth": total as f64 / 12.0,
    })
}

fn inactive_members(data: &ChurchData) -> Value {
    let attendance = aggregate::attendance_by_member(&data.events);
    let entries: Vec<Value> = data
        .members
        .iter()
        .filter(|m| !m.is_active())
        .map(|m| {
            json!({
                "name": m.full_name(),
                "email": m.email,
                "phone": m.phone,
                "status": m.membership_status,
                "joinDate": iso(m.date_joined),
                "eventsAttended": attendance.get(&m.id).copied().unwrap_or(0),
            })
        })
        .collect();
    json!({
        "totalMembers": data.members.len(),
        "inactiveCount": entries.len(),
        "members": entries,
    })
}

/// Next anniversary of `date` on or after `today`; 29 February falls back
/// to 28 February in common years.
fn next_anniversary(date: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let on = |year: i32| {
        NaiveDate::from_ymd_opt(year, date.month(), date.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day() - 1))
    };
    let this_year = on(today.year())?;
    if this_year >= today {
        Some(this_year)
    } else {
        on(today.year() + 1)
    }
}

fn celebrations(members: &[Member], today: NaiveDate) -> Value {
    let horizon = today
        .checked_add_days(Days::new(CELEBRATION_WINDOW_DAYS))
        .unwrap_or(today);
    let collect = |pick: fn(&Member) -> Option<NaiveDate>, count_key: &str| {
        let mut rows: Vec<(NaiveDate, Value)> = members
            .iter()
            .filter_map(|m| {
                let original = pick(m)?;
                let next = next_anniversary(original, today).filter(|d| *d <= horizon)?;
                Some((
                    next,
                    json!({
                        "name": m.full_name(),
                        "date": next.format("%Y-%m-%d").to_string(),
                        count_key: next.year() - original.year(),
                    }),
                ))
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.into_iter().map(|(_, v)| v).collect::<Vec<_>>()
    };
    let birthdays = collect(|m| m.birth_date, "turning");
    let anniversaries = collect(|m| m.anniversary_date, "years");
    json!({
        "windowDays": CELEBRATION_WINDOW_DAYS,
        "upcomingBirthdays": birthdays.len(),
        "upcomingAnniversaries": anniversaries.len(),
        "birthdays": birthdays,
        "anniversaries": anniversaries,
    })
}

fn giving_summary(donations: &[Donation]) -> Value {
    let total = aggregate::total(donations);
    let mut monthly: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for d in donations {
        if let Some(date) = d.date {
            *monthly.entry(crate::schema::month_start(date)).or_insert(Money::ZERO) += d.amount;
        }
    }
    let monthly_giving: Map<String, Value> = monthly
        .into_iter()
        .map(|(month, amount)| (month_year(month), json!(amount)))
        .collect();
    json!({
        "totalGiving": total,
        "totalDonations": donations.len(),
        "averageDonation": total.average(donations.len()),
        "typeBreakdown": money_map(aggregate::by_type(donations)),
        "methodBreakdown": money_map(aggregate::by_method(donations)),
        "monthlyGiving": monthly_giving,
    })
}

fn donor_analysis(donations: &[Donation]) -> Value {
    let all = top_donors(donations, usize::MAX);
    let given: Money = all.iter().map(|d| d.amount).sum();
    json!({
        "uniqueDonors": all.len(),
        "topDonors": all.iter().take(10).collect::<Vec<_>>(),
        "averagePerDonor": given.average(all.len()),
    })
}

fn fund_performance(donations: &[Donation]) -> Value {
    let total = aggregate::total(donations);
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for d in donations {
        *counts.entry(d.fund.as_str()).or_insert(0) += 1;
    }
    let funds: Vec<Value> = aggregate::ranked(&aggregate::by_fund(donations))
        .into_iter()
        .map(|(fund, amount)| {
            let count = counts.get(fund.as_str()).copied().unwrap_or(0);
            json!({
                "fund": labels::fund(&fund),
                "total": amount,
                "donations": count,
                "average": amount.average(count),
                "share": (amount.percent_of(total) * 10.0).round() / 10.0,
            })
        })
        .collect();
    json!({
        "totalGiving": total,
        "fundCount": funds.len(),
        "funds": funds,
    })
}

fn tax_statements(donations: &[Donation], year: i32) -> Value {
    let mut donors: BTreeMap<String, (String, Money, usize)> = BTreeMap::new();
    for d in donations.iter().filter(|d| {
        d.tax_deductible && d.date.is_some_and(|date| date.year() == year)
    }) {
        let entry = donors
            .entry(d.donor_key())
            .or_insert_with(|| (d.donor_name.clone(), Money::ZERO, 0));
        entry.1 += d.amount;
        entry.2 += 1;
    }
    let mut statements: Vec<(String, Money, usize)> = donors.into_values().collect();
    statements.sort_by(|a, b| a.0.cmp(&b.0));
    let total: Money = statements.iter().map(|s| s.1).sum();
    json!({
        "taxYear": year,
        "statementCount": statements.len(),
        "totalDeductible": total,
        "statements": statements
            .into_iter()
            .map(|(name, amount, count)| {
                json!({"donor": name, "donations": count, "totalDeductible": amount})
            })
            .collect::<Vec<_>>(),
    })
}

fn attendance_summary(events: &[Event]) -> Value {
    let attended: Vec<&Event> = events.iter().filter(|e| e.attendance() > 0).collect();
    let total: usize = attended.iter().map(|e| e.attendance()).sum();
    let mut by_type: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for e in &attended {
        by_type.entry(e.event_type.clone()).or_default().push(e.attendance());
    }
    let per_type: Map<String, Value> = by_type
        .into_iter()
        .map(|(kind, counts)| {
            let sum: usize = counts.iter().sum();
            (
                kind,
                json!({
                    "total": sum,
                    "average": sum as f64 / counts.len() as f64,
                    "events": counts.len(),
                }),
            )
        })
        .collect();
    let average = if attended.is_empty() { 0.0 } else { total as f64 / attended.len() as f64 };
    json!({
        "totalEvents": events.len(),
        "eventsWithAttendance": attended.len(),
        "totalAttendance": total,
        "averageAttendance": average,
        "eventTypeAttendance": per_type,
    })
}

fn event_summary(e: &Event) -> Value {
    json!({
        "title": e.title,
        "type": e.event_type,
        "startDate": iso(e.start_date),
        "startTime": e.start_time,
        "venue": labels::venue(&e.venue),
    })
}

fn event_calendar(events: &[Event], today: NaiveDate) -> Value {
    let mut upcoming: Vec<&Event> = events
        .iter()
        .filter(|e| e.start_date.is_some_and(|d| d >= today))
        .collect();
    upcoming.sort_by_key(|e| e.start_date);
    let mut by_month: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
    for e in events {
        if let Some(date) = e.start_date {
            by_month
                .entry(crate::schema::month_start(date))
                .or_default()
                .push(e.title.clone());
        }
    }
    let events_by_month: Map<String, Value> = by_month
        .into_iter()
        .map(|(month, titles)| (month_year(month), json!(titles)))
        .collect();
    json!({
        "totalEvents": events.len(),
        "upcomingEvents": upcoming.into_iter().take(20).map(event_summary).collect::<Vec<_>>(),
        "eventsByMonth": events_by_month,
    })
}

fn popular_events(events: &[Event]) -> Value {
    let mut ranked: Vec<&Event> = events.iter().filter(|e| e.attendance() > 0).collect();
    ranked.sort_by(|a, b| b.attendance().cmp(&a.attendance()).then_with(|| a.title.cmp(&b.title)));
    let rows: Vec<Value> = ranked
        .into_iter()
        .take(10)
        .map(|e| {
            let fill = e
                .max_capacity
                .filter(|&c| c > 0)
                .map(|c| ((e.attendance() as f64 / c as f64) * 1000.0).round() / 10.0);
            json!({
                "title": e.title,
                "type": labels::event_type(&e.event_type),
                "date": iso(e.start_date),
                "attendance": e.attendance(),
                "capacity": e.max_capacity,
                "fillRate": fill,
            })
        })
        .collect();
    json!({ "rankedEvents": rows.len(), "events": rows })
}

fn ministry_participation(data: &ChurchData) -> Value {
    let mut ministries: Vec<_> = data.ministries.iter().collect();
    ministries.sort_by(|a, b| b.volunteers.cmp(&a.volunteers).then_with(|| a.name.cmp(&b.name)));
    let rows: Vec<Value> = ministries
        .iter()
        .map(|m| {
            let open = data
                .volunteer_opportunities
                .iter()
                .filter(|o| o.is_active && o.ministry_id == Some(m.id))
                .count();
            json!({
                "name": m.name,
                "category": labels::ministry_category(&m.category),
                "active": m.is_active,
                "volunteers": m.volunteers,
                "events": m.events,
                "leaders": m.leader_count(),
                "openOpportunities": open,
            })
        })
        .collect();
    json!({
        "totalMinistries": data.ministries.len(),
        "activeMinistries": data.ministries.iter().filter(|m| m.is_active).count(),
        "totalVolunteers": data.ministries.iter().map(|m| m.volunteers).sum::<u32>(),
        "ministries": rows,
    })
}

/// Millisecond timestamp as a string, bumped past ids already in use.
fn next_report_id<'a>(taken: impl Iterator<Item = &'a str> + Clone, now: DateTime<Utc>) -> String {
    let mut id = now.timestamp_millis();
    while taken.clone().any(|t| t == id.to_string()) {
        id += 1;
    }
    id.to_string()
}

/// Run a report and append it to the history.
pub fn generate(
    store: &Store,
    kind: ReportKind,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<ReportRecord> {
    let report = store.update_data(|data| {
        let report = ReportRecord {
            id: next_report_id(data.report_history.iter().map(|r| r.id.as_str()), now),
            name: kind.name().to_string(),
            kind,
            generated_at: now,
            generated_by: GENERATED_BY.to_string(),
            data: report_data(kind, data, today),
        };
        data.report_history.push(report.clone());
        Ok(report)
    })?;
    log::info!("generated report {} ({})", report.id, kind);
    Ok(report)
}

pub fn find<'a>(history: &'a [ReportRecord], id: &str) -> Result<&'a ReportRecord> {
    history
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AccordError::not_found("reportHistory", id))
}

pub fn delete(store: &Store, id: &str) -> Result<ReportRecord> {
    let removed = store.update_data(|data| {
        let index = data
            .report_history
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AccordError::not_found("reportHistory", id))?;
        Ok(data.report_history.remove(index))
    })?;
    log::info!("deleted report {id}");
    Ok(removed)
}

/// The `n` most recently generated reports, newest first.
pub fn recent(history: &[ReportRecord], n: usize) -> Vec<&ReportRecord> {
    let mut sorted: Vec<&ReportRecord> = history.iter().collect();
    sorted.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
    sorted.truncate(n);
    sorted
}

fn check_recipients(recipients: &str) -> Result<()> {
    let rule = Rule::new("Recipient").of(ValueType::Email);
    let list: Vec<&str> = recipients
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect();
    let mut errors = ValidationErrors::new();
    if list.is_empty() {
        errors.add("recipients", "At least one recipient is required");
    }
    for r in list {
        if let Some(message) = rule.check(Some(r)) {
            errors.add("recipients", format!("{message}: {r}"));
        }
    }
    errors.into_result()?;
    Ok(())
}

pub fn schedule(
    store: &Store,
    kind: ReportKind,
    frequency: Frequency,
    recipients: &str,
    start: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<ScheduledReport> {
    check_recipients(recipients)?;
    let scheduled = store.update_data(|data| {
        let id = next_report_id(data.scheduled_reports.iter().map(|s| s.id.as_str()), now);
        let scheduled = ScheduledReport::new(id, kind, frequency, recipients, start, now);
        data.scheduled_reports.push(scheduled.clone());
        Ok(scheduled)
    })?;
    log::info!(
        "scheduled {} {} (next run {})",
        frequency.as_str(),
        kind,
        scheduled.next_run
    );
    Ok(scheduled)
}

pub fn delete_schedule(store: &Store, id: &str) -> Result<ScheduledReport> {
    let removed = store.update_data(|data| {
        let index = data
            .scheduled_reports
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AccordError::not_found("scheduledReports", id))?;
        Ok(data.scheduled_reports.remove(index))
    })?;
    log::info!("deleted schedule {id}");
    Ok(removed)
}

/// Generate every due scheduled report and move its schedule forward.
pub fn run_due(store: &Store, now: DateTime<Utc>, today: NaiveDate) -> Result<Vec<ReportRecord>> {
    let generated = store.update_data(|data| {
        let mut generated = Vec::new();
        let mut offset = 0;
        for i in 0..data.scheduled_reports.len() {
            if !data.scheduled_reports[i].is_due(now) {
                continue;
            }
            let kind = data.scheduled_reports[i].report_type;
            // Distinct ids for reports produced in the same run.
            let stamp = now + chrono::Duration::milliseconds(offset);
            offset += 1;
            let report = ReportRecord {
                id: next_report_id(data.report_history.iter().map(|r| r.id.as_str()), stamp),
                name: kind.name().to_string(),
                kind,
                generated_at: now,
                generated_by: GENERATED_BY.to_string(),
                data: report_data(kind, data, today),
            };
            data.report_history.push(report.clone());
            data.scheduled_reports[i].advance_past(now);
            generated.push(report);
        }
        Ok(generated)
    })?;
    if generated.is_empty() {
        log::debug!("no scheduled reports due");
    } else {
        log::info!("ran {} scheduled report(s)", generated.len());
    }
    Ok(generated)
}
