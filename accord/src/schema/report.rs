use super::{opt_date_format, Frequency};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in report types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    MemberDirectory,
    MemberDemographics,
    MembershipGrowth,
    InactiveMembers,
    BirthdayAnniversary,
    GivingSummary,
    DonorAnalysis,
    FundPerformance,
    TaxStatements,
    PledgeTracking,
    AttendanceSummary,
    EventCalendar,
    PopularEvents,
    MinistryParticipation,
    EventFeedback,
    #[serde(other)]
    Custom,
}

impl ReportKind {
    pub const ALL: [ReportKind; 15] = [
        ReportKind::MemberDirectory,
        ReportKind::MemberDemographics,
        ReportKind::MembershipGrowth,
        ReportKind::InactiveMembers,
        ReportKind::BirthdayAnniversary,
        ReportKind::GivingSummary,
        ReportKind::DonorAnalysis,
        ReportKind::FundPerformance,
        ReportKind::TaxStatements,
        ReportKind::PledgeTracking,
        ReportKind::AttendanceSummary,
        ReportKind::EventCalendar,
        ReportKind::PopularEvents,
        ReportKind::MinistryParticipation,
        ReportKind::EventFeedback,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::MemberDirectory => "member-directory",
            ReportKind::MemberDemographics => "member-demographics",
            ReportKind::MembershipGrowth => "membership-growth",
            ReportKind::InactiveMembers => "inactive-members",
            ReportKind::BirthdayAnniversary => "birthday-anniversary",
            ReportKind::GivingSummary => "giving-summary",
            ReportKind::DonorAnalysis => "donor-analysis",
            ReportKind::FundPerformance => "fund-performance",
            ReportKind::TaxStatements => "tax-statements",
            ReportKind::PledgeTracking => "pledge-tracking",
            ReportKind::AttendanceSummary => "attendance-summary",
            ReportKind::EventCalendar => "event-calendar",
            ReportKind::PopularEvents => "popular-events",
            ReportKind::MinistryParticipation => "ministry-participation",
            ReportKind::EventFeedback => "event-feedback",
            ReportKind::Custom => "custom",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReportKind::MemberDirectory => "Member Directory",
            ReportKind::MemberDemographics => "Member Demographics",
            ReportKind::MembershipGrowth => "Membership Growth Analysis",
            ReportKind::InactiveMembers => "Inactive Members Report",
            ReportKind::BirthdayAnniversary => "Birthdays & Anniversaries",
            ReportKind::GivingSummary => "Giving Summary Report",
            ReportKind::DonorAnalysis => "Donor Analysis",
            ReportKind::FundPerformance => "Fund Performance Report",
            ReportKind::TaxStatements => "Tax Statements",
            ReportKind::PledgeTracking => "Pledge Tracking Report",
            ReportKind::AttendanceSummary => "Attendance Summary",
            ReportKind::EventCalendar => "Event Calendar",
            ReportKind::PopularEvents => "Popular Events Report",
            ReportKind::MinistryParticipation => "Ministry Participation",
            ReportKind::EventFeedback => "Event Feedback Report",
            ReportKind::Custom => "Custom Report",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|k| k.slug() == wanted)
            .ok_or_else(|| format!("Unknown report type '{s}'"))
    }
}

/// A generated report kept in the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub generated_by: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReport {
    pub id: String,
    pub report_type: ReportKind,
    pub report_name: String,
    pub frequency: Frequency,
    /// Comma separated addresses.
    #[serde(default)]
    pub recipients: String,
    #[serde(
        default,
        with = "opt_date_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    pub next_run: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ScheduledReport {
    /// First run is one interval after `start`, or after `now` without one.
    pub fn new(
        id: String,
        kind: ReportKind,
        frequency: Frequency,
        recipients: impl Into<String>,
        start: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Self {
        let anchor = start.unwrap_or_else(|| now.date_naive());
        ScheduledReport {
            id,
            report_type: kind,
            report_name: kind.name().to_string(),
            frequency,
            recipients: recipients.into(),
            start_date: start,
            next_run: midnight(frequency.advance(anchor)),
            active: true,
        }
    }

    pub fn recipient_list(&self) -> Vec<&str> {
        self.recipients
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && self.next_run <= now
    }

    /// Move `next_run` forward until it lies after `now`.
    pub fn advance_past(&mut self, now: DateTime<Utc>) {
        let mut date = self.next_run.date_naive();
        while midnight(date) <= now {
            let next = self.frequency.advance(date);
            if next <= date {
                break;
            }
            date = next;
        }
        self.next_run = midnight(date);
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_kind_names_and_parse() {
        assert_eq!(ReportKind::ALL.len(), 15);
        assert_eq!("giving-summary".parse::<ReportKind>().unwrap(), ReportKind::GivingSummary);
        assert_eq!(ReportKind::MembershipGrowth.name(), "Membership Growth Analysis");
        assert!("weekly-bulletin".parse::<ReportKind>().is_err());

        let unknown: ReportKind = serde_json::from_str("\"weekly-bulletin\"").unwrap();
        assert_eq!(unknown, ReportKind::Custom);
        assert_eq!(unknown.name(), "Custom Report");
    }

    #[test]
    fn test_schedule_next_run_and_advance() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut schedule = ScheduledReport::new(
            "1".into(),
            ReportKind::GivingSummary,
            Frequency::Monthly,
            "pastor@example.org, treasurer@example.org",
            Some(start),
            now,
        );
        assert_eq!(schedule.next_run, Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap());
        assert_eq!(schedule.recipient_list().len(), 2);
        assert!(!schedule.is_due(now));

        let later = Utc.with_ymd_and_hms(2024, 4, 20, 0, 0, 0).unwrap();
        assert!(schedule.is_due(later));
        schedule.advance_past(later);
        assert_eq!(schedule.next_run, Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap());
    }
}
