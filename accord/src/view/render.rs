//! Page fragments and printable documents.
//!
//! Render functions are pure: they take already-filtered records and the
//! settings that affect display, and return a [`Node`]. List views order
//! records most recent first.

use super::labels;
use super::{el, Action, Element, Handler, Node};
use crate::aggregate::{Activity, DonationOverview, GoalProgress, HomeStats};
use crate::filter::{sort_recent_first, week_start_of};
use crate::money::Money;
use crate::schema::{
    Donation, Entity, Event, Member, Ministry, ReportRecord, ScheduledReport, VolunteerOpportunity,
};
use crate::settings::Settings;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde_json::Value;
use std::collections::BTreeMap;

pub const MEMBERS_PER_PAGE: usize = 20;

/// Events listed in one calendar cell before collapsing into "+N more".
pub const EVENTS_PER_DAY: usize = 3;

// Pagination

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// 1-based, clamped to the available pages.
    pub page: usize,
    pub total_pages: usize,
    /// Index range of the page's items.
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

pub fn paginate(total: usize, page: usize, per_page: usize) -> PageInfo {
    let per_page = per_page.max(1);
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * per_page).min(total);
    let end = (start + per_page).min(total);
    PageInfo {
        page,
        total_pages,
        start,
        end,
        total,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// First, last and the two pages either side of `current`; gaps collapse
/// to one ellipsis.
pub fn page_links(current: usize, total_pages: usize) -> Vec<PageLink> {
    let mut links = Vec::new();
    for i in 1..=total_pages {
        if i == 1 || i == total_pages || (i + 2 >= current && i <= current + 2) {
            links.push(PageLink::Page(i));
        } else if i + 3 == current || i == current + 3 {
            links.push(PageLink::Ellipsis);
        }
    }
    links
}

fn pagination(info: &PageInfo, noun: &str) -> Element {
    let shown = if info.total == 0 { 0 } else { info.start + 1 };
    let mut nav = el("div", "pagination").child(el("div", "pagination-info").text(format!(
        "Showing {}-{} of {} {}",
        shown, info.end, info.total, noun
    )));
    let mut pages = el("div", "page-numbers");
    for link in page_links(info.page, info.total_pages) {
        pages = match link {
            PageLink::Page(n) => {
                let mut button = el("button", "page-btn")
                    .on(Handler::click(Action::GoToPage).target(n.to_string()))
                    .text(n.to_string());
                if n == info.page {
                    button = button.class("active");
                }
                pages.child(button)
            }
            PageLink::Ellipsis => pages.child(el("span", "page-ellipsis").text("...")),
        };
    }
    nav = nav.child(pages);
    nav
}

// Shared pieces

/// Placeholder for an empty list with a button to add the first record.
pub fn empty_state(entity: Entity, title: &str, message: &str) -> Node {
    el("div", "empty-state")
        .child(el("h3", "").text(title))
        .child(el("p", "").text(message))
        .child(
            el("button", "btn btn-primary")
                .on(Handler::click(Action::Create(entity)))
                .text(format!("Add {}", entity.label())),
        )
        .into()
}

fn record_actions(entity: Entity, id: i64) -> Element {
    el("div", "card-actions")
        .child(
            el("button", "btn btn-sm btn-secondary")
                .on(Handler::on_record(Action::View(entity), id))
                .text("View"),
        )
        .child(
            el("button", "btn btn-sm btn-primary")
                .on(Handler::on_record(Action::Edit(entity), id))
                .text("Edit"),
        )
        .child(
            el("button", "btn btn-sm btn-danger")
                .on(Handler::on_record(Action::Delete(entity), id))
                .text("Delete"),
        )
}

fn detail_row(label: &str, value: impl Into<String>) -> Element {
    el("div", "detail-row")
        .child(el("span", "detail-label").text(format!("{label}:")))
        .child(el("span", "detail-value").text(value.into()))
}

fn badge(kind: &str, text: impl Into<String>) -> Element {
    el("span", "badge").class(format!("badge-{kind}")).text(text.into())
}

fn date_text(date: Option<NaiveDate>, settings: &Settings) -> String {
    date.map(|d| settings.format_date(d)).unwrap_or_default()
}

/// Labelled figures shown above a list.
pub fn stat_cards(cards: &[(&str, String)]) -> Node {
    el("div", "stats-grid")
        .children(cards.iter().map(|(label, value)| {
            el("div", "stat-card")
                .child(el("div", "stat-number").text(value.clone()))
                .child(el("div", "stat-label").text(*label))
        }))
        .into()
}

// Home

/// `Today`, `3 days ago`, `In 5 days`; a plain date past thirty days.
pub fn relative_day(days_ago: i64, date: NaiveDate, settings: &Settings) -> String {
    match days_ago {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        -1 => "Tomorrow".to_string(),
        2..=29 => format!("{days_ago} days ago"),
        -29..=-2 => format!("In {} days", -days_ago),
        _ => settings.format_date(date),
    }
}

fn activity_item(activity: &Activity, settings: &Settings) -> Element {
    let icon = match activity.entity {
        Entity::Member => "user-plus",
        Entity::Event => "calendar-plus",
        Entity::Donation => "hand-holding-usd",
        Entity::Ministry | Entity::Opportunity => "hands-helping",
    };
    el("div", "activity-item")
        .on(Handler::on_record(Action::View(activity.entity), activity.record_id))
        .child(
            el("div", "activity-icon")
                .class(activity.entity.slug())
                .attr("data-icon", icon),
        )
        .child(
            el("div", "activity-content")
                .child(el("div", "activity-title").text(activity.title.as_str()))
                .child(el("div", "activity-time").text(relative_day(
                    activity.days_ago,
                    activity.date,
                    settings,
                ))),
        )
}

fn upcoming_item(event: &Event) -> Element {
    let (day, month) = event
        .start_date
        .map(|d| (d.day().to_string(), d.format("%b").to_string()))
        .unwrap_or_default();
    el("div", "event-item")
        .on(Handler::on_record(Action::View(Entity::Event), event.id))
        .child(
            el("div", "event-date")
                .child(el("div", "day").text(day))
                .child(el("div", "month").text(month)),
        )
        .child(
            el("div", "event-info")
                .child(el("div", "event-title").text(event.title.as_str()))
                .child(
                    el("div", "event-details")
                        .child(el("span", "").text(labels::time_of_day(&event.start_time)))
                        .child(el("span", "").text(labels::venue(&event.venue))),
                ),
        )
}

/// Headline figures, the activity feed and the next few events.
pub fn home_page(
    stats: &HomeStats,
    activity: &[Activity],
    upcoming: &[&Event],
    settings: &Settings,
) -> Node {
    let cards = stat_cards(&[
        ("Total Members", stats.total_members.to_string()),
        ("Upcoming Events", stats.upcoming_events.to_string()),
        ("This Month's Donations", stats.monthly_donations.to_string()),
        ("Active Members", stats.active_members.to_string()),
    ]);

    let feed: Node = if activity.is_empty() {
        el("div", "empty-state")
            .child(el("h3", "").text("No Recent Activities"))
            .child(el("p", "").text("Activities will appear here as you use the system."))
            .into()
    } else {
        el("div", "activity-list")
            .children(activity.iter().map(|a| activity_item(a, settings)))
            .into()
    };

    let events: Node = if upcoming.is_empty() {
        empty_state(
            Entity::Event,
            "No Upcoming Events",
            "Schedule events to see them here.",
        )
    } else {
        el("div", "upcoming-events")
            .children(upcoming.iter().map(|e| upcoming_item(e)))
            .into()
    };

    Node::Fragment(vec![
        cards,
        el("section", "recent-activities")
            .child(el("h2", "").text("Recent Activities"))
            .child(feed)
            .into(),
        el("section", "upcoming-events-panel")
            .child(el("h2", "").text("Upcoming Events"))
            .child(events)
            .into(),
    ])
}

// Members

pub fn member_card(member: &Member, settings: &Settings) -> Element {
    let status = member.membership_status.to_lowercase();
    let mut card = el("div", "member-card")
        .attr("data-member-id", member.id.to_string())
        .child(el("div", "member-avatar").text(member.initials()))
        .child(
            el("div", "member-info")
                .child(el("h3", "member-name").text(member.full_name()))
                .child(el("p", "member-email").text(member.email.as_str()))
                .child(el("p", "member-phone").text(member.phone.as_str())),
        )
        .child(badge(&status, member.membership_status.as_str()));
    if !member.ministries.is_empty() {
        card = card.child(el("div", "member-ministries").children(
            member
                .ministries
                .iter()
                .map(|m| el("span", "ministry-tag").text(labels::member_ministry(m))),
        ));
    }
    if let Some(joined) = member.date_joined {
        card = card.child(
            el("p", "member-joined").text(format!("Joined {}", settings.format_date(joined))),
        );
    }
    card.child(record_actions(Entity::Member, member.id))
}

pub fn member_details(member: &Member, settings: &Settings) -> Node {
    let mut details = el("div", "member-details")
        .child(el("div", "member-avatar").text(member.initials()))
        .child(el("h3", "member-name").text(member.full_name()))
        .child(badge(
            &member.membership_status.to_lowercase(),
            member.membership_status.as_str(),
        ));
    for (label, value) in [
        ("Email", member.email.as_str()),
        ("Phone", member.phone.as_str()),
        ("Mobile", member.mobile_phone.as_str()),
        ("Address", member.address.as_str()),
        ("City", member.city.as_str()),
        ("Emergency Contact", member.emergency_contact.as_str()),
        ("Occupation", member.occupation.as_str()),
    ] {
        if !value.is_empty() {
            details = details.child(detail_row(label, value));
        }
    }
    for (label, date) in [
        ("Birth Date", member.birth_date),
        ("Date Joined", member.date_joined),
        ("Baptism Date", member.baptism_date),
    ] {
        if date.is_some() {
            details = details.child(detail_row(label, date_text(date, settings)));
        }
    }
    if !member.ministries.is_empty() {
        let names: Vec<String> =
            member.ministries.iter().map(|m| labels::member_ministry(m)).collect();
        details = details.child(detail_row("Ministries", names.join(", ")));
    }
    if !member.member_notes.is_empty() {
        details = details.child(detail_row("Notes", member.member_notes.as_str()));
    }
    details.into()
}

/// One page of member cards with pagination controls.
pub fn member_cards(members: &[&Member], page: usize, settings: &Settings) -> Node {
    if members.is_empty() {
        return empty_state(
            Entity::Member,
            "No members found",
            "Try adjusting your search or filters, or add a new member.",
        );
    }
    let info = paginate(members.len(), page, MEMBERS_PER_PAGE);
    Node::Fragment(vec![
        el("div", "members-grid")
            .children(members[info.start..info.end].iter().map(|m| member_card(m, settings)))
            .into(),
        pagination(&info, "members").into(),
    ])
}

// Events

pub fn event_card(event: &Event, settings: &Settings) -> Element {
    let when = match (event.start_date, event.start_time.is_empty()) {
        (Some(d), false) => format!(
            "{} at {}",
            settings.format_date(d),
            labels::time_of_day(&event.start_time)
        ),
        (Some(d), true) => settings.format_date(d),
        (None, _) => "Date to be announced".to_string(),
    };
    let mut card = el("div", "event-card")
        .attr("data-event-id", event.id.to_string())
        .child(
            el("div", "event-icon")
                .attr("data-icon", labels::event_icon(&event.event_type))
                .text(labels::event_type(&event.event_type)),
        )
        .child(el("h3", "event-title").text(event.title.as_str()))
        .child(el("p", "event-when").text(when))
        .child(el("p", "event-venue").text(labels::venue(&event.venue)));
    if !event.description.is_empty() {
        card = card.child(el("p", "event-description").text(event.description.as_str()));
    }
    let mut footer = el("div", "event-meta").child(el("span", "attendance").text(format!(
        "{} attending",
        event.attendance()
    )));
    if let Some(cap) = event.max_capacity.filter(|&c| c > 0) {
        footer = footer.child(el("span", "capacity").text(format!("Capacity {cap}")));
    }
    if !event.status.is_empty() {
        footer = footer.child(badge(&event.status, event.status.as_str()));
    }
    card.child(footer)
        .child(
            record_actions(Entity::Event, event.id).child(
                el("button", "btn btn-sm btn-secondary")
                    .on(Handler::on_record(Action::DuplicateEvent, event.id))
                    .text("Duplicate"),
            ),
        )
}

pub fn event_details(event: &Event, settings: &Settings) -> Node {
    let mut details = el("div", "event-details")
        .child(detail_row("Type", labels::event_type(&event.event_type)))
        .child(detail_row("Date", date_text(event.start_date, settings)));
    if !event.start_time.is_empty() {
        let mut time = labels::time_of_day(&event.start_time);
        if !event.end_time.is_empty() {
            time = format!("{time} - {}", labels::time_of_day(&event.end_time));
        }
        details = details.child(detail_row("Time", time));
    }
    details = details.child(detail_row("Venue", labels::venue(&event.venue)));
    if let Some(rule) = event.recurrence() {
        details = details.child(detail_row("Repeats", labels::frequency(rule.frequency.as_str())));
    }
    if !event.primary_organizer.is_empty() {
        details = details.child(detail_row("Organizer", event.primary_organizer.as_str()));
    }
    if !event.description.is_empty() {
        details = details.child(el("p", "event-description").text(event.description.as_str()));
    }
    details
        .child(detail_row("Attendance", event.attendance().to_string()))
        .into()
}

pub fn event_list(events: &[&Event], settings: &Settings) -> Node {
    if events.is_empty() {
        return empty_state(
            Entity::Event,
            "No events found",
            "Try adjusting your filters or create a new event.",
        );
    }
    let mut sorted = events.to_vec();
    sort_recent_first(&mut sorted);
    el("div", "events-list")
        .children(sorted.into_iter().map(|e| event_card(e, settings)))
        .into()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// Month grid starting on `week_start`, padded with days of the adjacent
/// months. Recurring events appear on every occurrence.
pub fn event_calendar(
    events: &[&Event],
    year: i32,
    month: u32,
    week_start: Weekday,
    today: NaiveDate,
) -> Node {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return el("div", "calendar").into();
    };
    let last = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(first);
    let grid_start = week_start_of(first, week_start);
    let grid_end = week_start_of(last, week_start)
        .checked_add_days(Days::new(6))
        .unwrap_or(last);

    let mut by_day: BTreeMap<NaiveDate, Vec<&Event>> = BTreeMap::new();
    for &event in events {
        for date in event.occurrences_between(grid_start, grid_end) {
            by_day.entry(date).or_default().push(event);
        }
    }

    let mut header = el("div", "calendar-header");
    let mut day = week_start;
    for _ in 0..7 {
        header = header.child(el("div", "calendar-weekday").text(weekday_name(day)));
        day = day.succ();
    }

    let mut grid = el("div", "calendar-grid");
    let mut date = grid_start;
    while date <= grid_end {
        let mut cell = el("div", "calendar-day")
            .on(Handler::click(Action::ShowDay).target(date.format("%Y-%m-%d").to_string()))
            .child(el("div", "day-number").text(date.day().to_string()));
        if date.month() != month {
            cell = cell.class("other-month");
        }
        if date == today {
            cell = cell.class("today");
        }
        if let Some(day_events) = by_day.get(&date) {
            for event in day_events.iter().take(EVENTS_PER_DAY) {
                cell = cell.child(
                    el("div", "calendar-event")
                        .class(format!("event-{}", event.event_type))
                        .on(Handler::on_record(Action::View(Entity::Event), event.id))
                        .text(event.title.as_str()),
                );
            }
            if day_events.len() > EVENTS_PER_DAY {
                let hidden = day_events.len() - EVENTS_PER_DAY;
                cell = cell.child(el("div", "more-events").text(format!("+{hidden} more")));
            }
        }
        grid = grid.child(cell);
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    el("div", "calendar")
        .child(el("h3", "calendar-title").text(first.format("%B %Y").to_string()))
        .child(header)
        .child(grid)
        .into()
}

// Donations

pub fn donation_item(donation: &Donation, settings: &Settings) -> Element {
    el("div", "donation-item")
        .attr("data-donation-id", donation.id.to_string())
        .child(
            el("div", "donation-info")
                .child(el("h4", "donor-name").text(donation.public_donor_name()))
                .child(el("p", "donation-meta").text(format!(
                    "{} • {} • {}",
                    labels::donation_type(&donation.donation_type),
                    labels::payment_method(&donation.method),
                    date_text(donation.date, settings)
                ))),
        )
        .child(el("div", "donation-amount").text(donation.amount.to_string()))
        .child(
            record_actions(Entity::Donation, donation.id).child(
                el("button", "btn btn-sm btn-info")
                    .on(Handler::on_record(Action::PrintReceipt, donation.id))
                    .text("Receipt"),
            ),
        )
}

pub fn donation_list(donations: &[&Donation], settings: &Settings) -> Node {
    if donations.is_empty() {
        return empty_state(
            Entity::Donation,
            "No donations found",
            "Try adjusting your filters or record a new donation.",
        );
    }
    let mut sorted = donations.to_vec();
    sort_recent_first(&mut sorted);
    el("div", "donations-list")
        .children(sorted.into_iter().map(|d| donation_item(d, settings)))
        .into()
}

/// Overview figures, goal bars and the per-type breakdown.
pub fn donation_summary(
    overview: &DonationOverview,
    goals: &[GoalProgress],
    by_type: &[(String, Money)],
) -> Node {
    let cards = stat_cards(&[
        ("Total Donations", overview.total.to_string()),
        ("This Month", overview.this_month.to_string()),
        ("Average Donation", overview.average.to_string()),
        ("Unique Donors", overview.unique_donors.to_string()),
    ]);
    let goal_bars = el("div", "goals").children(goals.iter().map(|g| {
        el("div", "goal")
            .child(el("div", "goal-label").text(g.label))
            .child(
                el("div", "progress-bar").child(
                    el("div", "progress-fill").attr("style", format!("width: {:.0}%", g.percent)),
                ),
            )
            .child(el("div", "goal-amounts").text(format!("{} of {}", g.raised, g.goal)))
    }));
    let breakdown = el("div", "summary-list").children(by_type.iter().map(|(kind, amount)| {
        el("div", "summary-item")
            .child(el("span", "summary-item-label").text(labels::donation_type(kind)))
            .child(el("span", "summary-item-value").text(amount.to_string()))
    }));
    Node::Fragment(vec![cards, goal_bars.into(), breakdown.into()])
}

pub fn donation_details(donation: &Donation, settings: &Settings) -> Node {
    let mut details = el("div", "donation-details")
        .child(el("div", "amount").text(donation.amount.to_string()))
        .child(detail_row("Donor", donation.public_donor_name()))
        .child(detail_row("Date", date_text(donation.date, settings)))
        .child(detail_row("Type", labels::donation_type(&donation.donation_type)))
        .child(detail_row("Method", labels::payment_method(&donation.method)))
        .child(detail_row("Fund", labels::fund(&donation.fund)));
    for (label, value) in [
        ("Purpose", &donation.purpose),
        ("Check Number", &donation.check_number),
        ("Transaction ID", &donation.transaction_id),
        ("Notes", &donation.notes),
    ] {
        if !value.is_empty() {
            details = details.child(detail_row(label, value.as_str()));
        }
    }
    if let Some(guest) = &donation.guest_donor {
        if !guest.email.is_empty() {
            details = details.child(detail_row("Guest Email", guest.email.as_str()));
        }
    }
    details
        .child(detail_row(
            "Tax Deductible",
            if donation.tax_deductible { "Yes" } else { "No" },
        ))
        .child(
            el("button", "btn btn-info")
                .on(Handler::on_record(Action::PrintReceipt, donation.id))
                .text("Print Receipt"),
        )
        .into()
}

// Ministries

pub fn ministry_card(ministry: &Ministry) -> Element {
    let mut card = el("div", "ministry-card")
        .attr("data-ministry-id", ministry.id.to_string())
        .child(el("h3", "ministry-name").text(ministry.name.as_str()))
        .child(badge(&ministry.category, labels::ministry_category(&ministry.category)));
    if !ministry.is_active {
        card = card.child(badge("inactive", "Inactive"));
    }
    card.child(el("p", "ministry-description").text(ministry.description.as_str()))
        .child(detail_row(
            "Meets",
            labels::meeting_schedule(&ministry.meeting_day, &ministry.meeting_time),
        ))
        .child(detail_row("Location", labels::venue(&ministry.location)))
        .child(detail_row("Leader", ministry.leader.as_str()))
        .child(
            el("div", "ministry-stats")
                .child(el("span", "").text(format!("{} volunteers", ministry.volunteers)))
                .child(el("span", "").text(format!("{} events", ministry.events))),
        )
        .child(record_actions(Entity::Ministry, ministry.id))
}

pub fn ministry_grid(ministries: &[&Ministry]) -> Node {
    if ministries.is_empty() {
        return empty_state(
            Entity::Ministry,
            "No ministries found",
            "Create a ministry to start organising volunteers.",
        );
    }
    el("div", "ministries-grid")
        .children(ministries.iter().map(|m| ministry_card(m)))
        .into()
}

pub fn opportunity_list(opportunities: &[&VolunteerOpportunity]) -> Node {
    if opportunities.is_empty() {
        return empty_state(
            Entity::Opportunity,
            "No volunteer opportunities",
            "Post an opportunity so members can get involved.",
        );
    }
    el("div", "opportunities-list")
        .children(opportunities.iter().map(|o| {
            let needed = o
                .volunteers_needed
                .map(|n| format!("{n} needed"))
                .unwrap_or_default();
            let mut item = el("div", "opportunity-item")
                .child(el("h4", "opportunity-title").text(o.title.as_str()))
                .child(el("p", "opportunity-ministry").text(o.ministry_name.as_str()))
                .child(el("p", "opportunity-description").text(o.description.as_str()))
                .child(
                    el("div", "opportunity-meta")
                        .child(el("span", "").text(labels::time_commitment(&o.time_commitment)))
                        .child(el("span", "").text(needed)),
                );
            if o.background_check_required {
                item = item.child(badge("warning", "Background check required"));
            }
            item.child(record_actions(Entity::Opportunity, o.id))
        }))
        .into()
}

pub fn ministry_details(ministry: &Ministry) -> Node {
    let mut details = el("div", "ministry-details")
        .child(detail_row("Category", labels::ministry_category(&ministry.category)))
        .child(detail_row(
            "Meets",
            labels::meeting_schedule(&ministry.meeting_day, &ministry.meeting_time),
        ))
        .child(detail_row("Location", labels::venue(&ministry.location)))
        .child(detail_row("Leader", ministry.leader.as_str()));
    if !ministry.assistant_leaders.is_empty() {
        details = details.child(detail_row("Assistants", ministry.assistant_leaders.join(", ")));
    }
    if !ministry.contact_email.is_empty() {
        details = details.child(detail_row("Contact", ministry.contact_email.as_str()));
    }
    details
        .child(detail_row("Annual Budget", ministry.annual_budget.to_string()))
        .child(detail_row("Volunteers", ministry.volunteers.to_string()))
        .child(el("p", "ministry-description").text(ministry.description.as_str()))
        .into()
}

pub fn opportunity_details(opportunity: &VolunteerOpportunity) -> Node {
    let needed = opportunity
        .volunteers_needed
        .map(|n| n.to_string())
        .unwrap_or_else(|| "Any".to_string());
    el("div", "opportunity-details")
        .child(detail_row("Ministry", opportunity.ministry_name.as_str()))
        .child(detail_row(
            "Commitment",
            labels::time_commitment(&opportunity.time_commitment),
        ))
        .child(detail_row("Volunteers Needed", needed))
        .child(detail_row("Skills", opportunity.skills_required.as_str()))
        .child(detail_row(
            "Background Check",
            if opportunity.background_check_required { "Required" } else { "Not required" },
        ))
        .child(el("p", "opportunity-description").text(opportunity.description.as_str()))
        .into()
}

// Reports

/// `averageMonthlyGrowth` → `Average Monthly Growth`.
pub fn humanize(key: &str) -> String {
    let mut out = String::new();
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else if ch == '_' || ch == '-' {
            out.push(' ');
        } else {
            out.push(ch);
        }
    }
    out
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => (if *b { "Yes" } else { "No" }).to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() != 0.0 => format!("{f:.2}"),
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn table(headers: &[String], rows: Vec<Vec<String>>) -> Element {
    el("table", "report-table")
        .child(el("thead", "").child(
            el("tr", "").children(headers.iter().map(|h| el("th", "").text(humanize(h)))),
        ))
        .child(el("tbody", "").children(rows.into_iter().map(|row| {
            el("tr", "").children(row.into_iter().map(|cell| el("td", "").text(cell)))
        })))
}

fn value_section(key: &str, value: &Value) -> Element {
    let section = el("div", "report-section").child(el("h3", "").text(humanize(key)));
    match value {
        Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
            let headers: Vec<String> = items[0]
                .as_object()
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default();
            let rows = items
                .iter()
                .map(|item| headers.iter().map(|h| scalar_text(&item[h.as_str()])).collect())
                .collect();
            section.child(table(&headers, rows))
        }
        Value::Array(items) => section.child(
            el("ul", "").children(items.iter().map(|i| el("li", "").text(scalar_text(i)))),
        ),
        Value::Object(map) if map.values().all(Value::is_object) && !map.is_empty() => {
            let mut headers = vec![String::new()];
            for inner in map.values().filter_map(Value::as_object) {
                for k in inner.keys() {
                    if !headers.contains(k) {
                        headers.push(k.clone());
                    }
                }
            }
            let rows = map
                .iter()
                .map(|(name, inner)| {
                    let mut row = vec![name.clone()];
                    row.extend(headers[1..].iter().map(|h| scalar_text(&inner[h.as_str()])));
                    row
                })
                .collect();
            section.child(table(&headers, rows))
        }
        Value::Object(map) => section.child(el("div", "summary-list").children(map.iter().map(
            |(k, v)| {
                el("div", "summary-item")
                    .child(el("span", "summary-item-label").text(k.as_str()))
                    .child(el("span", "summary-item-value").text(scalar_text(v)))
            },
        ))),
        scalar => section.child(el("div", "summary-number").text(scalar_text(scalar))),
    }
}

/// A generated report: headline figures first, then one section per
/// table-like entry.
pub fn report_view(report: &ReportRecord) -> Node {
    let mut summary = el("div", "report-summary");
    let mut sections = Vec::new();
    match &report.data {
        Value::Object(map) => {
            for (key, value) in map {
                if value.is_object() || value.is_array() {
                    sections.push(value_section(key, value));
                } else {
                    summary = summary.child(
                        el("div", "summary-card")
                            .child(el("div", "summary-number").text(scalar_text(value)))
                            .child(el("div", "summary-label").text(humanize(key))),
                    );
                }
            }
        }
        other => sections.push(value_section("data", other)),
    }
    el("div", "report-view")
        .child(
            el("div", "report-header")
                .child(el("h2", "").text(report.name.as_str()))
                .child(el("p", "report-meta").text(format!(
                    "Generated {} by {}",
                    report.generated_at.format("%Y-%m-%d %H:%M UTC"),
                    report.generated_by
                ))),
        )
        .child(summary)
        .children(sections)
        .into()
}

/// The `limit` most recently generated reports.
pub fn report_history(history: &[ReportRecord], limit: usize) -> Node {
    if history.is_empty() {
        return el("div", "empty-state")
            .child(el("p", "").text("No reports generated yet"))
            .into();
    }
    let mut recent: Vec<&ReportRecord> = history.iter().collect();
    recent.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
    el("div", "recent-reports")
        .children(recent.into_iter().take(limit).map(|r| {
            el("div", "report-item")
                .child(el("h4", "").text(r.name.as_str()))
                .child(el("p", "").text(r.generated_at.format("%Y-%m-%d %H:%M").to_string()))
                .child(
                    el("button", "btn btn-sm btn-secondary")
                        .on(Handler::click(Action::ViewReport).target(r.id.as_str()))
                        .text("View"),
                )
                .child(
                    el("button", "btn btn-sm btn-primary")
                        .on(Handler::click(Action::DownloadReport).target(r.id.as_str()))
                        .text("Download"),
                )
                .child(
                    el("button", "btn btn-sm btn-danger")
                        .on(Handler::click(Action::DeleteReport).target(r.id.as_str()))
                        .text("Delete"),
                )
        }))
        .into()
}

pub fn scheduled_reports(schedules: &[ScheduledReport]) -> Node {
    if schedules.is_empty() {
        return el("div", "empty-state")
            .child(el("p", "").text("No scheduled reports"))
            .into();
    }
    el("div", "scheduled-reports")
        .children(schedules.iter().map(|s| {
            let recipients = s.recipient_list().len();
            el("div", "scheduled-item")
                .child(el("h4", "").text(s.report_name.as_str()))
                .child(el("p", "").text(format!(
                    "{} • Next run {} • {} recipient{}",
                    labels::frequency(s.frequency.as_str()),
                    s.next_run.format("%Y-%m-%d"),
                    recipients,
                    if recipients == 1 { "" } else { "s" }
                )))
                .child(
                    el("button", "btn btn-sm btn-danger")
                        .on(Handler::click(Action::DeleteSchedule).target(s.id.as_str()))
                        .text("Delete"),
                )
        }))
        .into()
}

// Printable documents

const RECEIPT_CSS: &str = "body { font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;
  padding: 20px; }
.header { text-align: center; border-bottom: 2px solid #333; padding-bottom: 20px;
  margin-bottom: 20px; }
.amount { font-size: 2rem; font-weight: bold; color: #27ae60; text-align: center; margin: 20px 0; }
.details { margin: 20px 0; }
.detail-row { display: flex; justify-content: space-between; margin: 10px 0; }
.footer { margin-top: 40px; text-align: center; font-size: 0.9rem; color: #666; }
@media print { body { margin: 0; } }";

const REPORT_CSS: &str = "body { font-family: Arial, sans-serif; margin: 20px; color: #333; }
.report-header { border-bottom: 2px solid #333; margin-bottom: 20px; }
.report-summary { display: flex; flex-wrap: wrap; gap: 16px; margin-bottom: 20px; }
.summary-card { border: 1px solid #ddd; padding: 12px; min-width: 140px; text-align: center; }
.summary-number { font-size: 1.5rem; font-weight: bold; }
.report-table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
.report-table th, .report-table td { border: 1px solid #ddd; padding: 6px; text-align: left; }
@media print { body { margin: 0; } .btn { display: none; } }";

fn document(title: &str, css: &str, body: Vec<Node>) -> String {
    let html: Node = Element::new("html")
        .attr("lang", "en")
        .child(
            Element::new("head")
                .child(Element::new("meta").attr("charset", "utf-8"))
                .child(Element::new("title").text(title))
                .child(Element::new("style").attr("media", "all").text(css)),
        )
        .child(Element::new("body").children(body))
        .into();
    format!("<!DOCTYPE html>\n{}", html.to_html())
}

fn church_footer(settings: &Settings) -> Vec<Element> {
    let info = settings.church_info();
    let mut lines = Vec::new();
    if info.address.is_empty() {
        lines.push(el("p", "").text(info.name.clone()));
    } else {
        lines.push(el("p", "").text(format!("{} - {}", info.name, info.address)));
    }
    let contact: Vec<String> = [("Phone", &info.phone), ("Email", &info.email)]
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();
    if !contact.is_empty() {
        lines.push(el("p", "").text(contact.join(" | ")));
    }
    lines
}

/// Printable receipt for one donation.
pub fn receipt_document(donation: &Donation, settings: &Settings) -> String {
    let mut details = el("div", "details")
        .child(detail_row("Donor", donation.public_donor_name()))
        .child(detail_row("Date", date_text(donation.date, settings)))
        .child(detail_row("Type", labels::donation_type(&donation.donation_type)))
        .child(detail_row("Method", labels::payment_method(&donation.method)))
        .child(detail_row("Fund", labels::fund(&donation.fund)));
    if !donation.purpose.is_empty() {
        details = details.child(detail_row("Purpose", donation.purpose.as_str()));
    }
    let mut footer =
        el("div", "footer").child(el("p", "").text("Thank you for your generous contribution!"));
    if donation.tax_deductible {
        footer = footer.child(el("p", "").text(
            "This receipt serves as acknowledgment of your tax-deductible donation.",
        ));
    }
    footer = footer.children(church_footer(settings));

    document(
        "Donation Receipt",
        RECEIPT_CSS,
        vec![
            el("div", "header")
                .child(el("h1", "").text(settings.church_name.as_str()))
                .child(el("p", "").text("Donation Receipt"))
                .child(el("p", "").text(format!("Receipt #: {}", donation.id)))
                .into(),
            el("div", "amount").text(donation.amount.to_string()).into(),
            details.into(),
            footer.into(),
        ],
    )
}

/// Printable copy of a generated report.
pub fn report_document(report: &ReportRecord, settings: &Settings) -> String {
    document(
        &report.name,
        REPORT_CSS,
        vec![
            el("p", "church-name").text(settings.church_name.as_str()).into(),
            report_view(report),
            el("div", "footer").children(church_footer(settings)).into(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_date, ReportKind};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn members(n: usize) -> Vec<Member> {
        (0..n)
            .map(|i| Member {
                id: i as i64 + 1,
                first_name: format!("Member{i}"),
                last_name: "Test".into(),
                membership_status: "Active".into(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_paginate() {
        assert_eq!(
            paginate(45, 3, 20),
            PageInfo { page: 3, total_pages: 3, start: 40, end: 45, total: 45 }
        );
        assert_eq!(paginate(0, 5, 20).total_pages, 1);
        assert_eq!(paginate(45, 9, 20).page, 3);
    }

    #[test]
    fn test_page_links_collapse_gaps() {
        use PageLink::*;
        assert_eq!(
            page_links(6, 12),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Page(7), Page(8), Ellipsis, Page(12)]
        );
        assert_eq!(page_links(1, 3), vec![Page(1), Page(2), Page(3)]);
    }

    #[test]
    fn test_member_cards_page() {
        let all = members(25);
        let refs: Vec<&Member> = all.iter().collect();
        let node = member_cards(&refs, 2, &Settings::default());
        assert_eq!(node.find_class("member-card").len(), 5);
        assert!(node.text_content().contains("Showing 21-25 of 25 members"));
    }

    #[test]
    fn test_empty_collection_renders_empty_state() {
        let node = member_cards(&[], 1, &Settings::default());
        assert_eq!(node.find_class("empty-state").len(), 1);
        let handlers = node.handlers();
        assert_eq!(handlers[0].action, Action::Create(Entity::Member));

        assert_eq!(donation_list(&[], &Settings::default()).find_class("empty-state").len(), 1);
        assert_eq!(ministry_grid(&[]).find_class("empty-state").len(), 1);
    }

    #[test]
    fn test_donation_list_recent_first_and_anonymous() {
        let older = Donation {
            id: 1,
            donor_name: "Ama".into(),
            date: parse_date("2024-01-05"),
            ..Default::default()
        };
        let newer = Donation {
            id: 2,
            donor_name: "Kojo".into(),
            anonymous: true,
            date: parse_date("2024-02-05"),
            ..Default::default()
        };
        let node = donation_list(&[&older, &newer], &Settings::default());
        let names: Vec<String> = node
            .find_class("donor-name")
            .into_iter()
            .map(|e| Node::Element(e.clone()).text_content())
            .collect();
        assert_eq!(names, vec!["Anonymous", "Ama"]);
    }

    #[test]
    fn test_calendar_grid() {
        let weekly = Event {
            id: 9,
            title: "Prayer".into(),
            start_date: Some(ymd(2024, 5, 1)),
            recurring: true,
            repeat_frequency: "weekly".into(),
            ..Default::default()
        };
        let busy: Vec<Event> = (0..5)
            .map(|i| Event {
                id: 100 + i,
                title: format!("Busy {i}"),
                start_date: Some(ymd(2024, 5, 20)),
                ..Default::default()
            })
            .collect();
        let mut refs: Vec<&Event> = vec![&weekly];
        refs.extend(busy.iter());

        let node = event_calendar(&refs, 2024, 5, Weekday::Sun, ymd(2024, 5, 15));
        // 28 April through 1 June.
        assert_eq!(node.find_class("calendar-day").len(), 35);
        assert_eq!(node.find_class("other-month").len(), 4);
        assert_eq!(node.find_class("today").len(), 1);
        let prayer = node
            .find_class("calendar-event")
            .into_iter()
            .filter(|e| Node::Element((*e).clone()).text_content() == "Prayer")
            .count();
        assert_eq!(prayer, 5);
        assert!(node.text_content().contains("+2 more"));
    }

    #[test]
    fn test_home_page() {
        let settings = Settings::default();
        let stats = HomeStats {
            total_members: 3,
            active_members: 2,
            upcoming_events: 1,
            monthly_donations: Money::from_major(650),
        };
        let retreat = Event {
            id: 4,
            title: "Retreat".into(),
            start_date: Some(ymd(2024, 5, 20)),
            start_time: "09:00".into(),
            venue: "main-sanctuary".into(),
            ..Default::default()
        };
        let feed = vec![Activity {
            entity: Entity::Member,
            record_id: 1,
            title: "New member: Ama Mensah".into(),
            date: ymd(2024, 5, 12),
            days_ago: 3,
        }];

        let node = home_page(&stats, &feed, &[&retreat], &settings);
        let text = node.text_content();
        assert!(text.contains("$650.00"));
        assert!(text.contains("3 days ago"));
        assert!(text.contains("9:00 AM"));
        assert_eq!(node.find_class("stat-card").len(), 4);
        assert_eq!(node.find_class("event-item").len(), 1);
        assert!(node
            .handlers()
            .iter()
            .any(|h| h.action == Action::View(Entity::Member) && h.target.as_deref() == Some("1")));

        let empty = home_page(&HomeStats::default(), &[], &[], &settings);
        assert_eq!(empty.find_class("empty-state").len(), 2);
        assert!(empty.text_content().contains("No Recent Activities"));
    }

    #[test]
    fn test_relative_day() {
        let settings = Settings::default();
        let date = ymd(2024, 3, 1);
        assert_eq!(relative_day(0, date, &settings), "Today");
        assert_eq!(relative_day(1, date, &settings), "Yesterday");
        assert_eq!(relative_day(12, date, &settings), "12 days ago");
        assert_eq!(relative_day(-4, date, &settings), "In 4 days");
        assert_eq!(relative_day(75, date, &settings), "3/1/2024");
    }

    #[test]
    fn test_detail_views_skip_blank_fields() {
        let settings = Settings::default();
        let member = Member {
            first_name: "Ama".into(),
            last_name: "Mensah".into(),
            membership_status: "Active".into(),
            email: "ama@example.org".into(),
            date_joined: Some(ymd(2023, 1, 15)),
            ..Default::default()
        };
        let node = member_details(&member, &settings);
        let text = node.text_content();
        assert!(text.contains("ama@example.org"));
        assert!(text.contains("1/15/2023"));
        assert!(!text.contains("Phone"));

        let weekly = Event {
            title: "Prayer".into(),
            start_date: Some(ymd(2024, 5, 1)),
            start_time: "18:00".into(),
            end_time: "19:00".into(),
            recurring: true,
            repeat_frequency: "weekly".into(),
            ..Default::default()
        };
        let text = event_details(&weekly, &settings).text_content();
        assert!(text.contains("6:00 PM - 7:00 PM"));
        assert!(text.contains("Weekly"));
    }

    #[test]
    fn test_receipt_document() {
        let mut settings = Settings::default();
        settings.church_name = "Grace <Chapel>".into();
        let donation = Donation {
            id: 77,
            donor_name: "Ama".into(),
            amount: Money::from_cents(123_456),
            date: parse_date("2024-01-05"),
            donation_type: "tithe".into(),
            method: "check".into(),
            purpose: "Roof".into(),
            ..Default::default()
        };
        let html = receipt_document(&donation, &settings);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Grace &lt;Chapel&gt;"));
        assert!(html.contains("Receipt #: 77"));
        assert!(html.contains("$1,234.56"));
        assert!(html.contains("Purpose:"));
        assert!(html.contains("1/5/2024"));
    }

    #[test]
    fn test_report_view_tables() {
        let report = ReportRecord {
            id: "r1".into(),
            name: "Donor Analysis".into(),
            kind: ReportKind::DonorAnalysis,
            generated_at: Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap(),
            generated_by: "Admin User".into(),
            data: json!({
                "uniqueDonors": 2,
                "topDonors": [{"name": "Ama", "amount": 150.0, "count": 2}],
                "typeBreakdown": {"tithe": 500.0},
            }),
        };
        let node = report_view(&report);
        assert_eq!(node.find_class("summary-card").len(), 1);
        assert_eq!(node.find_class("report-table").len(), 1);
        let text = node.text_content();
        assert!(text.contains("Top Donors"));
        assert!(text.contains("Unique Donors"));
        assert_eq!(humanize("averageMonthlyGrowth"), "Average Monthly Growth");
    }
}
