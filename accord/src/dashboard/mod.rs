//! The dashboard state container.
//!
//! One [`Dashboard`] owns everything a page needs: the store, a
//! [`Collection`] per record type, the settings and the surface that
//! carries modals and notifications. Pages never reach into each other;
//! they share state only through the store.

use crate::aggregate::{
    self, donation_overview, event_stats, goal_progress, home_stats, member_stats,
    ministry_stats, recent_activity, upcoming_events, Activity, DonationOverview, EventStats,
    HomeStats, MemberStats, MinistryStats, HOME_UPCOMING_LIMIT,
};
use crate::clock::{Clock, SystemClock};
use crate::collection::{merge_patch, Collection};
use crate::error::{AccordError, Result};
use crate::export::{export_filename, to_csv, CsvExport};
use crate::filter::{sort_recent_first, FilterContext, Filtered};
use crate::form::{capture_new, capture_update, FormData};
use crate::reports;
use crate::schema::{
    event_template, Donation, Entity, Event, Frequency, Member, Ministry, RecordId, ReportKind,
    ReportRecord, ScheduledReport, VolunteerOpportunity,
};
use crate::settings::{self, Settings};
use crate::store::Store;
use crate::surface::{Confirm, Modal, NotificationKind, Surface};
use crate::validation::{
    donation_rules, event_rules, member_rules, ministry_rules, opportunity_rules, validate_record,
    RuleSet,
};
use crate::view::render;
use crate::view::Node;
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// A record type the dashboard manages end to end.
pub trait Managed: Filtered + CsvExport + Default {
    fn of(collections: &Collections) -> &Collection<Self>;

    fn of_mut(collections: &mut Collections) -> &mut Collection<Self>;

    fn rules(settings: &Settings) -> RuleSet;

    /// Body of the details modal.
    fn details(&self, settings: &Settings) -> Node;

    /// The question asked before this record is deleted.
    fn delete_prompt(&self) -> String {
        format!(
            "Are you sure you want to delete this {}?",
            Self::ENTITY.label().to_lowercase()
        )
    }
}

impl Managed for Member {
    fn of(collections: &Collections) -> &Collection<Self> {
        &collections.members
    }

    fn of_mut(collections: &mut Collections) -> &mut Collection<Self> {
        &mut collections.members
    }

    fn rules(settings: &Settings) -> RuleSet {
        member_rules(settings)
    }

    fn details(&self, settings: &Settings) -> Node {
        render::member_details(self, settings)
    }

    fn delete_prompt(&self) -> String {
        format!(
            "Are you sure you want to delete {} {}?",
            self.first_name, self.last_name
        )
    }
}

impl Managed for Event {
    fn of(collections: &Collections) -> &Collection<Self> {
        &collections.events
    }

    fn of_mut(collections: &mut Collections) -> &mut Collection<Self> {
        &mut collections.events
    }

    fn rules(_settings: &Settings) -> RuleSet {
        event_rules()
    }

    fn details(&self, settings: &Settings) -> Node {
        render::event_details(self, settings)
    }

    fn delete_prompt(&self) -> String {
        format!("Are you sure you want to delete \"{}\"?", self.title)
    }
}

impl Managed for Donation {
    fn of(collections: &Collections) -> &Collection<Self> {
        &collections.donations
    }

    fn of_mut(collections: &mut Collections) -> &mut Collection<Self> {
        &mut collections.donations
    }

    fn rules(_settings: &Settings) -> RuleSet {
        donation_rules()
    }

    fn details(&self, settings: &Settings) -> Node {
        render::donation_details(self, settings)
    }

    fn delete_prompt(&self) -> String {
        format!(
            "Are you sure you want to delete this {} donation from {}?",
            self.amount, self.donor_name
        )
    }
}

impl Managed for Ministry {
    fn of(collections: &Collections) -> &Collection<Self> {
        &collections.ministries
    }

    fn of_mut(collections: &mut Collections) -> &mut Collection<Self> {
        &mut collections.ministries
    }

    fn rules(_settings: &Settings) -> RuleSet {
        ministry_rules()
    }

    fn details(&self, _settings: &Settings) -> Node {
        render::ministry_details(self)
    }

    fn delete_prompt(&self) -> String {
        format!("Are you sure you want to delete the {} ministry?", self.name)
    }
}

impl Managed for VolunteerOpportunity {
    fn of(collections: &Collections) -> &Collection<Self> {
        &collections.opportunities
    }

    fn of_mut(collections: &mut Collections) -> &mut Collection<Self> {
        &mut collections.opportunities
    }

    fn rules(_settings: &Settings) -> RuleSet {
        opportunity_rules()
    }

    fn details(&self, _settings: &Settings) -> Node {
        render::opportunity_details(self)
    }
}

/// Summary figures shown at the top of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Overview {
    Members(MemberStats),
    Events(EventStats),
    Donations {
        overview: DonationOverview,
        goals: Vec<aggregate::GoalProgress>,
    },
    Ministries(MinistryStats),
    Opportunities { total: usize, active: usize },
}

/// The home page: headline figures, recent activity and what is next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub stats: HomeStats,
    pub recent_activity: Vec<Activity>,
    pub upcoming_events: Vec<Event>,
}

/// One collection per record type.
#[derive(Debug, Clone)]
pub struct Collections {
    pub members: Collection<Member>,
    pub events: Collection<Event>,
    pub donations: Collection<Donation>,
    pub ministries: Collection<Ministry>,
    pub opportunities: Collection<VolunteerOpportunity>,
}

impl Collections {
    pub fn load(store: &Store, ctx: FilterContext) -> Result<Self> {
        Ok(Collections {
            members: Collection::load(store, ctx)?,
            events: Collection::load(store, ctx)?,
            donations: Collection::load(store, ctx)?,
            ministries: Collection::load(store, ctx)?,
            opportunities: Collection::load(store, ctx)?,
        })
    }

    fn reload(&mut self, store: &Store) -> Result<()> {
        self.members.reload(store)?;
        self.events.reload(store)?;
        self.donations.reload(store)?;
        self.ministries.reload(store)?;
        self.opportunities.reload(store)
    }

    fn refresh(&mut self, ctx: FilterContext) {
        self.members.refresh(ctx);
        self.events.refresh(ctx);
        self.donations.refresh(ctx);
        self.ministries.refresh(ctx);
        self.opportunities.refresh(ctx);
    }
}

pub struct Dashboard<C: Clock = SystemClock> {
    store: Store,
    clock: C,
    settings: Settings,
    surface: Surface,
    records: Collections,
}

impl<C: Clock> Dashboard<C> {
    /// Load settings and every collection from `store`.
    pub fn open(store: Store, clock: C) -> Result<Self> {
        let settings = Settings::load(&store)?;
        let ctx = FilterContext::new(clock.today()).with_week_start(settings.week_start());
        Ok(Dashboard {
            records: Collections::load(&store, ctx)?,
            store,
            clock,
            settings,
            surface: Surface::new(),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn context(&self) -> FilterContext {
        FilterContext::new(self.clock.today()).with_week_start(self.settings.week_start())
    }

    fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        let now = self.clock.now();
        self.surface.expire(now);
        self.surface.notify(message, kind, now);
    }

    /// Reload every collection from the store, dropping filters.
    pub fn reload(&mut self) -> Result<()> {
        self.settings = Settings::load(&self.store)?;
        self.records.reload(&self.store)?;
        self.refresh();
        Ok(())
    }

    /// Recompute filtered views against the current date.
    pub fn refresh(&mut self) {
        let ctx = self.context();
        self.records.refresh(ctx);
    }

    pub fn collection<R: Managed>(&self) -> &Collection<R> {
        R::of(&self.records)
    }

    pub fn set_filter<R: Managed>(&mut self, filter: R::Filter) {
        let ctx = self.context();
        R::of_mut(&mut self.records).set_filter(filter, ctx);
    }

    fn outcome<T>(&mut self, result: Result<T>, success: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => {
                let message = success(value);
                self.notify(message, NotificationKind::Success);
            }
            Err(AccordError::Validation(errors)) => {
                self.notify(format!("Please fix the form: {errors}"), NotificationKind::Error)
            }
            Err(e) => self.notify(e.to_string(), NotificationKind::Error),
        }
        result
    }

    /// Validate and store a record built from a submitted form.
    pub fn create<R: Managed>(&mut self, form: &FormData) -> Result<RecordId> {
        let rules = R::rules(&self.settings);
        let result = capture_new::<R>(form, &rules).and_then(|record| self.add(record));
        self.outcome(result, |_| format!("{} added successfully", R::ENTITY.label()))
    }

    /// Validate and store an already built record.
    pub fn add<R: Managed>(&mut self, record: R) -> Result<RecordId> {
        validate_record(&record, &R::rules(&self.settings))?;
        R::of_mut(&mut self.records).insert(&self.store, record, self.clock.now())
    }

    /// Merge an edit form over the stored record. The merged record is
    /// validated as a whole before anything is written.
    pub fn update<R: Managed>(&mut self, id: RecordId, form: &FormData) -> Result<R> {
        let rules = R::rules(&self.settings);
        let result = self.apply_update(id, form, &rules);
        self.outcome(result, |_| format!("{} updated successfully", R::ENTITY.label()))
    }

    fn apply_update<R: Managed>(
        &mut self,
        id: RecordId,
        form: &FormData,
        rules: &RuleSet,
    ) -> Result<R> {
        let patch = capture_update::<R>(form, rules)?;
        let merged = merge_patch(R::of(&self.records).require(id)?, &patch)?;
        validate_record(&merged, rules)?;
        R::of_mut(&mut self.records).replace(&self.store, merged.clone())?;
        Ok(merged)
    }

    /// Delete after `confirm` approves. A declined prompt changes nothing
    /// and returns `Ok(None)`.
    pub fn delete<R: Managed>(
        &mut self,
        id: RecordId,
        confirm: &mut impl Confirm,
    ) -> Result<Option<R>> {
        let prompt = R::of(&self.records).require(id)?.delete_prompt();
        if !confirm.confirm(&prompt) {
            log::warn!("delete of {} {id} declined", R::ENTITY);
            return Ok(None);
        }
        let result = R::of_mut(&mut self.records).delete(&self.store, id);
        self.outcome(result, |_| format!("{} deleted successfully", R::ENTITY.label()))
            .map(Some)
    }

    /// Replace an event's attendee list. Every id must name a member.
    pub fn record_attendance(
        &mut self,
        event_id: RecordId,
        member_ids: &[RecordId],
    ) -> Result<Event> {
        let mut event = self.records.events.require(event_id)?.clone();
        let mut attendees = Vec::with_capacity(member_ids.len());
        for &id in member_ids {
            self.records.members.require(id)?;
            if !attendees.contains(&id) {
                attendees.push(id);
            }
        }
        event.attendees = attendees;
        self.records.events.replace(&self.store, event.clone())?;
        self.notify(
            format!("Attendance recorded: {} attendees", event.attendance()),
            NotificationKind::Success,
        );
        Ok(event)
    }

    /// Copy an event one week later with a fresh attendee list.
    pub fn duplicate_event(&mut self, id: RecordId) -> Result<RecordId> {
        let mut copy = self.records.events.require(id)?.clone();
        let week = Days::new(7);
        copy.title = format!("{} (Copy)", copy.title);
        copy.start_date = copy.start_date.and_then(|d| d.checked_add_days(week));
        copy.end_date = copy.end_date.and_then(|d| d.checked_add_days(week));
        copy.attendees.clear();
        let result = self.add(copy);
        self.outcome(result, |_| "Event duplicated successfully".to_string())
    }

    pub fn event_from_template(&mut self, key: &str, date: NaiveDate) -> Result<RecordId> {
        let template = event_template(key)
            .ok_or_else(|| AccordError::not_found("eventTemplates", key))?;
        let result = self.add(template.instantiate(date));
        self.outcome(result, |_| format!("{} created from template", template.title))
    }

    /// Printable receipt for one donation.
    pub fn receipt(&self, id: RecordId) -> Result<String> {
        let donation = self.records.donations.require(id)?;
        Ok(render::receipt_document(donation, &self.settings))
    }

    /// CSV of the filtered view and the file name to save it under.
    pub fn export_csv<R: Managed>(&self) -> (String, String) {
        let name = export_filename(&self.settings.file_prefix(), R::ENTITY, self.today());
        let mut rows = R::of(&self.records).filtered();
        sort_recent_first(&mut rows);
        (name, to_csv(rows))
    }

    pub fn generate_report(&mut self, kind: ReportKind) -> Result<ReportRecord> {
        let result = reports::generate(&self.store, kind, self.clock.now(), self.today());
        self.outcome(result, |r| format!("{} generated successfully", r.name))
    }

    pub fn schedule_report(
        &mut self,
        kind: ReportKind,
        frequency: Frequency,
        recipients: &str,
        start: Option<NaiveDate>,
    ) -> Result<ScheduledReport> {
        let now = self.clock.now();
        let result = reports::schedule(&self.store, kind, frequency, recipients, start, now);
        self.outcome(result, |s| format!("{} scheduled", s.report_name))
    }

    pub fn run_due_reports(&mut self) -> Result<Vec<ReportRecord>> {
        let generated = reports::run_due(&self.store, self.clock.now(), self.today())?;
        if !generated.is_empty() {
            self.notify(
                format!("{} scheduled report(s) generated", generated.len()),
                NotificationKind::Info,
            );
        }
        Ok(generated)
    }

    pub fn overview(&self, entity: Entity) -> Overview {
        let today = self.today();
        match entity {
            Entity::Member => Overview::Members(member_stats(self.records.members.items(), today)),
            Entity::Event => Overview::Events(event_stats(self.records.events.items(), today)),
            Entity::Donation => Overview::Donations {
                overview: donation_overview(self.records.donations.items(), today),
                goals: goal_progress(self.records.donations.items(), &self.settings.goals(), today),
            },
            Entity::Ministry => Overview::Ministries(ministry_stats(
                self.records.ministries.items(),
                self.records.events.items(),
                today,
            )),
            Entity::Opportunity => Overview::Opportunities {
                total: self.records.opportunities.len(),
                active: self.records.opportunities.items().iter().filter(|o| o.is_active).count(),
            },
        }
    }

    pub fn home(&self) -> Home {
        let today = self.today();
        let (members, events, donations) = (
            self.records.members.items(),
            self.records.events.items(),
            self.records.donations.items(),
        );
        Home {
            stats: home_stats(members, events, donations, today),
            recent_activity: recent_activity(members, events, donations, today),
            upcoming_events: upcoming_events(events, today, HOME_UPCOMING_LIMIT)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    pub fn render_home(&self) -> Node {
        let home = self.home();
        let upcoming: Vec<&Event> = home.upcoming_events.iter().collect();
        render::home_page(&home.stats, &home.recent_activity, &upcoming, &self.settings)
    }

    /// Open the details modal for one record.
    pub fn view<R: Managed>(&mut self, id: RecordId) -> Result<&Modal> {
        let record = R::of(&self.records).require(id)?;
        let title = format!("{} Details", R::ENTITY.label());
        let body = record.details(&self.settings);
        self.surface.show_modal(title, body);
        self.surface
            .modal()
            .ok_or_else(|| AccordError::Other("modal did not open".into()))
    }

    /// The list view of one page. `page` is 1-based and only paginates
    /// the member grid.
    pub fn render(&self, entity: Entity, page: usize) -> Node {
        let s = &self.settings;
        match entity {
            Entity::Member => render::member_cards(&self.records.members.filtered(), page, s),
            Entity::Event => render::event_list(&self.records.events.filtered(), s),
            Entity::Donation => {
                let today = self.today();
                let all = self.records.donations.items();
                let by_type = aggregate::ranked(&aggregate::by_type(all));
                Node::Fragment(vec![
                    render::donation_summary(
                        &donation_overview(all, today),
                        &goal_progress(all, &s.goals(), today),
                        &by_type,
                    ),
                    render::donation_list(&self.records.donations.filtered(), s),
                ])
            }
            Entity::Ministry => render::ministry_grid(&self.records.ministries.filtered()),
            Entity::Opportunity => render::opportunity_list(&self.records.opportunities.filtered()),
        }
    }

    /// Month grid for the month containing `date`.
    pub fn calendar(&self, date: NaiveDate) -> Node {
        render::event_calendar(
            &self.records.events.filtered(),
            date.year(),
            date.month(),
            self.settings.week_start(),
            self.today(),
        )
    }

    pub fn set_setting(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut updated = self.settings.clone();
        let result = updated.set(key, raw).and_then(|_| updated.save(&self.store));
        let result = self.outcome(result, |_| "Settings saved successfully".to_string());
        if result.is_ok() {
            self.settings = updated;
            self.refresh();
        }
        result
    }

    pub fn reset_settings(&mut self, confirm: &mut impl Confirm) -> Result<()> {
        let prompt = "Are you sure you want to reset all settings to their default values? \
                      This action cannot be undone.";
        if !confirm.confirm(prompt) {
            return Err(AccordError::ConfirmationDeclined("Settings reset cancelled".into()));
        }
        let result = Settings::reset(&self.store);
        let settings = self.outcome(result, |_| "Settings reset to defaults".to_string())?;
        self.settings = settings;
        self.refresh();
        Ok(())
    }

    pub fn import_data(&mut self, data: Value, confirm: &mut impl Confirm) -> Result<()> {
        let prompt =
            "Are you sure you want to import this data? This will overwrite existing data.";
        if !confirm.confirm(prompt) {
            return Err(AccordError::ConfirmationDeclined("Import cancelled".into()));
        }
        let result = settings::import_data(&self.store, data);
        self.outcome(result, |_| "Data imported successfully".to_string())?;
        self.reload()
    }

    /// Wipe every blob. Settings fall back to defaults.
    pub fn clear_all(&mut self, phrase: &str) -> Result<()> {
        let result = settings::clear_all(&self.store, phrase);
        self.outcome(result, |_| "All data has been cleared".to_string())?;
        self.reload()
    }

    pub fn backup(&mut self) -> Result<std::path::PathBuf> {
        let result = settings::write_backup(&self.store, &self.settings, self.clock.now());
        let path = self.outcome(result, |_| "Backup created successfully".to_string())?;
        settings::prune_backups(&self.store, self.settings.backup_retention, self.today())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::filter::{DonationFilter, EventFilter, EventTiming, MemberFilter};
    use crate::money::Money;
    use crate::surface::AssumeYes;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dashboard() -> Dashboard<FixedClock> {
        Dashboard::open(Store::in_memory(), FixedClock::on(ymd(2024, 5, 15))).unwrap()
    }

    fn member_form(first: &str) -> FormData {
        FormData::new()
            .with("firstName", first)
            .with("lastName", "Mensah")
            .with("email", format!("{}@example.org", first.to_lowercase()))
            .with("membershipStatus", "Active")
    }

    fn donation_form(name: &str, amount: &str, date: &str, kind: &str) -> FormData {
        FormData::new()
            .with("donorName", name)
            .with("amount", amount)
            .with("date", date)
            .with("type", kind)
            .with("method", "cash")
    }

    #[test]
    fn test_create_assigns_unique_ids_and_notifies() {
        let mut d = dashboard();
        let a = d.create::<Member>(&member_form("Kofi")).unwrap();
        let b = d.create::<Member>(&member_form("Ama")).unwrap();
        assert_ne!(a, b);
        assert_eq!(d.collection::<Member>().len(), 2);
        assert_eq!(d.store().load_data().unwrap().members.len(), 2);
        assert_eq!(
            d.surface().notifications().last().unwrap().message,
            "Member added successfully"
        );
    }

    #[test]
    fn test_create_rejects_invalid_form() {
        let mut d = dashboard();
        let form = FormData::new().with("firstName", "Kofi").with("email", "nope");
        let err = d.create::<Member>(&form).unwrap_err();
        assert!(matches!(err, AccordError::Validation(_)));
        assert!(d.collection::<Member>().is_empty());
        let last = d.surface().notifications().last().unwrap();
        assert_eq!(last.kind, NotificationKind::Error);
    }

    #[test]
    fn test_update_merges_and_validates() {
        let mut d = dashboard();
        let id = d.create::<Member>(&member_form("Kofi")).unwrap();

        let updated = d
            .update::<Member>(id, &FormData::new().with("phone", "555-123-0100"))
            .unwrap();
        assert_eq!(updated.phone, "555-123-0100");
        assert_eq!(updated.first_name, "Kofi");

        assert!(d
            .update::<Member>(id, &FormData::new().with("email", "bad"))
            .is_err());
        assert!(matches!(
            d.update::<Member>(42, &FormData::new().with("phone", "555-123-0101")),
            Err(AccordError::NotFound { .. })
        ));
        assert_eq!(d.collection::<Member>().require(id).unwrap().email, "kofi@example.org");
    }

    #[test]
    fn test_delete_asks_first() {
        let mut d = dashboard();
        let id = d.create::<Member>(&member_form("Kofi")).unwrap();

        let mut prompts = Vec::new();
        let mut decline = |p: &str| {
            prompts.push(p.to_string());
            false
        };
        assert_eq!(d.delete::<Member>(id, &mut decline).unwrap(), None);
        assert_eq!(prompts, vec!["Are you sure you want to delete Kofi Mensah?"]);
        assert_eq!(d.collection::<Member>().len(), 1);

        let removed = d.delete::<Member>(id, &mut AssumeYes).unwrap().unwrap();
        assert_eq!(removed.first_name, "Kofi");
        assert!(d.collection::<Member>().is_empty());
        assert!(d.delete::<Member>(id, &mut AssumeYes).is_err());
    }

    #[test]
    fn test_donation_prompt_and_overview() {
        let mut d = dashboard();
        let id = d
            .create::<Donation>(&donation_form("Ama", "500", "2024-05-05", "tithe"))
            .unwrap();
        d.create::<Donation>(&donation_form("Kofi", "150", "2024-05-10", "offering"))
            .unwrap();

        let prompt = d.collection::<Donation>().require(id).unwrap().delete_prompt();
        assert_eq!(prompt, "Are you sure you want to delete this $500.00 donation from Ama?");

        let Overview::Donations { overview, goals } = d.overview(Entity::Donation) else {
            panic!("expected donation overview");
        };
        assert_eq!(overview.this_month, Money::from_major(650));
        assert_eq!(overview.unique_donors, 2);
        assert_eq!(goals[0].label, "Monthly Goal");
    }

    #[test]
    fn test_create_donation_with_currency_amount() {
        let mut d = dashboard();
        let id = d
            .create::<Donation>(&donation_form("Ama", "$1,234.50", "2024-05-05", "tithe"))
            .unwrap();
        let stored = d.collection::<Donation>().require(id).unwrap();
        assert_eq!(stored.amount, Money::from_cents(123_450));

        let err = d
            .create::<Donation>(&donation_form(
                "Kofi",
                "92233720368547758.99",
                "2024-05-05",
                "tithe",
            ))
            .unwrap_err();
        assert!(matches!(err, AccordError::Validation(_)));
        assert_eq!(d.collection::<Donation>().len(), 1);
    }

    #[test]
    fn test_home_summarises_recent_records() {
        let mut d = dashboard();
        d.create::<Member>(&member_form("Kofi").with("dateJoined", "2024-05-10"))
            .unwrap();
        d.create::<Donation>(&donation_form("Ama", "500", "2024-05-05", "tithe"))
            .unwrap();
        let retreat = d
            .create::<Event>(
                &FormData::new()
                    .with("title", "Retreat")
                    .with("startDate", "2024-05-20")
                    .with("type", "fellowship"),
            )
            .unwrap();
        d.create::<Event>(
            &FormData::new()
                .with("title", "Harvest")
                .with("startDate", "2024-07-01")
                .with("type", "special"),
        )
        .unwrap();

        let home = d.home();
        assert_eq!(home.stats.total_members, 1);
        assert_eq!(home.stats.active_members, 1);
        assert_eq!(home.stats.upcoming_events, 1);
        assert_eq!(home.stats.monthly_donations, Money::from_major(500));
        assert_eq!(home.upcoming_events[0].id, retreat);
        let titles: Vec<&str> = home.recent_activity.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Event scheduled: Harvest",
                "Event scheduled: Retreat",
                "New member: Kofi Mensah",
                "Donation received: $500.00 from Ama",
            ]
        );
        assert!(d.render_home().to_html().contains("In 5 days"));
    }

    #[test]
    fn test_view_opens_details_modal() {
        let mut d = dashboard();
        let id = d
            .create::<Donation>(&donation_form("Ama", "75", "2024-05-05", "offering"))
            .unwrap();
        let modal = d.view::<Donation>(id).unwrap();
        assert_eq!(modal.title, "Donation Details");
        assert!(modal.body.text_content().contains("$75.00"));
        assert!(d.surface().modal().is_some());
        assert!(d.view::<Member>(42).is_err());
    }

    #[test]
    fn test_filters_and_empty_state() {
        let mut d = dashboard();
        d.create::<Member>(&member_form("Kofi")).unwrap();
        d.set_filter::<Member>(MemberFilter {
            status: Some("Visitor".into()),
            ..Default::default()
        });
        assert!(d.collection::<Member>().filtered().is_empty());
        let html = d.render(Entity::Member, 1).to_html();
        assert!(html.contains("empty-state"));

        d.set_filter::<Member>(MemberFilter::default());
        assert_eq!(d.collection::<Member>().filtered().len(), 1);
    }

    #[test]
    fn test_attendance_and_duplicate() {
        let mut d = dashboard();
        let kofi = d.create::<Member>(&member_form("Kofi")).unwrap();
        let event = d
            .create::<Event>(
                &FormData::new()
                    .with("title", "Choir Practice")
                    .with("startDate", "2024-05-20")
                    .with("type", "rehearsal"),
            )
            .unwrap();

        let recorded = d.record_attendance(event, &[kofi, kofi]).unwrap();
        assert_eq!(recorded.attendees, vec![kofi]);
        assert!(d.record_attendance(event, &[999]).is_err());

        let copy_id = d.duplicate_event(event).unwrap();
        let copy = d.collection::<Event>().require(copy_id).unwrap();
        assert_eq!(copy.title, "Choir Practice (Copy)");
        assert_eq!(copy.start_date, Some(ymd(2024, 5, 27)));
        assert!(copy.attendees.is_empty());

        d.set_filter::<Event>(EventFilter {
            timing: Some(EventTiming::Upcoming),
            ..Default::default()
        });
        assert_eq!(d.collection::<Event>().filtered().len(), 2);
    }

    #[test]
    fn test_export_csv_uses_filtered_view() {
        let mut d = dashboard();
        d.create::<Donation>(&donation_form("Ama", "500", "2024-01-05", "tithe"))
            .unwrap();
        d.create::<Donation>(&donation_form("Kofi", "150", "2024-01-10", "offering"))
            .unwrap();
        d.set_filter::<Donation>(DonationFilter {
            donation_type: Some("tithe".into()),
            ..Default::default()
        });
        let (name, csv) = d.export_csv::<Donation>();
        assert_eq!(name, "accord-church-donations-2024-05-15.csv");
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("\"Ama\""));
    }

    #[test]
    fn test_settings_reset_import_and_clear() {
        let mut d = dashboard();
        d.set_setting("monthlyGoal", "2500").unwrap();
        assert_eq!(d.settings().monthly_goal, Money::from_major(2500));

        let mut decline = |_: &str| false;
        assert!(matches!(
            d.reset_settings(&mut decline),
            Err(AccordError::ConfirmationDeclined(_))
        ));
        d.reset_settings(&mut AssumeYes).unwrap();
        assert_eq!(d.settings().monthly_goal, Money::from_major(10_000));

        let data = json!({"members": [{"id": 7, "firstName": "Esi", "lastName": "Boateng"}]});
        d.import_data(data, &mut AssumeYes).unwrap();
        assert_eq!(d.collection::<Member>().require(7).unwrap().first_name, "Esi");

        assert!(d.clear_all("delete everything").is_err());
        d.clear_all("DELETE ALL DATA").unwrap();
        assert!(d.collection::<Member>().is_empty());
    }

    #[test]
    fn test_reports_through_dashboard() {
        let mut d = dashboard();
        d.create::<Donation>(&donation_form("Ama", "500", "2024-01-05", "tithe"))
            .unwrap();
        let report = d.generate_report(ReportKind::GivingSummary).unwrap();
        assert_eq!(report.data["totalGiving"], 500.0);

        d.schedule_report(
            ReportKind::MemberDirectory,
            Frequency::Daily,
            "office@example.org",
            Some(ymd(2024, 5, 1)),
        )
        .unwrap();
        assert_eq!(d.run_due_reports().unwrap().len(), 1);
        assert_eq!(d.store().load_data().unwrap().report_history.len(), 2);
    }

    #[test]
    fn test_backup_writes_file() {
        let tmp = TempDir::new().unwrap();
        let store = Store::create(tmp.path()).unwrap();
        let mut d = Dashboard::open(store, FixedClock::on(ymd(2024, 5, 15))).unwrap();
        let path = d.backup().unwrap();
        assert!(path.ends_with("backups/accord-church-backup-2024-05-15.json"));
        assert!(path.exists());
    }

    #[test]
    fn test_backup_with_long_retention() {
        let tmp = TempDir::new().unwrap();
        let store = Store::create(tmp.path()).unwrap();
        let mut d = Dashboard::open(store, FixedClock::on(ymd(2024, 5, 15))).unwrap();
        d.set_setting("backupRetention", "200000000").unwrap();
        let path = d.backup().unwrap();
        assert!(path.exists());
    }
}
