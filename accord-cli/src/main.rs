use accord::clock::{Clock, FixedClock, SystemClock};
use accord::dashboard::{Dashboard, Managed};
use accord::filter::{
    AgeGroup, DateRange, DonationFilter, EventFilter, EventTiming, MemberFilter, MinistryFilter,
    OpportunityFilter,
};
use accord::form::FormData;
use accord::schema::{
    Donation, Entity, Event, Frequency, Member, Ministry, RecordId, ReportKind,
    VolunteerOpportunity,
};
use accord::settings::{self, Settings};
use accord::store::Store;
use accord::view::{escape_text, render};
use accord::{reports, sample};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Accord CLI: church records, reports and settings from the command line
#[derive(Parser)]
#[command(name = "accord", version, about)]
struct Cli {
    /// Path to the data directory (default: current directory)
    #[arg(long, env = "ACCORD_DATA_DIR", default_value = ".")]
    data_dir: String,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    /// Pin "today" (YYYY-MM-DD) for date filters and reports
    #[arg(long)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create the data directory and default blobs
    Init {
        /// Seed sample members, events, donations and ministries
        #[arg(long)]
        sample: bool,
    },

    /// List records, optionally filtered
    List {
        /// member, event, donation, ministry or opportunity
        entity: Entity,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Get a single record by id
    Get { entity: Entity, id: RecordId },

    /// Home page figures, recent activity and upcoming events
    Home {
        /// Print the rendered page instead of the data
        #[arg(long)]
        html: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render the details view of one record as HTML
    View {
        entity: Entity,
        id: RecordId,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Add a record from form fields
    Add {
        entity: Entity,
        /// Field values (e.g. --field firstName=Ama)
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Update fields of an existing record
    Update {
        entity: Entity,
        id: RecordId,
        /// Field values to change (e.g. --field phone=555-123-4567)
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Delete a record
    Delete {
        entity: Entity,
        id: RecordId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Overview statistics for one page
    Stats { entity: Entity },

    /// Render a page as HTML
    Render {
        entity: Entity,
        #[command(flatten)]
        filters: FilterArgs,
        /// Member grid page (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Render the event calendar for the month containing this date
        #[arg(long)]
        calendar: Option<NaiveDate>,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Export the filtered view as CSV
    Export {
        entity: Entity,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output path (default: <church>-<entity>-<date>.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print a donation receipt as HTML
    Receipt {
        id: RecordId,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Record the members who attended an event
    Attend {
        event_id: RecordId,
        /// Comma separated member ids
        #[arg(value_delimiter = ',')]
        member_ids: Vec<RecordId>,
    },

    /// Copy an event one week later
    DuplicateEvent { id: RecordId },

    /// Create an event from a template
    Template {
        /// sunday-service, bible-study, youth-meeting, board-meeting, outreach or special-event
        key: String,
        date: NaiveDate,
    },

    /// Generate, list and schedule reports
    Report {
        #[command(subcommand)]
        action: ReportCommand,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Write a backup file into <data-dir>/backups
    Backup,

    /// Export all church data as JSON
    ExportData {
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Replace all church data with an exported JSON file
    Import {
        file: PathBuf,
        #[arg(long)]
        yes: bool,
    },

    /// Remove all data and settings
    Clear {
        /// Must be exactly "DELETE ALL DATA"
        #[arg(long)]
        confirm: String,
    },

    /// Database size and record counts
    Status,
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Generate a report and add it to the history
    Generate { kind: ReportKind },
    /// Recently generated reports
    History {
        #[arg(long, default_value_t = reports::RECENT_REPORTS)]
        limit: usize,
    },
    /// Show one report from the history
    Show {
        id: String,
        /// Print the printable HTML document instead of the data
        #[arg(long)]
        html: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete a report from the history
    Delete { id: String },
    /// Schedule a recurring report
    Schedule {
        kind: ReportKind,
        frequency: Frequency,
        /// Comma separated email addresses
        #[arg(long)]
        recipients: String,
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// List scheduled reports
    Schedules,
    /// Delete a scheduled report
    Unschedule { id: String },
    /// Generate every scheduled report that is due
    RunDue,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print every setting, or one key
    Show { key: Option<String> },
    /// Change one setting (e.g. monthlyGoal 12000)
    Set { key: String, value: String },
    /// Restore defaults
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Export settings as JSON
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Case-insensitive text search
    #[arg(long, default_value = "")]
    search: String,
    /// Membership status
    #[arg(long)]
    status: Option<String>,
    /// Event or donation type
    #[arg(long = "type")]
    kind: Option<String>,
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    fund: Option<String>,
    /// today, week, month, quarter, year or custom:START:END
    #[arg(long)]
    range: Option<DateRange>,
    /// upcoming, past, today, this-week or this-month
    #[arg(long)]
    timing: Option<EventTiming>,
    #[arg(long)]
    venue: Option<String>,
    #[arg(long)]
    age_group: Option<AgeGroup>,
    /// Member ministry or ministry category
    #[arg(long)]
    ministry: Option<String>,
    #[arg(long)]
    ministry_id: Option<RecordId>,
    #[arg(long)]
    active_only: bool,
}

/// Builds a record type's filter from the shared command-line flags.
trait CliRecord: Managed {
    fn filter(args: &FilterArgs) -> Self::Filter;
}

impl CliRecord for Member {
    fn filter(args: &FilterArgs) -> MemberFilter {
        MemberFilter {
            search: args.search.clone(),
            status: args.status.clone(),
            age_group: args.age_group,
            ministry: args.ministry.clone(),
        }
    }
}

impl CliRecord for Event {
    fn filter(args: &FilterArgs) -> EventFilter {
        EventFilter {
            search: args.search.clone(),
            event_type: args.kind.clone(),
            timing: args.timing,
            venue: args.venue.clone(),
        }
    }
}

impl CliRecord for Donation {
    fn filter(args: &FilterArgs) -> DonationFilter {
        DonationFilter {
            search: args.search.clone(),
            donation_type: args.kind.clone(),
            method: args.method.clone(),
            fund: args.fund.clone(),
            range: args.range.unwrap_or_default(),
        }
    }
}

impl CliRecord for Ministry {
    fn filter(args: &FilterArgs) -> MinistryFilter {
        MinistryFilter {
            search: args.search.clone(),
            category: args.ministry.clone(),
            active_only: args.active_only,
        }
    }
}

impl CliRecord for VolunteerOpportunity {
    fn filter(args: &FilterArgs) -> OpportunityFilter {
        OpportunityFilter {
            search: args.search.clone(),
            ministry_id: args.ministry_id,
            active_only: args.active_only,
        }
    }
}

/// Wall clock unless `--today` pinned a date.
enum CliClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl Clock for CliClock {
    fn now(&self) -> DateTime<Utc> {
        match self {
            CliClock::System(c) => c.now(),
            CliClock::Fixed(c) => c.now(),
        }
    }

    fn today(&self) -> NaiveDate {
        match self {
            CliClock::System(c) => c.today(),
            CliClock::Fixed(c) => c.today(),
        }
    }
}

type Dash = Dashboard<CliClock>;

/// Call a generic function with the record type named by an `Entity`.
macro_rules! dispatch {
    ($entity:expr, $f:ident($($arg:expr),*)) => {
        match $entity {
            Entity::Member => $f::<Member>($($arg),*),
            Entity::Event => $f::<Event>($($arg),*),
            Entity::Donation => $f::<Donation>($($arg),*),
            Entity::Ministry => $f::<Ministry>($($arg),*),
            Entity::Opportunity => $f::<VolunteerOpportunity>($($arg),*),
        }
    };
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let clock = match cli.today {
        Some(date) => CliClock::Fixed(FixedClock::on(date)),
        None => CliClock::System(SystemClock),
    };
    let format = cli.format;

    if let Command::Init { sample } = cli.command {
        let value = init(&cli.data_dir, sample, clock.today())?;
        return print_output(&value, &format);
    }

    let store = Store::open(&cli.data_dir)?;
    let mut d = Dashboard::open(store, clock)?;

    match cli.command {
        Command::Init { .. } => return Err("init runs before the store is opened".into()),

        Command::List { entity, filters } => {
            let value = dispatch!(entity, list(&mut d, &filters))?;
            print_output(&value, &format)?;
        }

        Command::Get { entity, id } => {
            let value = dispatch!(entity, get(&d, id))?;
            print_output(&value, &format)?;
        }

        Command::Home { html, output } => {
            if html {
                write_text(output.as_deref(), &d.render_home().to_html())?;
            } else {
                print_output(&d.home(), &format)?;
            }
        }

        Command::View { entity, id, output } => {
            let html = dispatch!(entity, view(&mut d, id))?;
            write_text(output.as_deref(), &html)?;
        }

        Command::Add { entity, fields } => {
            let form = FormData::from_pairs(&fields)?;
            let id = dispatch!(entity, create(&mut d, &form))?;
            print_output(&serde_json::json!({ "ok": true, "id": id }), &format)?;
        }

        Command::Update { entity, id, fields } => {
            let form = FormData::from_pairs(&fields)?;
            let value = dispatch!(entity, update(&mut d, id, &form))?;
            print_output(&value, &format)?;
        }

        Command::Delete { entity, id, yes } => {
            let deleted = dispatch!(entity, delete(&mut d, id, yes))?;
            print_output(&serde_json::json!({ "ok": deleted, "deleted": id }), &format)?;
        }

        Command::Stats { entity } => {
            print_output(&d.overview(entity), &format)?;
        }

        Command::Render {
            entity,
            filters,
            page,
            calendar,
            output,
        } => {
            dispatch!(entity, apply_filter(&mut d, &filters));
            let node = match (entity, calendar) {
                (Entity::Event, Some(month)) => d.calendar(month),
                _ => d.render(entity, page),
            };
            write_text(output.as_deref(), &node.to_html())?;
        }

        Command::Export {
            entity,
            filters,
            output,
        } => {
            let (name, csv) = dispatch!(entity, export(&mut d, &filters));
            let path = output.unwrap_or_else(|| PathBuf::from(name));
            std::fs::write(&path, &csv)?;
            let rows = csv.lines().count().saturating_sub(1);
            print_output(&serde_json::json!({ "file": path, "rows": rows }), &format)?;
        }

        Command::Receipt { id, output } => {
            write_text(output.as_deref(), &d.receipt(id)?)?;
        }

        Command::Attend {
            event_id,
            member_ids,
        } => {
            let event = d.record_attendance(event_id, &member_ids)?;
            print_output(
                &serde_json::json!({
                    "ok": true,
                    "id": event.id,
                    "attendance": event.attendance(),
                }),
                &format,
            )?;
        }

        Command::DuplicateEvent { id } => {
            let copy = d.duplicate_event(id)?;
            print_output(&serde_json::json!({ "ok": true, "id": copy }), &format)?;
        }

        Command::Template { key, date } => {
            let id = d.event_from_template(&key, date)?;
            print_output(&serde_json::json!({ "ok": true, "id": id }), &format)?;
        }

        Command::Report { action } => report(&mut d, action, &format)?,

        Command::Settings { action } => settings_command(&mut d, action, &format)?,

        Command::Backup => {
            let path = d.backup()?;
            print_output(&serde_json::json!({ "ok": true, "file": path }), &format)?;
        }

        Command::ExportData { output } => {
            let data = settings::export_data(d.store(), d.now())?;
            let prefix = d.settings().file_prefix();
            let stamp = d.today().format("%Y-%m-%d");
            let default_name = format!("{prefix}-data-export-{stamp}.json");
            let path = output.unwrap_or_else(|| PathBuf::from(default_name));
            std::fs::write(&path, serde_json::to_string_pretty(&data)?)?;
            print_output(&serde_json::json!({ "ok": true, "file": path }), &format)?;
        }

        Command::Import { file, yes } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|e| format!("Failed to read import file '{}': {e}", file.display()))?;
            let data: serde_json::Value = serde_json::from_str(&raw)?;
            d.import_data(data, &mut confirmer(yes))?;
            print_output(&settings::system_info(d.store(), d.today())?, &format)?;
        }

        Command::Clear { confirm } => {
            d.clear_all(&confirm)?;
            print_output(&serde_json::json!({ "ok": true, "cleared": true }), &format)?;
        }

        Command::Status => {
            let info = settings::system_info(d.store(), d.today())?;
            let backups = settings::list_backups(d.store())?;
            print_output(
                &serde_json::json!({
                    "databaseSize": info.size_label(),
                    "totalRecords": info.total_records,
                    "lastUpdated": info.last_updated,
                    "members": d.collection::<Member>().len(),
                    "events": d.collection::<Event>().len(),
                    "donations": d.collection::<Donation>().len(),
                    "ministries": d.collection::<Ministry>().len(),
                    "volunteerOpportunities": d.collection::<VolunteerOpportunity>().len(),
                    "backups": backups.len(),
                }),
                &format,
            )?;
        }
    }

    for note in d.surface_mut().drain() {
        log::debug!("{}: {}", note.kind, note.message);
    }
    Ok(())
}

fn init(data_dir: &str, with_sample: bool, today: NaiveDate) -> CliResult<serde_json::Value> {
    let store = Store::create(data_dir)?;
    if with_sample {
        store.save_data(&sample::church_data(today))?;
    } else if !store.exists(accord::store::CHURCH_DATA_KEY)? {
        store.save_data(&accord::ChurchData::default())?;
    }
    if !store.exists(accord::store::SETTINGS_KEY)? {
        Settings::default().save(&store)?;
    }
    let info = settings::system_info(&store, today)?;
    Ok(serde_json::json!({
        "ok": true,
        "dataDir": data_dir,
        "totalRecords": info.total_records,
    }))
}

fn apply_filter<R: CliRecord>(d: &mut Dash, filters: &FilterArgs) {
    d.set_filter::<R>(R::filter(filters));
}

fn list<R: CliRecord>(d: &mut Dash, filters: &FilterArgs) -> CliResult<serde_json::Value> {
    apply_filter::<R>(d, filters);
    let mut rows = d.collection::<R>().filtered();
    accord::filter::sort_recent_first(&mut rows);
    Ok(serde_json::to_value(rows)?)
}

fn get<R: CliRecord>(d: &Dash, id: RecordId) -> CliResult<serde_json::Value> {
    Ok(serde_json::to_value(d.collection::<R>().require(id)?)?)
}

fn view<R: CliRecord>(d: &mut Dash, id: RecordId) -> CliResult<String> {
    let modal = d.view::<R>(id)?;
    Ok(format!("<h2>{}</h2>\n{}", escape_text(&modal.title), modal.body.to_html()))
}

fn create<R: CliRecord>(d: &mut Dash, form: &FormData) -> CliResult<RecordId> {
    Ok(d.create::<R>(form)?)
}

fn update<R: CliRecord>(
    d: &mut Dash,
    id: RecordId,
    form: &FormData,
) -> CliResult<serde_json::Value> {
    Ok(serde_json::to_value(d.update::<R>(id, form)?)?)
}

fn delete<R: CliRecord>(d: &mut Dash, id: RecordId, yes: bool) -> CliResult<bool> {
    Ok(d.delete::<R>(id, &mut confirmer(yes))?.is_some())
}

fn export<R: CliRecord>(d: &mut Dash, filters: &FilterArgs) -> (String, String) {
    apply_filter::<R>(d, filters);
    d.export_csv::<R>()
}

fn report(d: &mut Dash, action: ReportCommand, format: &OutputFormat) -> CliResult<()> {
    match action {
        ReportCommand::Generate { kind } => print_output(&d.generate_report(kind)?, format),
        ReportCommand::History { limit } => {
            let data = d.store().load_data()?;
            let rows: Vec<serde_json::Value> = reports::recent(&data.report_history, limit)
                .into_iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.id,
                        "name": r.name,
                        "type": r.kind,
                        "generatedAt": r.generated_at,
                        "generatedBy": r.generated_by,
                    })
                })
                .collect();
            print_output(&rows, format)
        }
        ReportCommand::Show { id, html, output } => {
            let data = d.store().load_data()?;
            let record = reports::find(&data.report_history, &id)?;
            if html {
                write_text(output.as_deref(), &render::report_document(record, d.settings()))
            } else {
                print_output(record, format)
            }
        }
        ReportCommand::Delete { id } => {
            let removed = reports::delete(d.store(), &id)?;
            print_output(&serde_json::json!({ "ok": true, "deleted": removed.id }), format)
        }
        ReportCommand::Schedule {
            kind,
            frequency,
            recipients,
            start,
        } => print_output(&d.schedule_report(kind, frequency, &recipients, start)?, format),
        ReportCommand::Schedules => {
            print_output(&d.store().load_data()?.scheduled_reports, format)
        }
        ReportCommand::Unschedule { id } => {
            let removed = reports::delete_schedule(d.store(), &id)?;
            print_output(&serde_json::json!({ "ok": true, "deleted": removed.id }), format)
        }
        ReportCommand::RunDue => {
            let generated: Vec<String> = d.run_due_reports()?.into_iter().map(|r| r.id).collect();
            print_output(&serde_json::json!({ "generated": generated }), format)
        }
    }
}

fn settings_command(d: &mut Dash, action: SettingsCommand, format: &OutputFormat) -> CliResult<()> {
    match action {
        SettingsCommand::Show { key: Some(key) } => print_output(&d.settings().get(&key)?, format),
        SettingsCommand::Show { key: None } => print_output(d.settings(), format),
        SettingsCommand::Set { key, value } => {
            d.set_setting(&key, &value)?;
            let stored = d.settings().get(&key)?;
            print_output(&serde_json::json!({ "ok": true, key: stored }), format)
        }
        SettingsCommand::Reset { yes } => {
            d.reset_settings(&mut confirmer(yes))?;
            print_output(&serde_json::json!({ "ok": true, "reset": true }), format)
        }
        SettingsCommand::Export { output } => {
            let export = d.settings().export(d.now());
            let default_name = format!(
                "{}-settings-{}.json",
                d.settings().file_prefix(),
                d.today().format("%Y-%m-%d")
            );
            let path = output.unwrap_or_else(|| PathBuf::from(default_name));
            std::fs::write(&path, serde_json::to_string_pretty(&export)?)?;
            print_output(&serde_json::json!({ "ok": true, "file": path }), format)
        }
    }
}

/// `--yes` approves up front; otherwise ask on the terminal.
fn confirmer(yes: bool) -> impl FnMut(&str) -> bool {
    move |prompt: &str| yes || ask(prompt)
}

fn ask(prompt: &str) -> bool {
    let mut stderr = std::io::stderr();
    if write!(stderr, "{prompt} [y/N] ").and_then(|_| stderr.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn write_text(output: Option<&Path>, text: &str) -> CliResult<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn print_output<T: Serialize + ?Sized>(value: &T, format: &OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
