use std::sync::Arc;

use anyhow::{Context, Result};
use bookings_api::{
    config::{self, AppConfig},
    db::{self, DbPool},
    events::{Event, EventSender},
    models::{RawStatus, ServicePointStatus},
    services::schedules::{GenerateScheduleInput, ScheduleService},
};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "bookings",
    about = "Maintenance CLI for the bookings API",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Generate schedule slots for a service point
    GenerateSchedule(GenerateScheduleArgs),
    /// Show the canonical status for legacy values
    NormalizeStatus(NormalizeStatusArgs),
}

#[derive(Args)]
struct GenerateScheduleArgs {
    /// Service point ID
    #[arg(long)]
    service_point: Uuid,
    /// First date, YYYY-MM-DD
    #[arg(long)]
    from: NaiveDate,
    /// Last date (inclusive), YYYY-MM-DD
    #[arg(long)]
    to: NaiveDate,
    /// Slot length overriding each post's own
    #[arg(long)]
    slot_minutes: Option<u32>,
    /// Restrict generation to these posts
    #[arg(long = "post", value_name = "POST_ID")]
    posts: Vec<Uuid>,
}

#[derive(Args)]
struct NormalizeStatusArgs {
    /// Values to normalize, e.g. "работает" 1 false
    #[arg(required = true)]
    values: Vec<String>,
}

#[derive(Serialize)]
struct NormalizedRow {
    input: String,
    status: ServicePointStatus,
    recognized: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::NormalizeStatus(args) => normalize_status(args, cli.json),
        Commands::Migrate => {
            let context = CliContext::initialize().await?;
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
            Ok(())
        }
        Commands::GenerateSchedule(args) => {
            let context = CliContext::initialize().await?;
            generate_schedule(&context, args, cli.json).await
        }
    }
}

async fn generate_schedule(context: &CliContext, args: GenerateScheduleArgs, json: bool) -> Result<()> {
    let service = ScheduleService::new(
        context.db.clone(),
        context.event_sender.clone(),
        context.config.max_schedule_days,
    );

    let input = GenerateScheduleInput {
        start_date: args.from,
        end_date: args.to,
        slot_duration_minutes: args.slot_minutes,
        post_ids: (!args.posts.is_empty()).then_some(args.posts),
    };
    let report = service
        .generate(args.service_point, input)
        .await
        .context("failed to generate schedule")?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "Service point {}: {} slot(s) created, {} skipped over {} day(s) ({} working)",
            report.service_point_id, report.created, report.skipped, report.days, report.working_days
        );
    }
    Ok(())
}

fn normalize_status(args: NormalizeStatusArgs, json: bool) -> Result<()> {
    let rows: Vec<NormalizedRow> = args
        .values
        .into_iter()
        .map(|input| {
            let recognized = ServicePointStatus::recognize(&RawStatus::Text(input.clone()));
            NormalizedRow {
                status: recognized.unwrap_or_default(),
                recognized: recognized.is_some(),
                input,
            }
        })
        .collect();

    if json {
        print_json(&rows)?;
    } else {
        for row in &rows {
            let note = if row.recognized { "" } else { " (unknown, default)" };
            println!("{:>24} -> {}{}", row.input, row.status, note);
        }
    }
    Ok(())
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        let db = Arc::new(db_pool);

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(32);
        let event_sender = Arc::new(EventSender::new(event_tx));

        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!(target: "bookings_cli", event = ?event, "received async event");
            }
        });

        Ok(Self {
            config,
            db,
            event_sender,
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
