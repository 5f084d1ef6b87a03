use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use dentalflow_application::command_bus::CommandBus;
use dentalflow_application::config::LabSettings;
use dentalflow_application::context::{Actor, AppContext};
use dentalflow_application::query_bus::QueryBus;
use dentalflow_application::work_orders::{
    FinishClinicWorkOrders, GetLabReport, GetWorkOrderStatistics, GroupedWorkOrdersDto,
    ListGroupedWorkOrders, register_handlers,
};
use dentalflow_application::{InMemoryCommandBus, InMemoryQueryBus, InMemoryWorkOrderStore};
use dentalflow_domain::filter::WorkOrderFilter;
use dentalflow_domain::membership::Role;
use dentalflow_domain::report::ReportPeriod;
use dentalflow_domain::work_order::{ClinicId, WorkOrderRecord, WorkOrderStatus};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dentalflow")]
#[command(about = "DentalFlow work-order grouping demo over a JSON fixture")]
struct Cli {
    /// Work-order fixture (overrides DENTALFLOW_FIXTURE)
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,
    /// Print JSON instead of a text summary
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Group work orders by clinic and patient, merging duplicate rows
    Grouped {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Dashboard counters over the grouped work orders
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Lab report for a month or a year
    Report {
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12; omit for the whole year
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        clinic: Option<String>,
    },
    /// Mark every open work order of a clinic as finished, then list it
    FinishClinic {
        clinic: String,
    },
}

#[derive(clap::Args, Default)]
struct FilterArgs {
    #[arg(long)]
    clinic: Option<String>,
    /// pending | in_production | finished | delivered
    #[arg(long)]
    status: Option<WorkOrderStatus>,
    /// Case-insensitive patient name fragment
    #[arg(long)]
    patient: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    month: Option<u32>,
}

impl From<FilterArgs> for WorkOrderFilter {
    fn from(args: FilterArgs) -> Self {
        WorkOrderFilter {
            clinic_id: args.clinic.map(ClinicId::new),
            status: args.status,
            patient: args.patient,
            year: args.year,
            month: args.month,
            ..Default::default()
        }
    }
}

fn load_fixture(path: &std::path::Path) -> anyhow::Result<Vec<WorkOrderRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    let records = serde_json::from_str(&raw)
        .with_context(|| format!("parsing fixture {}", path.display()))?;
    Ok(records)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_grouped(dto: &GroupedWorkOrdersDto) {
    println!(
        "Showing {} of {} records as {} work orders",
        dto.shown_records, dto.total_records, dto.aggregate_count
    );
    for clinic in &dto.clinics {
        println!("{}", clinic.clinic_id);
        for patient in &clinic.patients {
            println!("  {}", patient.patient_name);
            for w in &patient.work_orders {
                let merged = if w.merged {
                    format!(" (merged from {} records)", w.source_ids.len())
                } else {
                    String::new()
                };
                println!(
                    "    {} {} {} services, total {}{}",
                    w.created_at.date_naive(),
                    w.status,
                    w.service_count,
                    w.total_price,
                    merged
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dentalflow=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut settings = LabSettings::from_env()?;
    if let Some(fixture) = cli.fixture {
        settings = settings.with_fixture_path(fixture)?;
    }

    let records = load_fixture(settings.fixture_path())?;
    tracing::info!(
        records = records.len(),
        fixture = %settings.fixture_path().display(),
        "fixture loaded"
    );

    let store = Arc::new(InMemoryWorkOrderStore::with_records(records));
    let commands = InMemoryCommandBus::new();
    let queries = InMemoryQueryBus::new();
    register_handlers(&commands, &queries, store, settings)?;

    let ctx = AppContext::builder()
        .actor(Actor::builder().id("demo").role(Role::Admin).build())
        .build();

    match cli.command.unwrap_or(Commands::Grouped {
        filter: FilterArgs::default(),
    }) {
        Commands::Grouped { filter } => {
            let q = ListGroupedWorkOrders {
                filter: filter.into(),
            };
            let dto = queries.dispatch(&ctx, q).await?;
            if cli.json {
                print_json(&dto)?;
            } else {
                print_grouped(&dto);
            }
        }
        Commands::Stats { filter } => {
            let q = GetWorkOrderStatistics {
                filter: filter.into(),
            };
            let dto = queries.dispatch(&ctx, q).await?;
            if cli.json {
                print_json(&dto)?;
            } else {
                println!(
                    "{} work orders: {} in progress, {} completed, revenue {}",
                    dto.total, dto.in_progress, dto.completed, dto.revenue
                );
            }
        }
        Commands::Report { year, month, clinic } => {
            let year = year.unwrap_or_else(|| Utc::now().year());
            let period = match month {
                Some(month) => ReportPeriod::Month { year, month },
                None => ReportPeriod::Year { year },
            };
            let q = GetLabReport {
                period,
                clinic_id: clinic.map(ClinicId::new),
            };
            let dto = queries.dispatch(&ctx, q).await?;
            if cli.json {
                print_json(&dto)?;
            } else {
                let totals = &dto.report.totals;
                println!(
                    "{} to {}: {} work orders, {} services",
                    dto.from, dto.to, dto.report.record_count, dto.report.service_count
                );
                println!(
                    "gross {} tax {} ({}%) net {}",
                    totals.gross, totals.tax, totals.percent, totals.net
                );
            }
        }
        Commands::FinishClinic { clinic } => {
            let clinic_id = ClinicId::new(clinic);
            commands
                .dispatch(
                    &ctx,
                    FinishClinicWorkOrders {
                        clinic_id: clinic_id.clone(),
                    },
                )
                .await?;
            let q = ListGroupedWorkOrders {
                filter: WorkOrderFilter {
                    clinic_id: Some(clinic_id),
                    ..Default::default()
                },
            };
            let dto = queries.dispatch(&ctx, q).await?;
            if cli.json {
                print_json(&dto)?;
            } else {
                print_grouped(&dto);
            }
        }
    }

    Ok(())
}
