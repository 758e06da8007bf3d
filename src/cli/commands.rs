//! Command implementations for the order KPI CLI
//!
//! Loads the two sources, runs the pipeline, records the run history and
//! prints the report.

use crate::app::adapters::csv_source::{read_customers, read_orders};
use crate::app::adapters::run_history::RunHistory;
use crate::app::models::snapshot::{KpiSnapshot, Metric, MetricValue};
use crate::app::services::pipeline::{PipelineRunner, RunReport};
use crate::cli::args::{Args, CheckConfigArgs, Commands, OutputFormat, RunArgs};
use crate::config::PipelineConfig;
use crate::constants::MINOR_UNITS_PER_MAJOR;
use anyhow::{Context, Result};
use chrono::Utc;
use colored::*;
use std::time::Instant;
use tracing::{debug, info};

/// Dispatch a parsed command line
pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Commands::Run(run_args)) => run_pipeline(&run_args),
        Some(Commands::CheckConfig(check_args)) => check_config(&check_args),
        None => Ok(()),
    }
}

fn run_pipeline(args: &RunArgs) -> Result<()> {
    let start_time = Instant::now();
    setup_logging(args.get_log_level(), args.quiet);

    info!("Starting order KPI run");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = args.to_config().context("Failed to build configuration")?;
    debug!("Effective configuration: {:?}", config);

    let customers = read_customers(&args.customers)
        .with_context(|| format!("Failed to read {}", args.customers.display()))?;
    let orders = read_orders(&args.orders)
        .with_context(|| format!("Failed to read {}", args.orders.display()))?;

    let runner = PipelineRunner::new(config);
    let report = runner.run(&customers.rows, &orders.rows, Utc::now());

    if !args.dry_run {
        let history = RunHistory::new(&args.output);
        history
            .append(report.snapshot(), &report.quality_log)
            .context("Failed to record run history")?;
        info!("Run history written to {}", args.output.display());
    }

    match args.format {
        OutputFormat::Human if !args.quiet => {
            print_human_report(&report, customers.skipped.len() + orders.skipped.len());
            println!(
                "\n  {} {}ms",
                "Time elapsed:".bright_cyan(),
                start_time.elapsed().as_millis().to_string().bright_white()
            );
        }
        OutputFormat::Json => {
            if let Some(snapshot) = report.snapshot() {
                println!(
                    "{}",
                    serde_json::to_string_pretty(snapshot).context("Failed to render snapshot")?
                );
            }
        }
        OutputFormat::Human => {}
    }

    match report.result {
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context(format!("KPI run {} failed", report.run_id))),
    }
}

fn check_config(args: &CheckConfigArgs) -> Result<()> {
    let config = PipelineConfig::from_file(&args.path)
        .with_context(|| format!("Invalid configuration in {}", args.path.display()))?;

    println!(
        "{} {}",
        "Configuration OK:".bright_green().bold(),
        args.path.display()
    );
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Set up structured logging on stderr
fn setup_logging(log_level: &str, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("order_kpi={}", log_level)));

    let layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    // try_init: tests and embedding callers may already have a subscriber
    let result = if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_timer(fmt::time::uptime()))
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

fn print_human_report(report: &RunReport, skipped_records: usize) {
    let log = &report.quality_log;

    println!("{}", "Data Quality".bright_green().bold());
    println!(
        "  {} {}/{} valid",
        "Customers:".bright_cyan(),
        log.customers.valid.to_string().bright_white(),
        log.customers.input
    );
    println!(
        "  {} {}/{} valid",
        "Order lines:".bright_cyan(),
        log.order_lines.valid.to_string().bright_white(),
        log.order_lines.input
    );
    println!(
        "  {} {} headers from {} orders",
        "Orders:".bright_cyan(),
        log.orders.headers_emitted.to_string().bright_white(),
        log.orders.distinct_orders
    );
    if log.orders.orders_excluded > 0 {
        println!(
            "  {} {} orders ({} lines) with inconsistent header fields",
            "Excluded:".bright_red(),
            log.orders.orders_excluded.to_string().bright_red().bold(),
            log.orders.lines_excluded
        );
    }
    if !log.contact_conflicts.is_empty() {
        println!(
            "  {} {}",
            "Contact conflicts:".bright_yellow(),
            log.contact_conflicts.len()
        );
    }
    if skipped_records > 0 {
        println!(
            "  {} {}",
            "Unreadable CSV records:".bright_yellow(),
            skipped_records
        );
    }
    for (reason, count) in log.reason_counts() {
        println!("    {:<28} {}", reason.code(), count);
    }

    if let Some(fan_out) = &report.fan_out {
        if fan_out.inflation() > 0 {
            println!(
                "  {} line-level sum would overstate revenue by {}",
                "Fan-out:".bright_cyan(),
                format_minor(fan_out.inflation())
            );
        }
    }
    println!("  {} {}", "Freshness:".bright_cyan(), report.freshness);

    let Some(snapshot) = report.snapshot() else {
        println!("\n{}", "No KPI snapshot produced".bright_red().bold());
        return;
    };

    println!("\n{}", "KPI Snapshot".bright_green().bold());
    print_headline(snapshot);

    match &report.consistency {
        Some(consistency) => println!(
            "\n  {} {} and {} agree on all metrics",
            "Verified:".bright_green(),
            consistency.left_engine,
            consistency.right_engine
        ),
        None => println!(
            "\n  {} computed by {} only",
            "Unverified:".bright_yellow(),
            snapshot.engine()
        ),
    }
}

fn print_headline(snapshot: &KpiSnapshot) {
    let money = |metric: Metric| match snapshot.get(metric) {
        MetricValue::Integer(value) => format_minor(*value),
        MetricValue::Decimal(value) => {
            format!("{:.2}", value / MINOR_UNITS_PER_MAJOR as f64)
        }
        _ => "n/a".to_string(),
    };
    let plain = |metric: Metric| match snapshot.get(metric) {
        MetricValue::Integer(value) => value.to_string(),
        MetricValue::Decimal(value) => format!("{:.2}", value),
        MetricValue::Text(value) => value.clone(),
        _ => "n/a".to_string(),
    };

    let rows = [
        ("Total revenue:", money(Metric::TotalRevenue)),
        ("Orders:", plain(Metric::TotalOrders)),
        ("Average order value:", money(Metric::AvgOrderValue)),
        ("Customers:", plain(Metric::TotalCustomers)),
        ("Active customers:", plain(Metric::ActiveCustomers)),
        ("Repeat rate:", plain(Metric::RepeatRate)),
        ("VIP / Premium / Regular:", format!(
            "{} / {} / {}",
            plain(Metric::VipCustomers),
            plain(Metric::PremiumCustomers),
            plain(Metric::RegularCustomers)
        )),
        ("Unique SKUs:", plain(Metric::UniqueSkus)),
        ("Regions:", plain(Metric::RegionsCount)),
        ("First order:", plain(Metric::FirstOrderAt)),
        ("Last order:", plain(Metric::LastOrderAt)),
    ];
    for (label, value) in rows {
        println!("  {} {}", label.bright_cyan(), value.bright_white());
    }

    if let Some(regions) = snapshot.get(Metric::RevenueByRegion).as_table() {
        println!("  {}", "Revenue by region:".bright_cyan());
        for row in regions {
            let region = row.get("region").and_then(MetricValue::as_str).unwrap_or("?");
            let revenue = row.get("revenue").and_then(MetricValue::as_i64).unwrap_or(0);
            println!("    {:<20} {}", region, format_minor(revenue));
        }
    }
}

/// Minor units as a major-unit amount with two decimals
fn format_minor(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    let per_major = MINOR_UNITS_PER_MAJOR as u64;
    format!("{}{}.{:02}", sign, magnitude / per_major, magnitude % per_major)
}
