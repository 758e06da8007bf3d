use clap::Parser;
use order_kpi::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Order KPI - verified order and customer metrics");
    println!("===============================================");
    println!();
    println!("Clean customer and order line-item CSV files, derive one header per");
    println!("order, and compute KPIs cross-checked by two independent engines.");
    println!();
    println!("USAGE:");
    println!("    order-kpi <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    run            Run the pipeline and record the snapshot (main command)");
    println!("    check-config   Validate a TOML configuration file");
    println!("    help           Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Compute KPIs with default thresholds:");
    println!("    order-kpi run --customers customers.csv --orders orders.csv");
    println!();
    println!("    # Indian Standard Time month buckets, top 10 rankings, JSON output:");
    println!("    order-kpi run -c customers.csv -r orders.csv --utc-offset +05:30 \\");
    println!("                  --top-n 10 --format json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    order-kpi <COMMAND> --help");
}
