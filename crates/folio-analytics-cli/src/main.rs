mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::comparison::CompareArgs;
use commands::dashboard::DashboardArgs;
use commands::performance::{ChartArgs, HoldingsArgs, PerformanceArgs};
use commands::risk::NavSeriesArgs;
use commands::xirr::XirrArgs;

/// Portfolio performance and risk analytics
#[derive(Parser)]
#[command(
    name = "fola",
    version,
    about = "Portfolio performance and risk analytics",
    long_about = "A CLI for personal portfolio analytics with decimal precision. \
                  Computes XIRR, equity curves, monthly returns, volatility, Sharpe ratio, \
                  drawdown, multi-portfolio comparisons and net-worth dashboards from \
                  transaction and NAV snapshot records."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Analytics config file (JSON, or YAML by extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log solver and normalization details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Annualized money-weighted return (XIRR) of dated cash flows
    Xirr(XirrArgs),
    /// Performance summary: invested, withdrawn, NAV, equity, profit, XIRR
    Performance(PerformanceArgs),
    /// Equity-curve series for charting
    Chart(ChartArgs),
    /// Open stock positions at average cost, valued at latest prices
    Holdings(HoldingsArgs),
    /// Month-over-month returns from a NAV series
    MonthlyReturns(NavSeriesArgs),
    /// Volatility, Sharpe ratio, drawdown, win rate, best/worst month
    Risk(NavSeriesArgs),
    /// Rebased comparison of up to five portfolios
    Compare(CompareArgs),
    /// Net-worth totals and per-asset-type rollup
    Dashboard(DashboardArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<Option<serde_json::Value>, Box<dyn std::error::Error>> {
    if let Commands::Version = cli.command {
        println!("fola {}", env!("CARGO_PKG_VERSION"));
        return Ok(None);
    }

    let config = input::file::load_config(cli.config.as_deref())?;
    let value = match cli.command {
        Commands::Xirr(args) => commands::xirr::run_xirr(args, &config),
        Commands::Performance(args) => commands::performance::run_performance(args, &config),
        Commands::Chart(args) => commands::performance::run_chart(args),
        Commands::Holdings(args) => commands::performance::run_holdings(args),
        Commands::MonthlyReturns(args) => commands::risk::run_monthly_returns(args),
        Commands::Risk(args) => commands::risk::run_risk(args, &config),
        Commands::Compare(args) => commands::comparison::run_compare(args, &config),
        Commands::Dashboard(args) => commands::dashboard::run_dashboard(args),
        Commands::Version => return Ok(None),
    }?;
    Ok(Some(value))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = cli.output.clone();

    match run(cli) {
        Ok(Some(value)) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Ok(None) => process::exit(0),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
