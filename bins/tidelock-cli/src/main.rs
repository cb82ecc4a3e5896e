//! tidelock: operator command line for the Tidelock staking ledger.
//!
//! Prints APR curve tables, quotes hypothetical positions and runs a scripted
//! position lifecycle against in-memory collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use tidelock_core::constants::{SCALE, SECONDS_PER_DAY};
use tidelock_core::params::ParameterSnapshot;
use tidelock_core::traits::{Clock, TokenCustody};
use tidelock_core::types::{Address, Timestamp};
use tidelock_curves::{lock_factor, position_apr, voting_power};
use tidelock_ledger::{
    EventLog, LedgerConfig, ManualClock, MemoryCustody, StakingLedger, StaticParams, TreasuryGate,
};

mod quote;

use quote::{pct, select_window};

#[derive(Parser)]
#[command(name = "tidelock", version, about = "Time-locked staking ledger tools")]
struct Cli {
    /// TOML configuration file (TIDELOCK__* environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// APR, lock factor and voting share for every allowed lock duration.
    Curve(CurveArgs),
    /// Projected returns for a hypothetical position.
    Quote(QuoteArgs),
    /// Open, claim and close a position against an in-memory ledger.
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct CurveArgs {
    /// Stake size in token units
    #[arg(long, default_value_t = 50_000)]
    size: u128,

    /// Use the boosted APR window
    #[arg(long)]
    boosted: bool,
}

#[derive(Args)]
struct QuoteArgs {
    /// Stake size in token units
    #[arg(long)]
    amount: u128,

    /// Lock duration in months
    #[arg(long)]
    months: u32,

    /// Holding period for the reward projection
    #[arg(long, default_value_t = 7)]
    days: u64,

    /// Use the boosted APR window
    #[arg(long)]
    boosted: bool,
}

#[derive(Args)]
struct SimulateArgs {
    /// Stake size in token units
    #[arg(long, default_value_t = 1_000_000)]
    amount: u128,

    /// Lock duration in months
    #[arg(long, default_value_t = 12)]
    months: u32,

    /// Reward funding pulled from the treasury before the position opens
    #[arg(long, default_value_t = 1_000_000)]
    funding: u128,

    /// Days to wait before the single claim
    #[arg(long, default_value_t = 7)]
    claim_after_days: u64,

    /// Skip ahead to unlock and close the position after claiming
    #[arg(long)]
    close: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let config = LedgerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    info!(config = ?cli.config, "configuration loaded");

    match cli.command {
        Commands::Curve(args) => curve(&config.params, args),
        Commands::Quote(args) => print_quote(&config.params, args),
        Commands::Simulate(args) => simulate(&config, args),
    }
}

fn curve(params: &ParameterSnapshot, args: CurveArgs) -> Result<()> {
    let window = select_window(params, args.boosted);
    println!(
        "APR window {} .. {} at size {}",
        pct(window.base),
        pct(window.max),
        args.size
    );
    println!("{:>6}  {:>10}  {:>10}  {:>12}", "months", "lock", "apr", "voting");
    for months in params.min_lock_months..=params.max_lock_months {
        let f_lock = lock_factor(months, params.lock_curvature)?;
        let apr = position_apr(params, window, months, args.size)?;
        let vote = voting_power(SCALE, months, params.voting_floor, params.voting_curvature)?;
        println!("{months:>6}  {:>10}  {:>10}  {:>12}", ratio(f_lock), pct(apr), ratio(vote));
    }
    Ok(())
}

fn print_quote(params: &ParameterSnapshot, args: QuoteArgs) -> Result<()> {
    let q = quote::quote(params, args.amount, args.months, args.days, args.boosted)?;
    println!("{q}");
    Ok(())
}

fn simulate(config: &LedgerConfig, args: SimulateArgs) -> Result<()> {
    let treasury = config.treasury.unwrap_or(Address::from_seed(0xee));
    let staker = Address::from_seed(0x01);
    let start = match config.program_start {
        Some(start) => start,
        None => u64::try_from(Utc::now().timestamp()).context("system clock before epoch")?,
    };

    let custody = Arc::new(MemoryCustody::new(Address::from_seed(0xcc)));
    custody.mint(&treasury, args.funding);
    custody.mint(&staker, args.amount);
    let clock = Arc::new(ManualClock::new(start));
    let log = Arc::new(EventLog::new());
    let ledger = StakingLedger::new(
        custody.clone(),
        Arc::new(StaticParams(config.params.clone())),
        clock.clone(),
    )
    .with_gate(Arc::new(TreasuryGate::new(treasury)))
    .with_events(log.clone())
    .with_program_start(start);

    if args.funding > 0 {
        ledger.fund(&treasury, args.funding).context("funding rewards")?;
    }
    let id = ledger.open(&staker, args.amount, args.months).context("opening position")?;
    println!("opened {id} at {}, unlocks {}", date(start), date(ledger.unlock_time(&staker, id)?));

    let now = clock.advance(args.claim_after_days.saturating_mul(SECONDS_PER_DAY));
    println!(
        "{}: pending {} at {}",
        date(now),
        ledger.pending_reward(&staker, id)?,
        pct(ledger.current_apr(&staker, id)?)
    );
    let reward = ledger.claim(&staker, id).context("claiming")?;
    println!("{}: claimed {reward}", date(now));

    if args.close {
        let unlock = ledger.unlock_time(&staker, id)?;
        clock.set(unlock.max(clock.now()));
        let (principal, reward) = ledger.close(&staker, id).context("closing")?;
        println!("{}: closed, principal {principal}, reward {reward}", date(unlock));
    }

    println!("--- events ---");
    for event in log.take() {
        println!("{}", serde_json::to_string(&event)?);
    }
    let stats = ledger.reward_stats();
    println!("--- totals ---");
    println!("staked {}  distributed {}  available {}", stats.total_staked, stats.distributed, stats.available);
    println!("staker balance {}", custody.balance_of(&staker));
    ledger.check_invariants().context("post-simulation audit")?;
    Ok(())
}

fn ratio(value: u128) -> String {
    format!("{:.6}", value as f64 / SCALE as f64)
}

fn date(ts: Timestamp) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map_or_else(|| ts.to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string())
}

/// Initialize tracing with the given level and output format.
///
/// `RUST_LOG` takes precedence over `level` when set.
fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
