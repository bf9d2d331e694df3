//! Binance USDT-M futures trading bot.
//!
//! Runs a fleet of strategy instances (volatility breakout and momentum
//! retracement), each on its own poll loop, against a shared exchange
//! client.

mod api;
mod error;
mod models;
mod scheduler;
mod trading;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::{Account, BinanceFutures, MarketData, PaperGateway};
use crate::models::CandleInterval;
use crate::scheduler::Scheduler;
use crate::trading::{
    breakout_levels, default_fleet, movement_reading, Bias, SignalSpec, StrategyEngine,
};

/// Futures trading bot CLI.
#[derive(Parser)]
#[command(name = "futures-pilot")]
#[command(about = "Run breakout and momentum strategies on Binance USDT-M futures", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the strategy fleet
    Run {
        /// Log orders instead of submitting them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the configured strategy fleet
    Config,

    /// Fetch candles and print what the signal would do right now
    Signal {
        /// Futures symbol, e.g. BTCUSDT
        #[arg(short, long)]
        symbol: String,

        /// Signal variant to evaluate
        #[arg(short, long, value_enum, default_value = "breakout")]
        variant: SignalVariant,

        /// Candle interval
        #[arg(short, long, default_value = "15m")]
        interval: CandleInterval,

        /// Breakout range multiplier
        #[arg(short, long, default_value = "0.5")]
        k: Decimal,

        /// Movement threshold (fraction, e.g. 0.03)
        #[arg(short, long, default_value = "0.03")]
        threshold: Decimal,

        /// Movement lookback in candles
        #[arg(long, default_value = "6")]
        lookback: usize,
    },

    /// Show the USDT wallet balance
    Balance,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SignalVariant {
    Breakout,
    Movement,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run { dry_run } => run_fleet(dry_run).await?,

        Commands::Config => print_fleet(),

        Commands::Signal {
            symbol,
            variant,
            interval,
            k,
            threshold,
            lookback,
        } => {
            let spec = match variant {
                SignalVariant::Breakout => SignalSpec::Breakout { k },
                SignalVariant::Movement => SignalSpec::Movement {
                    threshold,
                    lookback,
                },
            };
            preview_signal(&symbol, interval, &spec).await?;
        }

        Commands::Balance => {
            let client = BinanceFutures::from_env()?;
            let balance = client.fetch_balance().await?;
            println!("USDT wallet balance: {balance}");
        }
    }

    Ok(())
}

async fn run_fleet(dry_run: bool) -> Result<()> {
    let fleet = default_fleet();
    for config in &fleet {
        config.validate()?;
    }

    let client = BinanceFutures::from_env()?;

    println!("\n=== Futures Pilot ===");
    println!("Strategies: {}", fleet.len());
    println!(
        "Mode: {}",
        if dry_run {
            "DRY RUN (no real orders)"
        } else {
            "LIVE TRADING"
        }
    );
    println!("\nPress Ctrl+C to stop.\n");

    let mut scheduler = Scheduler::new();
    for config in fleet {
        info!(
            strategy = %config.name,
            symbol = %config.symbol,
            interval = %config.interval,
            variant = config.signal.variant_name(),
            leverage = config.leverage,
            "spawning strategy"
        );

        if dry_run {
            scheduler.spawn(StrategyEngine::new(
                config,
                client.clone(),
                client.clone(),
                PaperGateway::new(),
            ));
        } else {
            scheduler.spawn(StrategyEngine::new(
                config,
                client.clone(),
                client.clone(),
                client.clone(),
            ));
        }
    }

    scheduler.run_until_shutdown().await;
    Ok(())
}

fn print_fleet() {
    println!("\n=== Strategy Fleet ===");
    for config in default_fleet() {
        println!("\n[{}]", config.name);
        println!("  Symbol:        {}", config.symbol);
        println!("  Interval:      {}", config.interval);
        match &config.signal {
            SignalSpec::Breakout { k } => {
                println!("  Signal:        breakout (k = {k})");
            }
            SignalSpec::Movement {
                threshold,
                lookback,
            } => {
                println!(
                    "  Signal:        movement (threshold = {threshold}, lookback = {lookback})"
                );
            }
        }
        println!("  Allocation:    {}", config.allocation);
        println!("  Leverage:      {}x", config.leverage);
        match config.profit_target {
            Some(target) => println!("  Profit Target: {}", target),
            None => println!("  Profit Target: off"),
        }
        println!(
            "  Trailing Exit: {}",
            if config.trailing_exit { "on" } else { "off" }
        );
        println!("  Max Hold Bars: {}", config.max_hold_bars);
        println!("  Cooldown:      {}s", config.cooldown_secs);
    }
}

async fn preview_signal(
    symbol: &str,
    interval: CandleInterval,
    spec: &SignalSpec,
) -> Result<()> {
    let client = BinanceFutures::public()?;

    let limit = spec.lookback().max(2) as u32;
    let window = client.fetch_candles(symbol, interval, limit).await?;
    let price = client.fetch_price(symbol).await?;

    println!("\n=== Signal Preview ===");
    println!("Symbol:   {symbol}");
    println!("Interval: {interval}");
    println!("Candles:  {}", window.len());
    println!("Price:    {price}");

    match spec {
        SignalSpec::Breakout { k } => match breakout_levels(&window, *k) {
            Some(levels) => {
                println!("Buy level:  {}", levels.buy_level);
                println!("Sell level: {}", levels.sell_level);
            }
            None => println!("Not enough candles for breakout levels."),
        },
        SignalSpec::Movement {
            threshold,
            lookback,
        } => match movement_reading(&window, *lookback, *threshold) {
            Some(reading) => {
                println!("Movement: {}", reading.magnitude);
                println!("Retrace:  {}", reading.retrace_level);
            }
            None => println!("Movement below threshold or window too short."),
        },
    }

    match spec.evaluate(&window, price) {
        Some(Bias::Long) => println!("Bias: LONG"),
        Some(Bias::Short) => println!("Bias: SHORT"),
        None => println!("Bias: none"),
    }

    Ok(())
}
