//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::comparison::escalation_schedule;
use crate::domain::config_validation::{
    PRICES, SIMULATION, optional_parsed, read_date, read_dip_rules, read_f64, read_u32,
    validate_price_source, validate_simulation_config,
};
use crate::domain::engine::{self, StrategyReport};
use crate::domain::error::SipsimError;
use crate::domain::presets::{
    DEFAULT_AMOUNT, DEFAULT_ANNUAL_INCREASE_PCT, DEFAULT_DAY_OF_MONTH, DEFAULT_LOOKBACK_DAYS,
    DipPreset, PeriodicPreset, StepUpPreset, default_dip_rules,
};
use crate::domain::price::PriceLookup;
use crate::domain::returns::{SimulationResult, money_weighted_return};
use crate::domain::strategy::{
    DateRange, EscalatingParams, PeriodicParams, StrategyConfig, StrategyKind, ThresholdParams,
};
use crate::domain::threshold::DipRules;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceOracle;

#[derive(Parser, Debug)]
#[command(name = "sipsim", about = "Periodic investment plan simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [simulation] strategy
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        /// Write the ledger to this CSV file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also run the periodic baseline and compare (or set [simulation] compare)
        #[arg(long)]
        compare: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the available price history
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
    },
    /// List the built-in presets
    Presets,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            strategy,
            output,
            compare,
            dry_run,
        } => {
            if dry_run {
                run_validate(&config, strategy)
            } else {
                run_simulate(&config, strategy, output.as_deref(), compare)
            }
        }
        Command::Info { config } => run_info(&config),
        Command::Validate { config, strategy } => run_validate(&config, strategy),
        Command::Presets => run_presets(),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| fail(&err))
}

fn fail(err: &SipsimError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn run_simulate(
    config_path: &Path,
    strategy: Option<StrategyKind>,
    output_path: Option<&Path>,
    compare: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let kind = match validate_simulation_config(&adapter, strategy) {
        Ok(k) => k,
        Err(e) => return fail(&e),
    };
    let strategy_config = match build_strategy_config(&adapter, kind) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let oracle = match open_price_source(&adapter) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    let compare = compare_requested(&adapter, compare);
    match run_simulation_pipeline(oracle.as_ref(), &strategy_config, compare, output_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

/// `--compare` on the command line, or `[simulation] compare = yes`.
pub fn compare_requested(config: &dyn ConfigPort, flag: bool) -> bool {
    flag || config.get_bool(SIMULATION, "compare", false)
}

/// Simulate, print the summary to stderr and write the ledger.
pub fn run_simulation_pipeline(
    oracle: &(dyn PriceOracle + Sync),
    config: &StrategyConfig,
    compare: bool,
    output_path: Option<&Path>,
) -> Result<(), SipsimError> {
    let range = config.range();
    eprintln!(
        "Simulating {} plan from {} to {}...",
        config.kind(),
        range.start,
        range.end
    );

    let report = if compare {
        engine::run_with_baseline(oracle, config)?
    } else {
        engine::run_report(oracle, config)?
    };

    let valuation_date = oracle.available_range()?.map(|(_, last, _)| last);
    print_report(&report, valuation_date);

    if let StrategyConfig::Escalating { range, params } = config {
        eprintln!("\nContribution per year:");
        let schedule = escalation_schedule(
            range.start,
            range.end,
            params.initial_amount,
            params.annual_increase_pct,
            params.day_of_month,
        );
        for entry in schedule {
            eprintln!("  {}: {:.2}", entry.year, entry.amount);
        }
    }

    match output_path {
        Some(path) => {
            csv_adapter::write_ledger_file(path, &report.result.ledger)?;
            eprintln!("\nLedger written to {}", path.display());
        }
        None => csv_adapter::write_ledger(io::stdout().lock(), &report.result.ledger)?,
    }
    Ok(())
}

fn print_report(report: &StrategyReport, valuation_date: Option<chrono::NaiveDate>) {
    eprintln!();
    print_result("Strategy", &report.result);

    if let Some(date) = valuation_date {
        match money_weighted_return(&report.result.ledger, report.result.current_value, date) {
            Some(rate) => eprintln!("  Money-weighted return:  {:.2}% (as of {date})", rate * 100.0),
            None => eprintln!("  Money-weighted return:  n/a"),
        }
    }

    if let Some(stats) = &report.dip_stats {
        eprintln!(
            "  Dip purchases:          {} totalling {:.2} ({:.1}% of invested)",
            stats.count, stats.amount, stats.share_pct
        );
    }

    if let Some(baseline) = &report.baseline {
        eprintln!();
        print_result("Periodic baseline", baseline);
    }

    if let Some(cmp) = &report.comparison {
        eprintln!("\nAgainst baseline:");
        eprintln!("  Additional wealth:      {:.2}", cmp.additional_wealth);
        eprintln!(
            "  Annualized return:      {:+.2} percentage points",
            cmp.annualized_return_delta_pct
        );
        eprintln!("  Extra investment:       {:.2}", cmp.extra_investment);
    }
}

fn print_result(title: &str, result: &SimulationResult) {
    eprintln!("{title}:");
    eprintln!("  Purchases:              {}", result.ledger.len());
    eprintln!("  Total invested:         {:.2}", result.total_invested);
    eprintln!("  Current value:          {:.2}", result.current_value);
    eprintln!("  Total returns:          {:.2}", result.total_returns);
    eprintln!("  Units held:             {:.4}", result.total_units);
    match result.average_price {
        Some(avg) => eprintln!("  Average price:          {avg:.4}"),
        None => eprintln!("  Average price:          n/a"),
    }
    eprintln!(
        "  Annualized return:      {:.2}% (estimate)",
        result.annualized_return * 100.0
    );
}

/// Build the typed strategy from its config section.
///
/// A `preset` key supplies the starting values; explicit keys override it.
pub fn build_strategy_config(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<StrategyConfig, SipsimError> {
    let range = DateRange::new(
        read_date(config, SIMULATION, "start_date")?,
        read_date(config, SIMULATION, "end_date")?,
    );
    let section = kind.name();

    let strategy = match kind {
        StrategyKind::Periodic => {
            let preset = optional_parsed::<PeriodicPreset>(config, section, "preset")?;
            let amount = read_f64(config, section, "amount")?
                .or(preset.map(PeriodicPreset::amount))
                .unwrap_or(DEFAULT_AMOUNT);
            StrategyConfig::Periodic {
                range,
                params: PeriodicParams {
                    amount,
                    day_of_month: read_u32(config, section, "day_of_month")?
                        .unwrap_or(DEFAULT_DAY_OF_MONTH),
                },
            }
        }
        StrategyKind::Escalating => {
            let (preset_amount, preset_pct) =
                optional_parsed::<StepUpPreset>(config, section, "preset")?
                    .map(StepUpPreset::parameters)
                    .unwrap_or((DEFAULT_AMOUNT, DEFAULT_ANNUAL_INCREASE_PCT));
            StrategyConfig::Escalating {
                range,
                params: EscalatingParams {
                    initial_amount: read_f64(config, section, "initial_amount")?
                        .unwrap_or(preset_amount),
                    annual_increase_pct: read_f64(config, section, "annual_increase_pct")?
                        .unwrap_or(preset_pct),
                    day_of_month: read_u32(config, section, "day_of_month")?
                        .unwrap_or(DEFAULT_DAY_OF_MONTH),
                },
            }
        }
        StrategyKind::Threshold => {
            let dip_rules = match read_dip_rules(config, section)? {
                Some(rules) => rules,
                None => {
                    let rules = optional_parsed::<DipPreset>(config, section, "preset")?
                        .map(DipPreset::rules)
                        .unwrap_or_else(default_dip_rules);
                    DipRules::new(rules)?
                }
            };
            StrategyConfig::Threshold {
                range,
                params: ThresholdParams {
                    base_amount: read_f64(config, section, "base_amount")?
                        .unwrap_or(DEFAULT_AMOUNT),
                    dip_rules,
                    lookback_days: read_u32(config, section, "lookback_days")?
                        .unwrap_or(DEFAULT_LOOKBACK_DAYS),
                },
            }
        }
    };

    strategy.validate()?;
    Ok(strategy)
}

/// Open the price source named by `[prices] source`.
pub fn open_price_source(
    config: &dyn ConfigPort,
) -> Result<Box<dyn PriceOracle + Sync>, SipsimError> {
    validate_price_source(config)?;
    let source = config
        .get_string(PRICES, "source")
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if source == "sqlite" {
        return open_sqlite(config);
    }

    let lookup = optional_parsed::<PriceLookup>(config, PRICES, "lookup")?.unwrap_or_default();
    let path = config
        .get_string(PRICES, "path")
        .ok_or_else(|| SipsimError::ConfigMissing {
            section: PRICES.into(),
            key: "path".into(),
        })?;
    eprintln!("Loading prices from {path}");
    Ok(Box::new(csv_adapter::load_prices(Path::new(&path), lookup)?))
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<Box<dyn PriceOracle + Sync>, SipsimError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<Box<dyn PriceOracle + Sync>, SipsimError> {
    Err(SipsimError::ConfigInvalid {
        section: PRICES.into(),
        key: "source".into(),
        reason: "sqlite feature is required for source = sqlite".into(),
    })
}

fn run_validate(config_path: &Path, strategy: Option<StrategyKind>) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let kind = match validate_simulation_config(&adapter, strategy) {
        Ok(k) => k,
        Err(e) => return fail(&e),
    };
    let strategy_config = match build_strategy_config(&adapter, kind) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    eprintln!("\n{}", describe(&strategy_config));
    if let Some(baseline) = engine::baseline_for(&strategy_config) {
        eprintln!("\nBaseline:\n{}", describe(&baseline));
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

/// Human-readable summary of a strategy's parameters.
pub fn describe(config: &StrategyConfig) -> String {
    let range = config.range();
    let header = format!(
        "  strategy:      {}\n  period:        {} to {}",
        config.kind(),
        range.start,
        range.end
    );
    let body = match config {
        StrategyConfig::Periodic { params, .. } => format!(
            "  amount:        {:.2}\n  day of month:  {}",
            params.amount, params.day_of_month
        ),
        StrategyConfig::Escalating { params, .. } => format!(
            "  initial:       {:.2}\n  step-up:       {}% per year\n  day of month:  {}",
            params.initial_amount, params.annual_increase_pct, params.day_of_month
        ),
        StrategyConfig::Threshold { params, .. } => format!(
            "  base amount:   {:.2} on day 1\n  lookback:      {} days\n  dip rules:     {}",
            params.base_amount, params.lookback_days, params.dip_rules
        ),
    };
    format!("{header}\n{body}")
}

fn run_info(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let oracle = match open_price_source(&adapter) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    match oracle.available_range() {
        Ok(Some((first, last, count))) => {
            println!("{count} prices, {first} to {last}");
            match oracle.current_price() {
                Ok(price) => println!("latest close: {price}"),
                Err(e) => return fail(&e),
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("no price data found");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_presets() -> ExitCode {
    println!("periodic:");
    for preset in PeriodicPreset::ALL {
        println!("  {:<14} {:.0} per month", preset.name(), preset.amount());
    }
    println!("escalating:");
    for preset in StepUpPreset::ALL {
        let (amount, pct) = preset.parameters();
        println!("  {:<14} {amount:.0} per month, +{pct}% per year", preset.name());
    }
    println!("threshold:");
    for preset in DipPreset::ALL {
        let rules: Vec<String> = preset.rules().iter().map(|r| r.to_string()).collect();
        println!("  {:<14} {}", preset.name(), rules.join(", "));
    }
    ExitCode::SUCCESS
}
