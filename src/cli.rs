//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    load_data_config, load_engine_options, validate_data_config, validate_engine_config,
};
use crate::domain::engine::{compute_instruments, EngineOptions};
use crate::domain::error::EngineError;
use crate::domain::ohlcv::Bar;
use crate::domain::registry::{IndicatorRegistry, StrategyRegistry, DEFAULT_STRATEGIES};
use crate::logging;
use crate::ports::data_port::BarProvider;
use crate::ports::result_port::ResultSink;

#[derive(Parser, Debug)]
#[command(
    name = "tickscore",
    about = "Indicator, strategy and composite score engine for daily bars"
)]
pub struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators, strategies and scores for the configured symbols
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma separated symbols, overrides [data] symbols.
        /// Without either, every CSV in the data dir is used.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List indicators and strategies with their parameters
    List {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    logging::init(cli.verbose);
    match cli.command {
        Command::Run {
            config,
            output,
            symbol,
        } => run_scoring(&config, output.as_deref(), symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::List { config } => run_list(config.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        error!("{e}");
        ExitCode::from(&e)
    })
}

/// `--symbol` when given, otherwise the configured list, otherwise every
/// symbol `provider` knows.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    configured: &[String],
    provider: &dyn BarProvider,
) -> Result<Vec<String>, EngineError> {
    match symbol_override {
        Some(raw) => Ok(raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()),
        None if !configured.is_empty() => Ok(configured.to_vec()),
        None => {
            let listed = provider.list_symbols()?;
            info!(symbols = listed.len(), "no symbols configured, using all available");
            Ok(listed)
        }
    }
}

fn run_scoring(
    config_path: &Path,
    output_path: Option<&Path>,
    symbol_override: Option<&str>,
) -> ExitCode {
    info!(config = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let options = match load_engine_options(&adapter) {
        Ok(o) => o,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };
    let data = match load_data_config(&adapter) {
        Ok(d) => d,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };
    let registries = IndicatorRegistry::from_config(&adapter)
        .and_then(|i| StrategyRegistry::from_config(&adapter).map(|s| (i, s)));
    let (indicators, strategies) = match registries {
        Ok(r) => r,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };

    let provider = CsvAdapter::new(data.dir.clone());
    let symbols = match resolve_symbols(symbol_override, &data.symbols, &provider) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };
    if symbols.is_empty() {
        let e = EngineError::ConfigMissing {
            section: "data".to_string(),
            key: "symbols".to_string(),
        };
        error!("{e}");
        return (&e).into();
    }

    let sink = CsvReportAdapter::new(
        output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("output")),
    );

    run_pipeline(
        &provider,
        &sink,
        &symbols,
        (data.start_date, data.end_date),
        &indicators,
        &strategies,
        &options,
    )
}

/// Load, compute and persist every symbol. A symbol that cannot be loaded
/// is skipped; a symbol whose computation fails is logged and does not stop
/// the others. The exit code reflects the first failure, if any.
pub fn run_pipeline(
    provider: &dyn BarProvider,
    sink: &dyn ResultSink,
    symbols: &[String],
    (start_date, end_date): (NaiveDate, NaiveDate),
    indicators: &IndicatorRegistry,
    strategies: &StrategyRegistry,
    options: &EngineOptions,
) -> ExitCode {
    let mut instruments: Vec<(String, Vec<Bar>)> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match provider.get_bars(symbol, start_date, end_date) {
            Ok(bars) if bars.is_empty() => {
                let e = EngineError::NoData {
                    symbol: symbol.clone(),
                };
                warn!("skipping: {e}");
            }
            Ok(bars) => instruments.push((symbol.clone(), bars)),
            Err(e) => warn!(symbol = %symbol, "skipping: {e}"),
        }
    }

    if instruments.is_empty() {
        let e = EngineError::NoData {
            symbol: symbols.join(","),
        };
        error!("{e}");
        return (&e).into();
    }

    info!(
        instruments = instruments.len(),
        indicators = indicators.len(),
        strategies = strategies.len(),
        %start_date,
        %end_date,
        "computing"
    );

    let mut first_failure: Option<ExitCode> = None;
    for (symbol, result) in compute_instruments(&instruments, indicators, strategies, options) {
        let outcome = result.and_then(|report| {
            sink.write_report(&report)?;
            Ok(report)
        });
        match outcome {
            Ok(report) => {
                if let Some(last) = report.latest_score() {
                    println!("{}\t{}\t{:.2}", symbol, last.time_key, last.score);
                }
            }
            Err(e) => {
                if e.is_integrity() {
                    error!(symbol = %symbol, "integrity failure: {e}");
                } else {
                    error!(symbol = %symbol, "{e}");
                }
                first_failure.get_or_insert(ExitCode::from(&e));
            }
        }
    }

    first_failure.unwrap_or(ExitCode::SUCCESS)
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checked = validate_engine_config(&adapter).and_then(|()| validate_data_config(&adapter));
    match checked {
        Ok(()) => {
            eprintln!("{}: configuration is valid", config_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

fn run_list(config_path: Option<&Path>) -> ExitCode {
    let registries = match config_path {
        Some(path) => {
            let adapter = match load_config(path) {
                Ok(a) => a,
                Err(code) => return code,
            };
            IndicatorRegistry::from_config(&adapter)
                .and_then(|i| StrategyRegistry::from_config(&adapter).map(|s| (i, s)))
        }
        None => Ok((IndicatorRegistry::with_defaults(), StrategyRegistry::available())),
    };
    let (indicators, strategies) = match registries {
        Ok(r) => r,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };

    println!("Indicators:");
    for indicator in indicators.iter() {
        println!("  {:<28} {}", indicator.key(), indicator.group());
    }

    println!("\nStrategies:");
    for strategy in strategies.iter() {
        let key = strategy.key();
        let params: Vec<String> = strategy
            .params()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        let marker = if DEFAULT_STRATEGIES.contains(&key.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {key:<28} {}", params.join(" "));
    }
    ExitCode::SUCCESS
}
