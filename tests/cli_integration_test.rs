//! CLI integration tests with real INI and CSV files on disk.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Symbol resolution (override, configured list, provider listing)
//! - `validate` and `list` exit codes
//! - Full `run` from a data directory to report files

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;
use tickscore::cli::{self, Cli, Command};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_symbol_csv(dir: &Path, symbol: &str, bars: &[Bar]) {
    let mut content = String::from("time_key,open,high,low,close,volume,turnover,turnover_rate\n");
    for b in bars {
        content.push_str(&format!(
            "{} 00:00:00,{},{},{},{},{},{},{}\n",
            b.time_key, b.open, b.high, b.low, b.close, b.volume, b.turnover, b.turnover_rate
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

fn config_for(data_dir: &Path, symbols: &str) -> String {
    format!(
        r#"
[engine]
capital = 100000
parallel = false

[strategies]
enabled = ART_DL_strategy, MA_Base_strategy

[art_dl_strategy]
multi = 4.0

[data]
dir = {}
symbols = {}
start_date = 2024-01-01
end_date = 2024-12-31
"#,
        data_dir.display(),
        symbols
    )
}

fn run_args(args: &[&str]) -> ExitCode {
    let mut argv = vec!["tickscore"];
    argv.extend_from_slice(args);
    cli::run(Cli::parse_from(argv))
}

mod argument_parsing {
    use super::*;

    #[test]
    fn run_with_output_and_verbosity() {
        let cli = Cli::parse_from([
            "tickscore", "-vv", "run", "--config", "a.ini", "--output", "out", "--symbol", "AAA",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run {
                config,
                output,
                symbol,
            } => {
                assert_eq!(config, Path::new("a.ini"));
                assert_eq!(output.as_deref(), Some(Path::new("out")));
                assert_eq!(symbol.as_deref(), Some("AAA"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn list_config_is_optional() {
        let cli = Cli::parse_from(["tickscore", "list"]);
        assert!(matches!(cli.command, Command::List { config: None }));
    }

    #[test]
    fn run_requires_config() {
        assert!(Cli::try_parse_from(["tickscore", "run"]).is_err());
    }
}

mod symbol_resolution {
    use super::*;

    fn provider() -> MockBarProvider {
        MockBarProvider::new()
            .with_bars("ZZZ", bars_from_closes(&[1.0]))
            .with_bars("YYY", bars_from_closes(&[1.0]))
    }

    #[test]
    fn override_wins() {
        let configured = vec!["AAA".to_string()];
        assert_eq!(
            cli::resolve_symbols(Some("BBB, CCC,"), &configured, &provider()).unwrap(),
            vec!["BBB".to_string(), "CCC".to_string()]
        );
    }

    #[test]
    fn configured_list_before_provider() {
        let configured = vec!["AAA".to_string(), "BBB".to_string()];
        assert_eq!(
            cli::resolve_symbols(None, &configured, &provider()).unwrap(),
            configured
        );
    }

    #[test]
    fn empty_config_lists_provider_symbols() {
        assert_eq!(
            cli::resolve_symbols(None, &[], &provider()).unwrap(),
            vec!["YYY".to_string(), "ZZZ".to_string()]
        );
    }
}

mod validate_and_list {
    use super::*;

    #[test]
    fn valid_config_passes() {
        let dir = TempDir::new().unwrap();
        let ini = write_temp_ini(&config_for(dir.path(), "AAA"));
        let code = run_args(&["validate", "--config", ini.path().to_str().unwrap()]);
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn invalid_value_is_config_error() {
        let ini = write_temp_ini("[score]\nlow_threshold = 90\nhigh_threshold = 10\n");
        let code = run_args(&["validate", "--config", ini.path().to_str().unwrap()]);
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn unknown_strategy_is_integrity_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_temp_ini(
            &config_for(dir.path(), "AAA").replace("MA_Base_strategy", "NOPE_strategy"),
        );
        let code = run_args(&["validate", "--config", ini.path().to_str().unwrap()]);
        assert_eq!(code, ExitCode::from(4));
    }

    #[test]
    fn missing_config_file() {
        let code = run_args(&["validate", "--config", "/nonexistent/tickscore.ini"]);
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn list_defaults() {
        assert_eq!(run_args(&["list"]), ExitCode::SUCCESS);
    }
}

mod full_run {
    use super::*;

    #[test]
    fn run_writes_reports_for_each_symbol() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_symbol_csv(data.path(), "AAA", &bars_from_closes(&wave_closes(80)));
        write_symbol_csv(data.path(), "BBB", &bars_from_closes(&wave_closes(45)));
        let ini = write_temp_ini(&config_for(data.path(), "AAA, BBB"));

        let code = run_args(&[
            "run",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::SUCCESS);

        for symbol in ["AAA", "BBB"] {
            for table in ["indicators", "strategies", "trades", "scores"] {
                let path = out.path().join(format!("{symbol}_{table}.csv"));
                assert!(path.exists(), "missing {}", path.display());
            }
        }

        let mut rdr = csv::Reader::from_path(out.path().join("AAA_strategies.csv")).unwrap();
        let keys: Vec<String> = rdr
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(keys, vec!["ART_DL_strategy", "MA_Base_strategy"]);

        let mut rdr = csv::Reader::from_path(out.path().join("BBB_scores.csv")).unwrap();
        assert_eq!(rdr.records().count(), 45);
    }

    #[test]
    fn symbol_override_limits_run() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_symbol_csv(data.path(), "AAA", &bars_from_closes(&wave_closes(30)));
        write_symbol_csv(data.path(), "BBB", &bars_from_closes(&wave_closes(30)));
        let ini = write_temp_ini(&config_for(data.path(), "AAA, BBB"));

        let code = run_args(&[
            "run",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
            "--symbol",
            "BBB",
        ]);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.path().join("BBB_scores.csv").exists());
        assert!(!out.path().join("AAA_scores.csv").exists());
    }

    #[test]
    fn empty_symbol_list_runs_every_csv_in_dir() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_symbol_csv(data.path(), "AAA", &bars_from_closes(&wave_closes(30)));
        write_symbol_csv(data.path(), "BBB", &bars_from_closes(&wave_closes(30)));
        fs::write(data.path().join("notes.txt"), "not bars").unwrap();
        let ini = write_temp_ini(&config_for(data.path(), ""));

        let code = run_args(&[
            "run",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.path().join("AAA_scores.csv").exists());
        assert!(out.path().join("BBB_scores.csv").exists());
        assert!(!out.path().join("notes_scores.csv").exists());
    }

    #[test]
    fn empty_symbol_list_and_empty_dir_is_config_error() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let ini = write_temp_ini(&config_for(data.path(), ""));

        let code = run_args(&[
            "run",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn no_readable_symbol_is_no_data() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let ini = write_temp_ini(&config_for(data.path(), "ZZZ"));

        let code = run_args(&[
            "run",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::from(5));
    }

    #[test]
    fn missing_data_section_is_config_error() {
        let ini = write_temp_ini("[engine]\ncapital = 1000\n");
        let code = run_args(&["run", "--config", ini.path().to_str().unwrap()]);
        assert_eq!(code, ExitCode::from(2));
    }
}
