//! CLI integration tests for the orders, latest and validate commands.
//!
//! Tests cover:
//! - Config parsing (build_defaults, validate_config)
//! - Parameter overrides layered on config defaults
//! - Latest-file selection with real files on disk
//! - Full orders command writing CSV to a file

mod common;

use approx::assert_relative_eq;
use clap::Parser;
use common::*;
use signalpulse::adapters::csv_signal_adapter::CsvSignalAdapter;
use signalpulse::adapters::file_config_adapter::FileConfigAdapter;
use signalpulse::cli::{self, Cli, ParamOverrides};
use signalpulse::domain::error::SignalPulseError;
use signalpulse::domain::order::Side;
use signalpulse::domain::request::AllocationRequest;
use std::fs;
use std::process::ExitCode;
use tempfile::TempDir;

fn valid_ini(signals_dir: &str) -> String {
    format!(
        r#"
[signals]
dir = {signals_dir}

[defaults]
investable_amount = 1000
delta = 0
leverage = 1
universe_size = 10
"#
    )
}

mod config_loading {
    use super::*;

    #[test]
    fn valid_config_passes_validation() {
        let ini = write_temp_ini(&valid_ini("/tmp/signals"));
        let config = FileConfigAdapter::from_file(ini.path()).unwrap();
        assert!(cli::validate_config(&config).is_ok());
    }

    #[test]
    fn missing_signals_dir_fails_validation() {
        let config = FileConfigAdapter::from_string("[defaults]\ndelta = 0\n").unwrap();
        let err = cli::validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            SignalPulseError::ConfigMissing { ref section, ref key } if section == "signals" && key == "dir"
        ));
        assert_eq!(ExitCode::from(&err), ExitCode::from(2));
    }

    #[test]
    fn unsupported_universe_fails_validation() {
        let config =
            FileConfigAdapter::from_string("[signals]\ndir = x\n[defaults]\nuniverse_size = 15\n")
                .unwrap();
        assert!(matches!(
            cli::validate_config(&config),
            Err(SignalPulseError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn build_defaults_reads_every_key() {
        let config = FileConfigAdapter::from_string(
            "[defaults]\ninvestable_amount = 20000\ndelta = -0.25\nleverage = 3\nuniverse_size = 50\n",
        )
        .unwrap();
        let defaults = cli::build_defaults(&config);
        assert_relative_eq!(defaults.investable_amount, 20000.0);
        assert_relative_eq!(defaults.delta, -0.25);
        assert_relative_eq!(defaults.leverage, 3.0);
        assert_eq!(defaults.universe_size.get(), 50);
    }

    #[test]
    fn overrides_layer_on_defaults() {
        let base = AllocationRequest::new(20000.0, 0.5, 2.0, 20);
        let overrides = ParamOverrides {
            leverage: Some("1.5".into()),
            ..Default::default()
        };
        let request = cli::apply_overrides(&base, &overrides).unwrap();
        assert_relative_eq!(request.investable_amount, 20000.0);
        assert_relative_eq!(request.delta, 0.5);
        assert_relative_eq!(request.leverage, 1.5);
        assert_eq!(request.universe_size.get(), 20);
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn pipeline_uses_newest_file() {
        let dir = TempDir::new().unwrap();
        write_signal_file(
            dir.path(),
            "old.csv",
            "ticker,target_notional,ref_price\nZZZ,10,1\nYYY,-10,1\n",
            3600,
        );
        write_signal_file(dir.path(), "new.csv", SAMPLE_CSV, 60);

        let adapter = CsvSignalAdapter::new(dir.path());
        let (snapshot, orders) =
            cli::run_orders_pipeline(&adapter, &AllocationRequest::default()).unwrap();

        assert_eq!(snapshot.file_name(), "new.csv");
        let symbols: Vec<&str> = orders.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB", "CCC", "DDD"]);
        assert_eq!(orders[2].side, Side::Sell);
    }

    #[test]
    fn pipeline_with_mock_port() {
        let port = MockSignalPort::new().with_rows(sample_rows());
        let (_, orders) = cli::run_orders_pipeline(&port, &AllocationRequest::default()).unwrap();
        assert_eq!(orders.len(), 4);
        assert_relative_eq!(orders[0].notional_usd, 333.33);
    }

    #[test]
    fn pipeline_propagates_missing_signals() {
        let port = MockSignalPort::new().with_error("/nowhere");
        let err = cli::run_orders_pipeline(&port, &AllocationRequest::default()).unwrap_err();
        assert!(matches!(err, SignalPulseError::NoSignalFiles { .. }));
        assert_eq!(ExitCode::from(&err), ExitCode::from(5));
    }

    #[test]
    fn empty_directory_has_no_signal_files() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvSignalAdapter::new(dir.path());
        let err = cli::run_orders_pipeline(&adapter, &AllocationRequest::default()).unwrap_err();
        assert!(matches!(err, SignalPulseError::NoSignalFiles { .. }));
    }
}

mod commands {
    use super::*;

    #[test]
    fn orders_command_writes_csv_file() {
        let signals = TempDir::new().unwrap();
        write_signal_file(signals.path(), "today.csv", SAMPLE_CSV, 0);
        let ini = write_temp_ini(&valid_ini(&signals.path().display().to_string()));
        let out_dir = TempDir::new().unwrap();
        let out = out_dir.path().join("orders.csv");

        let parsed = Cli::try_parse_from([
            "signalpulse",
            "orders",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(cli::run(parsed), ExitCode::SUCCESS);

        let csv = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "symbol,side,signal,ref_price,weight_pct,notional_usd"
        );
        assert_eq!(lines[1], "AAA,Buy,100,10,33.333,333.33");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn orders_command_accepts_negative_delta_flag() {
        let signals = TempDir::new().unwrap();
        write_signal_file(signals.path(), "today.csv", SAMPLE_CSV, 0);
        let out_dir = TempDir::new().unwrap();
        let out = out_dir.path().join("orders.csv");

        let parsed = Cli::try_parse_from([
            "signalpulse",
            "orders",
            "--signals-dir",
            signals.path().to_str().unwrap(),
            "--delta",
            "-1",
            "--output",
            out.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(cli::run(parsed), ExitCode::SUCCESS);

        let csv = fs::read_to_string(&out).unwrap();
        assert!(csv.contains("AAA,Buy,100,10,0,0"));
        assert!(csv.contains("CCC,Sell,-80,5,80,800"));
    }

    #[test]
    fn orders_command_rejects_malformed_amount() {
        let signals = TempDir::new().unwrap();
        write_signal_file(signals.path(), "today.csv", SAMPLE_CSV, 0);

        let parsed = Cli::try_parse_from([
            "signalpulse",
            "orders",
            "--signals-dir",
            signals.path().to_str().unwrap(),
            "--amount",
            "lots",
        ])
        .unwrap();
        assert_eq!(cli::run(parsed), ExitCode::from(4));
    }

    #[test]
    fn orders_command_without_signals_dir_is_config_error() {
        let parsed = Cli::try_parse_from(["signalpulse", "orders"]).unwrap();
        assert_eq!(cli::run(parsed), ExitCode::from(2));
    }

    #[test]
    fn latest_command_on_empty_dir_fails() {
        let signals = TempDir::new().unwrap();
        let parsed = Cli::try_parse_from([
            "signalpulse",
            "latest",
            "--signals-dir",
            signals.path().to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(cli::run(parsed), ExitCode::from(5));
    }

    #[test]
    fn validate_command_on_missing_file_is_config_error() {
        let parsed = Cli::try_parse_from([
            "signalpulse",
            "validate",
            "--config",
            "/nonexistent/signalpulse.ini",
        ])
        .unwrap();
        assert_eq!(cli::run(parsed), ExitCode::from(2));
    }

    #[test]
    fn validate_command_accepts_valid_file() {
        let signals = TempDir::new().unwrap();
        let ini = write_temp_ini(&valid_ini(&signals.path().display().to_string()));
        let parsed = Cli::try_parse_from([
            "signalpulse",
            "validate",
            "--config",
            ini.path().to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(cli::run(parsed), ExitCode::SUCCESS);
    }
}
