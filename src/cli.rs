//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_export::write_orders;
use crate::adapters::csv_signal_adapter::CsvSignalAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::allocation::{CapitalSplit, allocate};
use crate::domain::config_validation::{validate_defaults_config, validate_signals_config};
use crate::domain::error::SignalPulseError;
use crate::domain::order::{BookSummary, Order};
use crate::domain::request::{
    AllocationRequest, DEFAULT_DELTA, DEFAULT_INVESTABLE_AMOUNT, DEFAULT_LEVERAGE, UniverseSize,
    parse_delta, parse_investable_amount, parse_leverage, parse_universe_size,
};
use crate::domain::signal::SignalSnapshot;
use crate::ports::config_port::ConfigPort;
use crate::ports::signal_port::SignalPort;

#[derive(Parser, Debug)]
#[command(name = "signalpulse", about = "Long/short order generator driven by signal files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate orders from the latest signal file
    Orders {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        signals_dir: Option<PathBuf>,
        /// Investable amount in USD
        #[arg(long)]
        amount: Option<String>,
        /// Net tilt in [-1, 1]
        #[arg(long, allow_hyphen_values = true)]
        delta: Option<String>,
        /// Leverage multiplier in [0, 5]
        #[arg(long)]
        leverage: Option<String>,
        /// Universe size: 10, 20, 30, 40 or 50
        #[arg(long)]
        universe: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show which signal file would be used
    Latest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        signals_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Output an argon2 hash for a password
    HashPassword,
}

/// Raw parameter overrides as typed on the command line.
#[derive(Debug, Default, Clone)]
pub struct ParamOverrides {
    pub amount: Option<String>,
    pub delta: Option<String>,
    pub leverage: Option<String>,
    pub universe: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging();

    match cli.command {
        Command::Orders {
            config,
            signals_dir,
            amount,
            delta,
            leverage,
            universe,
            output,
        } => {
            let overrides = ParamOverrides {
                amount,
                delta,
                leverage,
                universe,
            };
            run_orders(
                config.as_ref(),
                signals_dir.as_ref(),
                &overrides,
                output.as_ref(),
            )
        }
        Command::Latest {
            config,
            signals_dir,
        } => run_latest(config.as_ref(), signals_dir.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::Serve { config } => run_serve(&config),
        Command::HashPassword => run_hash_password(),
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            load_config(p).map(Some)
        }
        None => Ok(None),
    }
}

/// Allocation parameters from the `[defaults]` section, falling back to the
/// built-in defaults for absent keys. Values are clamped like request input.
pub fn build_defaults(config: &dyn ConfigPort) -> AllocationRequest {
    AllocationRequest::new(
        config.get_double("defaults", "investable_amount", DEFAULT_INVESTABLE_AMOUNT),
        config.get_double("defaults", "delta", DEFAULT_DELTA),
        config.get_double("defaults", "leverage", DEFAULT_LEVERAGE),
        config.get_int(
            "defaults",
            "universe_size",
            i64::from(UniverseSize::DEFAULT.get()),
        ),
    )
    .normalized()
}

/// Apply command-line overrides on top of `base`. Overrides are parsed
/// strictly: a malformed value is an error rather than a fallback.
pub fn apply_overrides(
    base: &AllocationRequest,
    overrides: &ParamOverrides,
) -> Result<AllocationRequest, SignalPulseError> {
    let mut request = *base;
    if let Some(raw) = &overrides.amount {
        request.investable_amount = parse_investable_amount(raw)?;
    }
    if let Some(raw) = &overrides.delta {
        request.delta = parse_delta(raw)?;
    }
    if let Some(raw) = &overrides.leverage {
        request.leverage = parse_leverage(raw)?;
    }
    if let Some(raw) = &overrides.universe {
        request.universe_size = parse_universe_size(raw)?;
    }
    Ok(request.normalized())
}

/// `--signals-dir` wins over `[signals] dir`.
pub fn resolve_signals_dir(
    flag: Option<&PathBuf>,
    config: Option<&dyn ConfigPort>,
) -> Result<CsvSignalAdapter, SignalPulseError> {
    if let Some(dir) = flag {
        return Ok(CsvSignalAdapter::new(dir));
    }
    match config {
        Some(c) => CsvSignalAdapter::from_config(c),
        None => Err(SignalPulseError::ConfigMissing {
            section: "signals".into(),
            key: "dir".into(),
        }),
    }
}

/// Load the latest signals and allocate them.
pub fn run_orders_pipeline(
    signal_port: &dyn SignalPort,
    request: &AllocationRequest,
) -> Result<(SignalSnapshot, Vec<Order>), SignalPulseError> {
    let snapshot = signal_port.load_latest()?;
    let orders = allocate(&snapshot.rows, request);
    Ok((snapshot, orders))
}

fn write_output(orders: &[Order], output: Option<&PathBuf>) -> Result<(), SignalPulseError> {
    match output {
        Some(path) => {
            let file = File::create(path)?;
            write_orders(orders, BufWriter::new(file))
        }
        None => write_orders(orders, io::stdout().lock()),
    }
}

fn print_summary(snapshot: &SignalSnapshot, request: &AllocationRequest, orders: &[Order]) {
    let split = CapitalSplit::from_request(request);
    let book = BookSummary::from_orders(orders);

    eprintln!(
        "Signals: {} ({} rows, {} dropped)",
        snapshot.file_name(),
        snapshot.rows.len(),
        snapshot.dropped
    );
    eprintln!(
        "Parameters: amount={} delta={} leverage={} universe={}",
        request.investable_amount, request.delta, request.leverage, request.universe_size
    );
    eprintln!("\n=== Capital ===");
    eprintln!("Gross:          {:.2}", split.gross);
    eprintln!("Long cap:       {:.2}", split.long_cap);
    eprintln!("Short cap:      {:.2}", split.short_cap);
    eprintln!("\n=== Orders ===");
    eprintln!("Buys:           {} ({:.2})", book.buy_count, book.buy_notional);
    eprintln!("Sells:          {} ({:.2})", book.sell_count, book.sell_notional);
    eprintln!("Net notional:   {:.2}", book.net_notional());
}

fn run_orders(
    config_path: Option<&PathBuf>,
    signals_dir: Option<&PathBuf>,
    overrides: &ParamOverrides,
    output: Option<&PathBuf>,
) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_ref = config.as_ref().map(|c| c as &dyn ConfigPort);

    let base = match config_ref {
        Some(c) => {
            if let Err(e) = validate_defaults_config(c) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            build_defaults(c)
        }
        None => AllocationRequest::default(),
    };

    let request = match apply_overrides(&base, overrides) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let adapter = match resolve_signals_dir(signals_dir, config_ref) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (snapshot, orders) = match run_orders_pipeline(&adapter, &request) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Err(e) = write_output(&orders, output) {
        eprintln!("error: failed to write orders: {e}");
        return (&e).into();
    }

    print_summary(&snapshot, &request, &orders);
    if let Some(path) = output {
        eprintln!("\nOrders written to: {}", path.display());
    }
    ExitCode::SUCCESS
}

fn run_latest(config_path: Option<&PathBuf>, signals_dir: Option<&PathBuf>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_ref = config.as_ref().map(|c| c as &dyn ConfigPort);

    let adapter = match resolve_signals_dir(signals_dir, config_ref) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let snapshot = match adapter.load_latest() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("file:     {}", snapshot.source.display());
    println!(
        "modified: {}",
        snapshot.modified.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("rows:     {}", snapshot.rows.len());
    println!("dropped:  {}", snapshot.dropped);
    println!("longs:    {}", snapshot.long_count());
    println!("shorts:   {}", snapshot.short_count());
    ExitCode::SUCCESS
}

/// Validate every section present in `config`. The web sections are only
/// checked when `[auth]` is configured.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    validate_signals_config(config)?;
    validate_defaults_config(config)?;

    #[cfg(feature = "web")]
    {
        if config.get_string("auth", "username").is_some() {
            crate::domain::config_validation::validate_web_config(config)?;
        }
    }

    Ok(())
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let defaults = build_defaults(&config);
    eprintln!("\nDefaults:");
    eprintln!("  investable_amount: {}", defaults.investable_amount);
    eprintln!("  delta:             {}", defaults.delta);
    eprintln!("  leverage:          {}", defaults.leverage);
    eprintln!("  universe_size:     {}", defaults.universe_size);

    if let Some(dir) = config.get_string("signals", "dir") {
        let adapter = CsvSignalAdapter::new(dir.trim());
        match adapter.latest_file() {
            Ok((path, _)) => eprintln!("\nLatest signal file: {}", path.display()),
            Err(e) => eprintln!("\nwarning: {e}"),
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use crate::domain::config_validation::validate_web_config;
        use crate::ports::param_store_port::ParamStorePort;
        use std::net::SocketAddr;
        use std::sync::Arc;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let checks = validate_signals_config(&config)
            .and_then(|()| validate_defaults_config(&config))
            .and_then(|()| validate_web_config(&config));
        if let Err(e) = checks {
            eprintln!("error: {e}");
            return (&e).into();
        }

        let signal_port = match CsvSignalAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        eprintln!("Watching signals in {}", signal_port.dir().display());

        let param_store: Arc<dyn ParamStorePort + Send + Sync> =
            if config.get_string("database", "sqlite_path").is_some() {
                match crate::adapters::sqlite_param_store::SqliteParamStore::from_config(&config)
                {
                    Ok(store) => Arc::new(store),
                    Err(e) => {
                        eprintln!("error: {e}");
                        return (&e).into();
                    }
                }
            } else {
                eprintln!("warning: no [database] sqlite_path, parameters are kept in memory");
                Arc::new(crate::adapters::memory_param_store::MemoryParamStore::new())
            };

        let addr: SocketAddr = match config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .trim()
            .parse()
        {
            Ok(a) => a,
            Err(e) => {
                let err = SignalPulseError::ConfigInvalid {
                    section: "web".into(),
                    key: "listen".into(),
                    reason: e.to_string(),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        };

        let state = AppState {
            signal_port: Arc::new(signal_port),
            param_store,
            defaults: build_defaults(&config),
            config: Arc::new(config),
        };

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("error: failed to start runtime: {e}");
                return ExitCode::from(1);
            }
        };

        let result: Result<(), SignalPulseError> = runtime.block_on(async {
            let router = build_router(state).await?;
            let listener = tokio::net::TcpListener::bind(addr).await?;
            eprintln!("Starting web server on {}", addr);
            tracing::info!(%addr, "listening");
            axum::serve(listener, router).await?;
            Ok(())
        });

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

fn run_hash_password() -> ExitCode {
    #[cfg(feature = "web")]
    {
        use argon2::{
            Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString,
        };
        use rand::rngs::OsRng;
        use std::io::BufRead;

        eprintln!("Enter password to hash:");
        let mut password = String::new();
        if let Err(e) = io::stdin().lock().read_line(&mut password) {
            eprintln!("error: failed to read password: {e}");
            return ExitCode::from(1);
        }
        let password = password.trim_end_matches(['\r', '\n']);
        if password.is_empty() {
            eprintln!("error: password must not be empty");
            return ExitCode::from(1);
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
        match argon2.hash_password(password.as_bytes(), &salt) {
            Ok(hash) => {
                println!("{}", hash);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to hash password: {e}");
                ExitCode::from(1)
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        eprintln!("error: web feature is required for hash-password");
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::path::Path;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn defaults_come_from_config() {
        let c = config(
            "[defaults]\ninvestable_amount = 5000\ndelta = 0.5\nleverage = 2\nuniverse_size = 20\n",
        );
        let d = build_defaults(&c);
        assert_relative_eq!(d.investable_amount, 5000.0);
        assert_relative_eq!(d.delta, 0.5);
        assert_relative_eq!(d.leverage, 2.0);
        assert_eq!(d.universe_size.get(), 20);
    }

    #[test]
    fn defaults_fall_back_when_section_missing() {
        let d = build_defaults(&config("[signals]\ndir = /tmp\n"));
        assert_eq!(d, AllocationRequest::default());
    }

    #[test]
    fn overrides_replace_and_clamp() {
        let overrides = ParamOverrides {
            amount: Some("2,500".into()),
            delta: Some("-3".into()),
            leverage: None,
            universe: Some("40".into()),
        };
        let r = apply_overrides(&AllocationRequest::default(), &overrides).unwrap();
        assert_relative_eq!(r.investable_amount, 2500.0);
        assert_relative_eq!(r.delta, -1.0);
        assert_relative_eq!(r.leverage, 1.0);
        assert_eq!(r.universe_size.get(), 40);
    }

    #[test]
    fn malformed_override_is_parameter_error() {
        let overrides = ParamOverrides {
            leverage: Some("lots".into()),
            ..Default::default()
        };
        let err = apply_overrides(&AllocationRequest::default(), &overrides).unwrap_err();
        assert!(matches!(err, SignalPulseError::InvalidParameter(_)));
        assert_eq!(ExitCode::from(&err), ExitCode::from(4));
    }

    #[test]
    fn signals_dir_flag_wins_over_config() {
        let c = config("[signals]\ndir = /from/config\n");
        let flag = PathBuf::from("/from/flag");
        let adapter = resolve_signals_dir(Some(&flag), Some(&c)).unwrap();
        assert_eq!(adapter.dir(), Path::new("/from/flag"));

        let adapter = resolve_signals_dir(None, Some(&c)).unwrap();
        assert_eq!(adapter.dir(), Path::new("/from/config"));
    }

    #[test]
    fn signals_dir_required_somewhere() {
        let err = resolve_signals_dir(None, None).unwrap_err();
        assert!(matches!(err, SignalPulseError::ConfigMissing { .. }));
    }

    #[test]
    fn validate_config_rejects_bad_defaults() {
        let c = config("[signals]\ndir = /tmp\n[defaults]\ndelta = 2\n");
        assert!(matches!(
            validate_config(&c),
            Err(SignalPulseError::ConfigInvalid { .. })
        ));
    }
}
