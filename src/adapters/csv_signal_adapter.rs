//! Signal source over a directory of CSV files.
//!
//! The newest `*.csv` by modification time wins. Columns are located by
//! header name (`ticker`, `target_notional`, `ref_price`); other columns are
//! ignored. Rows missing any of the three are dropped and counted.

use crate::domain::error::SignalPulseError;
use crate::domain::signal::{normalize_ticker, SignalRow, SignalSnapshot};
use crate::ports::config_port::ConfigPort;
use crate::ports::signal_port::SignalPort;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const TICKER_COLUMN: &str = "ticker";
const NOTIONAL_COLUMN: &str = "target_notional";
const PRICE_COLUMN: &str = "ref_price";

#[derive(Debug)]
pub struct CsvSignalAdapter {
    dir: PathBuf,
}

/// Rows parsed from one file plus the number discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSignals {
    pub rows: Vec<SignalRow>,
    pub dropped: usize,
}

impl CsvSignalAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SignalPulseError> {
        let dir = config
            .get_string("signals", "dir")
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| SignalPulseError::ConfigMissing {
                section: "signals".into(),
                key: "dir".into(),
            })?;
        Ok(Self::new(dir.trim()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Most recently modified CSV file in the directory. Ties on
    /// modification time go to the lexically greater file name.
    pub fn latest_file(&self) -> Result<(PathBuf, SystemTime), SignalPulseError> {
        let no_files = || SignalPulseError::NoSignalFiles {
            dir: self.dir.display().to_string(),
        };

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(no_files()),
            Err(e) => return Err(SignalPulseError::Io(e)),
        };

        let mut latest: Option<(PathBuf, SystemTime)> = None;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !is_csv(&path) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified()?;
            let newer = match &latest {
                None => true,
                Some((best_path, best_time)) => {
                    (modified, path.file_name()) > (*best_time, best_path.file_name())
                }
            };
            if newer {
                latest = Some((path, modified));
            }
        }

        latest.ok_or_else(no_files)
    }

    pub fn parse_file(path: &Path) -> Result<ParsedSignals, SignalPulseError> {
        let file = fs::File::open(path)?;
        parse_signals(file, &path.display().to_string())
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn column_index(headers: &csv::StringRecord, name: &str, file: &str) -> Result<usize, SignalPulseError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| SignalPulseError::SignalParse {
            file: file.to_string(),
            reason: format!("missing {} column", name),
        })
}

fn parse_field(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    let value: f64 = record.get(idx)?.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse signal CSV content. `file` is only used in error messages.
pub fn parse_signals<R: Read>(reader: R, file: &str) -> Result<ParsedSignals, SignalPulseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| SignalPulseError::SignalParse {
            file: file.to_string(),
            reason: format!("CSV header error: {}", e),
        })?
        .clone();

    let ticker_idx = column_index(&headers, TICKER_COLUMN, file)?;
    let notional_idx = column_index(&headers, NOTIONAL_COLUMN, file)?;
    let price_idx = column_index(&headers, PRICE_COLUMN, file)?;

    let mut rows = Vec::new();
    let mut dropped = 0;

    for result in rdr.records() {
        let record = result.map_err(|e| SignalPulseError::SignalParse {
            file: file.to_string(),
            reason: format!("CSV parse error: {}", e),
        })?;

        let ticker = record.get(ticker_idx).map(normalize_ticker).unwrap_or_default();
        let notional = parse_field(&record, notional_idx);
        let price = parse_field(&record, price_idx);

        match (ticker.is_empty(), notional, price) {
            (false, Some(target_notional), Some(ref_price)) => rows.push(SignalRow {
                ticker,
                target_notional,
                ref_price,
            }),
            _ => dropped += 1,
        }
    }

    Ok(ParsedSignals { rows, dropped })
}

impl SignalPort for CsvSignalAdapter {
    fn load_latest(&self) -> Result<SignalSnapshot, SignalPulseError> {
        let (path, modified) = self.latest_file()?;
        tracing::debug!(file = %path.display(), "loading signal file");

        let parsed = Self::parse_file(&path)?;
        if parsed.dropped > 0 {
            tracing::warn!(
                file = %path.display(),
                dropped = parsed.dropped,
                "dropped incomplete signal rows"
            );
        }
        tracing::info!(
            file = %path.display(),
            rows = parsed.rows.len(),
            "loaded signals"
        );

        Ok(SignalSnapshot {
            source: path,
            modified: DateTime::<Utc>::from(modified),
            rows: parsed.rows,
            dropped: parsed.dropped,
        })
    }
}
