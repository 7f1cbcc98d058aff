//! SQLite-backed parameter store.

use crate::domain::error::SignalPulseError;
use crate::domain::request::{AllocationRequest, UniverseSize};
use crate::ports::config_port::ConfigPort;
use crate::ports::param_store_port::ParamStorePort;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::time::SystemTime;

pub struct SqliteParamStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteParamStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SignalPulseError> {
        let db_path = config
            .get_string("database", "sqlite_path")
            .ok_or_else(|| SignalPulseError::ConfigMissing {
                section: "database".into(),
                key: "sqlite_path".into(),
            })?;

        if db_path.trim() == ":memory:" {
            return Self::in_memory();
        }

        let pool_size = config.get_int("database", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(db_path.trim());
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| SignalPulseError::Database {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, SignalPulseError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| SignalPulseError::Database {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, SignalPulseError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| SignalPulseError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), SignalPulseError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS user_params (
                username TEXT PRIMARY KEY,
                investable_amount REAL NOT NULL,
                delta REAL NOT NULL,
                leverage REAL NOT NULL,
                universe_size INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| SignalPulseError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

impl ParamStorePort for SqliteParamStore {
    fn load(&self, user: &str) -> Result<Option<AllocationRequest>, SignalPulseError> {
        let conn = self.connection()?;

        let row = conn
            .query_row(
                "SELECT investable_amount, delta, leverage, universe_size
                 FROM user_params
                 WHERE username = ?1",
                params![user],
                |row| {
                    Ok(AllocationRequest {
                        investable_amount: row.get(0)?,
                        delta: row.get(1)?,
                        leverage: row.get(2)?,
                        universe_size: UniverseSize::resolve(row.get(3)?),
                    })
                },
            )
            .optional()
            .map_err(|e: rusqlite::Error| SignalPulseError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(row.map(|r| r.normalized()))
    }

    fn save(&self, user: &str, request: &AllocationRequest) -> Result<(), SignalPulseError> {
        let conn = self.connection()?;
        let request = request.normalized();
        let updated_at = DateTime::<Utc>::from(SystemTime::now()).to_rfc3339();

        conn.execute(
            "INSERT OR REPLACE INTO user_params
                (username, investable_amount, delta, leverage, universe_size, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user,
                request.investable_amount,
                request.delta,
                request.leverage,
                i64::from(request.universe_size.get()),
                updated_at
            ],
        )
        .map_err(|e: rusqlite::Error| SignalPulseError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        tracing::debug!(user, "saved allocation parameters");
        Ok(())
    }
}
