#![allow(dead_code)]

use chrono::{DateTime, Utc};
use signalpulse::domain::error::SignalPulseError;
use signalpulse::domain::signal::{SignalRow, SignalSnapshot};
use signalpulse::ports::signal_port::SignalPort;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub struct MockSignalPort {
    pub rows: Vec<SignalRow>,
    pub error: Option<String>,
}

impl MockSignalPort {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            error: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<SignalRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Every load fails with `NoSignalFiles` for `dir`.
    pub fn with_error(mut self, dir: &str) -> Self {
        self.error = Some(dir.to_string());
        self
    }
}

impl SignalPort for MockSignalPort {
    fn load_latest(&self) -> Result<SignalSnapshot, SignalPulseError> {
        if let Some(dir) = &self.error {
            return Err(SignalPulseError::NoSignalFiles { dir: dir.clone() });
        }
        Ok(SignalSnapshot {
            source: PathBuf::from("signals/mock.csv"),
            modified: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH),
            rows: self.rows.clone(),
            dropped: 0,
        })
    }
}

pub fn row(ticker: &str, notional: f64, price: f64) -> SignalRow {
    SignalRow::new(ticker, notional, price)
}

/// Two longs and two shorts with a known allocation at the defaults.
pub fn sample_rows() -> Vec<SignalRow> {
    vec![
        row("AAA", 100.0, 10.0),
        row("BBB", 50.0, 20.0),
        row("CCC", -80.0, 5.0),
        row("DDD", -20.0, 8.0),
    ]
}

/// `n` longs and `n` shorts with distinct magnitudes.
pub fn balanced_rows(n: usize) -> Vec<SignalRow> {
    let mut rows = Vec::with_capacity(n * 2);
    for i in 0..n {
        let magnitude = (i + 1) as f64 * 10.0;
        rows.push(row(&format!("L{i:02}"), magnitude, 10.0 + i as f64));
        rows.push(row(&format!("S{i:02}"), -magnitude, 20.0 + i as f64));
    }
    rows
}

pub const SAMPLE_CSV: &str = "\
ticker,target_notional,ref_price
AAA,100,10
BBB,50,20
CCC,-80,5
DDD,-20,8
";

/// Write a signal file and backdate its modification time by `age_secs`.
pub fn write_signal_file(dir: &Path, name: &str, content: &str, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
    path
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[cfg(feature = "web")]
pub mod web {
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
    };
    use http_body_util::BodyExt;
    use signalpulse::adapters::memory_param_store::MemoryParamStore;
    use signalpulse::adapters::web::{AppState, build_router};
    use signalpulse::domain::request::AllocationRequest;
    use signalpulse::ports::config_port::ConfigPort;
    use signalpulse::ports::param_store_port::ParamStorePort;
    use signalpulse::ports::signal_port::SignalPort;
    use std::sync::{Arc, LazyLock};
    use tower::ServiceExt;

    pub const TEST_PASSWORD: &str = "testpass123";
    pub const TEST_USERNAME: &str = "testuser";

    pub static TEST_PASSWORD_HASH: LazyLock<String> = LazyLock::new(|| {
        use argon2::{
            Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString,
        };
        let salt = SaltString::from_b64("dGVzdHNhbHR0ZXN0c2FsdA").unwrap();
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
        argon2
            .hash_password(TEST_PASSWORD.as_bytes(), &salt)
            .unwrap()
            .to_string()
    });

    pub struct MockConfigPort;

    impl ConfigPort for MockConfigPort {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            match (section, key) {
                ("signals", "dir") => Some("signals".to_string()),
                ("auth", "username") => Some(TEST_USERNAME.to_string()),
                ("auth", "password_hash") => Some(TEST_PASSWORD_HASH.clone()),
                ("auth", "session_secret") => Some("01".repeat(64)),
                ("database", "sqlite_path") => Some(":memory:".to_string()),
                _ => None,
            }
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            match (section, key) {
                ("auth", "session_lifetime") => 3600,
                _ => default,
            }
        }

        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }

        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    pub async fn create_app(signal_port: impl SignalPort + Send + Sync + 'static) -> Router {
        create_app_with_store(signal_port, MemoryParamStore::new()).await
    }

    pub async fn create_app_with_store(
        signal_port: impl SignalPort + Send + Sync + 'static,
        param_store: impl ParamStorePort + Send + Sync + 'static,
    ) -> Router {
        let state = AppState {
            signal_port: Arc::new(signal_port),
            param_store: Arc::new(param_store),
            config: Arc::new(MockConfigPort),
            defaults: AllocationRequest::default(),
        };
        build_router(state).await.unwrap()
    }

    pub fn extract_cookies(response: &axum::http::Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn build_cookie_header(set_cookies: &[String]) -> String {
        set_cookies
            .iter()
            .map(|sc| sc.split(';').next().unwrap_or("").to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn login_request(username: &str, password: &str) -> Request<Body> {
        let form_data = format!("username={}&password={}", username, password);
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_data))
            .unwrap()
    }

    /// Log in as the test user and return the `Cookie` header value.
    pub async fn login(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(login_request(TEST_USERNAME, TEST_PASSWORD))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        build_cookie_header(&extract_cookies(&response))
    }

    pub async fn body_string(response: axum::http::Response<Body>) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&body).into_owned()
    }
}
