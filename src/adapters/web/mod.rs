//! Web server adapter.
//!
//! Axum server with an HTMX-enhanced dashboard: a parameter form, the
//! generated order table, and a CSV export. Every page except `/login`
//! requires a session.

mod auth;
mod error;
mod handlers;
mod templates;

pub use auth::{Backend, Credentials, User};
pub use error::WebError;
pub use handlers::ParamForm;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use axum_login::{AuthManagerLayerBuilder, login_required};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer, cookie::Key};
use tower_sessions_rusqlite_store::RusqliteStore;

use crate::domain::error::SignalPulseError;
use crate::domain::request::AllocationRequest;
use crate::ports::config_port::ConfigPort;
use crate::ports::param_store_port::ParamStorePort;
use crate::ports::signal_port::SignalPort;

pub const DEFAULT_SESSION_LIFETIME_SECS: i64 = 86400;

pub struct AppState {
    pub signal_port: Arc<dyn SignalPort + Send + Sync>,
    pub param_store: Arc<dyn ParamStorePort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
    /// Parameters for a user with nothing stored yet.
    pub defaults: AllocationRequest,
}

fn session_key(config: &dyn ConfigPort) -> Result<Key, SignalPulseError> {
    let invalid = |reason: &str| SignalPulseError::ConfigInvalid {
        section: "auth".into(),
        key: "session_secret".into(),
        reason: reason.to_string(),
    };
    let secret = config
        .get_string("auth", "session_secret")
        .ok_or_else(|| SignalPulseError::ConfigMissing {
            section: "auth".into(),
            key: "session_secret".into(),
        })?;
    let bytes = hex::decode(secret.trim()).map_err(|_| invalid("session_secret must be hex"))?;
    Key::try_from(bytes.as_slice()).map_err(|_| invalid("session_secret must be 64 bytes"))
}

async fn session_store(config: &dyn ConfigPort) -> Result<RusqliteStore, SignalPulseError> {
    let path = config
        .get_string("database", "sqlite_path")
        .unwrap_or_else(|| ":memory:".to_string());
    let conn = tokio_rusqlite::Connection::open(path.trim())
        .await
        .map_err(|e| SignalPulseError::Database {
            reason: format!("failed to open session store: {e}"),
        })?;
    let store = RusqliteStore::new(conn);
    store
        .migrate()
        .await
        .map_err(|e| SignalPulseError::Database {
            reason: format!("failed to migrate session store: {e}"),
        })?;
    Ok(store)
}

pub async fn build_router(state: AppState) -> Result<Router, SignalPulseError> {
    let config = Arc::clone(&state.config);

    let backend = Backend::from_config(&*config)?;
    let key = session_key(&*config)?;
    let lifetime = config.get_int("auth", "session_lifetime", DEFAULT_SESSION_LIFETIME_SECS);
    let secure = config.get_bool("web", "secure_cookies", false);

    let session_layer = SessionManagerLayer::new(session_store(&*config).await?)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(lifetime)))
        .with_signed(key);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let router = Router::new()
        .route("/", get(handlers::dashboard).post(handlers::update_params))
        .route("/orders.csv", get(handlers::export_csv))
        .route("/logout", post(handlers::logout))
        .route_layer(login_required!(Backend, login_url = "/login"))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state));

    Ok(router)
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
