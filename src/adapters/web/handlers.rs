//! HTTP request handlers for web adapter.

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_login::AuthSession;
use std::sync::Arc;

use crate::adapters::csv_export::orders_to_csv;
use crate::domain::allocation::allocate;
use crate::domain::error::SignalPulseError;
use crate::domain::order::Order;
use crate::domain::request::{parse_request, AllocationRequest};
use crate::domain::signal::SignalSnapshot;

use super::auth::{safe_next, Backend, Credentials};
use super::templates::{
    DashboardTemplate, FormValues, LoginTemplate, ResultsTemplate, ResultsView,
};
use super::{is_htmx_request, AppState, WebError};

fn render<T: Template>(template: &T) -> Result<Response, WebError> {
    template
        .render()
        .map(|html| Html(html).into_response())
        .map_err(|e| WebError::internal(format!("template error: {e}")))
}

fn current_user(auth_session: &AuthSession<Backend>) -> Result<String, WebError> {
    auth_session
        .user
        .as_ref()
        .map(|u| u.username.clone())
        .ok_or_else(|| WebError::unauthorized("Login required"))
}

/// Read the latest signals on the blocking pool. The outer error is a task
/// failure; the inner one is the signal source's own error.
async fn load_signals(
    state: &AppState,
) -> Result<Result<SignalSnapshot, SignalPulseError>, WebError> {
    let port = Arc::clone(&state.signal_port);
    tokio::task::spawn_blocking(move || port.load_latest())
        .await
        .map_err(|e| WebError::internal(format!("signal loader failed: {e}")))
}

/// Stored parameters for `username`, read on the blocking pool.
async fn load_params(state: &AppState, username: &str) -> Result<AllocationRequest, WebError> {
    let store = Arc::clone(&state.param_store);
    let defaults = state.defaults;
    let user = username.to_string();
    tokio::task::spawn_blocking(move || store.load_or(&user, &defaults))
        .await
        .map_err(|e| WebError::internal(format!("parameter store failed: {e}")))?
        .map_err(WebError::from)
}

async fn save_params(
    state: &AppState,
    username: &str,
    request: AllocationRequest,
) -> Result<(), WebError> {
    let store = Arc::clone(&state.param_store);
    let user = username.to_string();
    tokio::task::spawn_blocking(move || store.save(&user, &request))
        .await
        .map_err(|e| WebError::internal(format!("parameter store failed: {e}")))?
        .map_err(WebError::from)
}

/// Load signals and allocate. A signal failure becomes a warning and an
/// empty order list.
async fn build_orders(
    state: &AppState,
    request: &AllocationRequest,
    warnings: &mut Vec<String>,
) -> Result<(Option<SignalSnapshot>, Vec<Order>), WebError> {
    match load_signals(state).await? {
        Ok(snapshot) => {
            let orders = allocate(&snapshot.rows, request);
            Ok((Some(snapshot), orders))
        }
        Err(e) => {
            tracing::warn!(error = %e, "signal load failed, showing empty order list");
            warnings.push(format!("Signals unavailable: {e}"));
            Ok((None, Vec::new()))
        }
    }
}

async fn respond(
    state: &AppState,
    username: &str,
    request: AllocationRequest,
    mut warnings: Vec<String>,
    headers: &HeaderMap,
) -> Result<Response, WebError> {
    let (snapshot, orders) = build_orders(state, &request, &mut warnings).await?;
    let results = ResultsView::new(&request, snapshot.as_ref(), &orders, warnings);

    if is_htmx_request(headers) {
        render(&ResultsTemplate { results: &results })
    } else {
        render(&DashboardTemplate {
            username,
            form: FormValues::from(&request),
            results,
        })
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession<Backend>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let username = current_user(&auth_session)?;
    let request = load_params(&state, &username).await?;
    respond(&state, &username, request, Vec::new(), &headers).await
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ParamForm {
    pub investable_amount: String,
    pub delta: String,
    pub leverage: String,
    pub universe_size: String,
}

pub async fn update_params(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession<Backend>,
    headers: HeaderMap,
    Form(form): Form<ParamForm>,
) -> Result<Response, WebError> {
    let username = current_user(&auth_session)?;

    let parsed = parse_request(
        &form.investable_amount,
        &form.delta,
        &form.leverage,
        &form.universe_size,
        &state.defaults,
    );
    let warnings: Vec<String> = parsed
        .errors
        .iter()
        .map(|e| format!("{e}; using the default"))
        .collect();

    save_params(&state, &username, parsed.request).await?;
    tracing::info!(
        user = %username,
        investable_amount = parsed.request.investable_amount,
        delta = parsed.request.delta,
        leverage = parsed.request.leverage,
        universe_size = parsed.request.universe_size.get(),
        "updated allocation parameters"
    );

    respond(&state, &username, parsed.request, warnings, &headers).await
}

pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession<Backend>,
) -> Result<Response, WebError> {
    let username = current_user(&auth_session)?;
    let request = load_params(&state, &username).await?;

    let mut warnings = Vec::new();
    let (_, orders) = build_orders(&state, &request, &mut warnings).await?;
    let body = orders_to_csv(&orders)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"orders.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn login_form(
    auth_session: AuthSession<Backend>,
    Query(query): Query<NextQuery>,
) -> Result<Response, WebError> {
    let next = safe_next(query.next.as_deref());
    if auth_session.user.is_some() {
        return Ok(Redirect::to(next).into_response());
    }
    render(&LoginTemplate { error: None, next })
}

pub async fn login(
    mut auth_session: AuthSession<Backend>,
    Form(creds): Form<Credentials>,
) -> Result<Response, WebError> {
    let next = safe_next(creds.next.as_deref()).to_string();
    let username = creds.username.clone();

    let user = match auth_session.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(user = %username, "failed login attempt");
            return render(&LoginTemplate {
                error: Some("Invalid username or password"),
                next: &next,
            });
        }
        Err(e) => return Err(WebError::internal(e.to_string())),
    };

    auth_session
        .login(&user)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    tracing::info!(user = %user.username, "logged in");

    Ok(Redirect::to(&next).into_response())
}

pub async fn logout(mut auth_session: AuthSession<Backend>) -> Result<Response, WebError> {
    auth_session
        .logout()
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/login").into_response())
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
