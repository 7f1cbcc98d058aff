//! HTML templates using Askama, plus the view models they render.

use askama::Template;

use crate::domain::allocation::CapitalSplit;
use crate::domain::order::{BookSummary, Order, Side};
use crate::domain::request::{AllocationRequest, UniverseSize};
use crate::domain::signal::SignalSnapshot;

/// One row of the orders table, pre-formatted for display.
pub struct OrderRow {
    pub symbol: String,
    pub side: &'static str,
    pub side_class: &'static str,
    pub signal: String,
    pub ref_price: String,
    pub weight_pct: String,
    pub notional_usd: String,
    pub quantity: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            symbol: order.symbol.clone(),
            side: order.side.as_str(),
            side_class: match order.side {
                Side::Buy => "buy",
                Side::Sell => "sell",
            },
            signal: format!("{:.2}", order.signal),
            ref_price: format!("{:.4}", order.ref_price),
            weight_pct: format!("{:.3}", order.weight_pct),
            notional_usd: format!("{:.2}", order.notional_usd),
            quantity: format!("{:.4}", order.estimated_quantity()),
        }
    }
}

pub struct SummaryView {
    pub gross: String,
    pub long_cap: String,
    pub short_cap: String,
    pub buy_count: usize,
    pub sell_count: usize,
    pub buy_notional: String,
    pub sell_notional: String,
    pub net_notional: String,
    pub total_weight_pct: String,
}

impl SummaryView {
    pub fn new(split: &CapitalSplit, book: &BookSummary) -> Self {
        Self {
            gross: format!("{:.2}", split.gross),
            long_cap: format!("{:.2}", split.long_cap),
            short_cap: format!("{:.2}", split.short_cap),
            buy_count: book.buy_count,
            sell_count: book.sell_count,
            buy_notional: format!("{:.2}", book.buy_notional),
            sell_notional: format!("{:.2}", book.sell_notional),
            net_notional: format!("{:.2}", book.net_notional()),
            total_weight_pct: format!("{:.3}", book.total_weight_pct),
        }
    }
}

pub struct SignalInfo {
    pub file_name: String,
    pub modified: String,
    pub rows: usize,
    pub dropped: usize,
}

impl From<&SignalSnapshot> for SignalInfo {
    fn from(snapshot: &SignalSnapshot) -> Self {
        Self {
            file_name: snapshot.file_name(),
            modified: snapshot.modified.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            rows: snapshot.rows.len(),
            dropped: snapshot.dropped,
        }
    }
}

/// Everything below the parameter form: warnings, summary, orders.
pub struct ResultsView {
    pub warnings: Vec<String>,
    pub signal: Option<SignalInfo>,
    pub summary: SummaryView,
    pub orders: Vec<OrderRow>,
}

impl ResultsView {
    pub fn new(
        request: &AllocationRequest,
        snapshot: Option<&SignalSnapshot>,
        orders: &[Order],
        warnings: Vec<String>,
    ) -> Self {
        let split = CapitalSplit::from_request(request);
        let book = BookSummary::from_orders(orders);
        Self {
            warnings,
            signal: snapshot.map(SignalInfo::from),
            summary: SummaryView::new(&split, &book),
            orders: orders.iter().map(OrderRow::from).collect(),
        }
    }
}

pub struct UniverseOption {
    pub value: u32,
    pub selected: bool,
}

/// Current parameter values as shown in the form.
pub struct FormValues {
    pub investable_amount: String,
    pub delta: String,
    pub leverage: String,
    pub universe_options: Vec<UniverseOption>,
}

impl From<&AllocationRequest> for FormValues {
    fn from(request: &AllocationRequest) -> Self {
        Self {
            investable_amount: format!("{}", request.investable_amount),
            delta: format!("{:.2}", request.delta),
            leverage: format!("{:.1}", request.leverage),
            universe_options: UniverseSize::ALLOWED
                .iter()
                .map(|&value| UniverseOption {
                    value,
                    selected: value == request.universe_size.get(),
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub username: &'a str,
    pub form: FormValues,
    pub results: ResultsView,
}

/// The HTMX fragment swapped in after a parameter change.
#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate<'a> {
    pub results: &'a ResultsView,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub error: Option<&'a str>,
    pub next: &'a str,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}
