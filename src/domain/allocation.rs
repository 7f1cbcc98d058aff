//! Allocation engine: turns signal notionals into a sized order list.
//!
//! The engine is a pure function of its inputs. Longs are ranked by signed
//! notional, shorts by absolute notional, and each book keeps its top `k`
//! names where `k = max(1, min(universe / 2, |longs|, |shorts|))`. Gross
//! capital (`amount * leverage`) is split between the books by `delta`, and
//! each book is weighted in proportion to the signal notionals.

use crate::domain::order::{Order, Side};
use crate::domain::request::{AllocationRequest, UniverseSize};
use crate::domain::signal::SignalRow;

/// Floor for a book's notional sum, so an all-zero book yields zero weights.
pub const WEIGHT_EPSILON: f64 = 1e-12;

/// Gross capital and its split between the long and short books.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalSplit {
    pub gross: f64,
    pub long_cap: f64,
    pub short_cap: f64,
}

impl CapitalSplit {
    /// `delta` is expected in [-1, 1]; callers pass a normalized request.
    pub fn new(gross: f64, delta: f64) -> Self {
        Self {
            gross,
            long_cap: gross * (delta + 1.0) / 2.0,
            short_cap: gross * (1.0 - delta) / 2.0,
        }
    }

    pub fn from_request(request: &AllocationRequest) -> Self {
        let n = request.normalized();
        Self::new(n.investable_amount * n.leverage, n.delta)
    }
}

/// Names kept per book.
pub fn selection_size(universe: UniverseSize, long_count: usize, short_count: usize) -> usize {
    universe.per_side().min(long_count).min(short_count).max(1)
}

/// Top `k` entries of an already ranked book. An empty book stays empty.
fn select(book: &[SignalRow], k: usize) -> &[SignalRow] {
    if book.is_empty() {
        return book;
    }
    &book[..k.min(book.len())]
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

fn size_book(
    book: &[SignalRow],
    side: Side,
    side_cap: f64,
    gross: f64,
    orders: &mut Vec<Order>,
) {
    let total: f64 = book.iter().map(SignalRow::abs_notional).sum();
    let denominator = total.max(WEIGHT_EPSILON);

    for row in book {
        let weight = row.abs_notional() / denominator;
        let notional = side_cap * weight;
        let weight_pct = if gross > 0.0 {
            round_to(100.0 * (notional / gross), 3)
        } else {
            0.0
        };
        orders.push(Order {
            symbol: row.ticker.clone(),
            side,
            signal: row.target_notional,
            ref_price: row.ref_price,
            weight_pct,
            notional_usd: round_to(notional, 2),
        });
    }
}

/// Build the order list for one set of signal rows.
///
/// Never fails: parameters are clamped, incomplete rows are skipped, and an
/// empty input produces an empty list. Buys come first, then sells, each
/// group sorted by descending `notional_usd`.
pub fn allocate(rows: &[SignalRow], request: &AllocationRequest) -> Vec<Order> {
    let request = request.normalized();

    let mut longs: Vec<SignalRow> = Vec::new();
    let mut shorts: Vec<SignalRow> = Vec::new();
    for row in rows.iter().filter(|r| r.is_complete()) {
        if row.is_long() {
            longs.push(row.clone());
        } else if row.is_short() {
            shorts.push(row.clone());
        }
    }

    if longs.is_empty() && shorts.is_empty() {
        return Vec::new();
    }

    longs.sort_by(|a, b| b.target_notional.total_cmp(&a.target_notional));
    shorts.sort_by(|a, b| b.abs_notional().total_cmp(&a.abs_notional()));

    let k = selection_size(request.universe_size, longs.len(), shorts.len());
    let longs = select(&longs, k);
    let shorts = select(&shorts, k);

    let split = CapitalSplit::from_request(&request);

    let mut orders = Vec::with_capacity(longs.len() + shorts.len());
    size_book(longs, Side::Buy, split.long_cap, split.gross, &mut orders);
    size_book(shorts, Side::Sell, split.short_cap, split.gross, &mut orders);

    orders.sort_by(|a, b| {
        (a.side == Side::Sell)
            .cmp(&(b.side == Side::Sell))
            .then_with(|| b.notional_usd.total_cmp(&a.notional_usd))
    });
    orders
}
