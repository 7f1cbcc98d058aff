//! Orders produced by the allocation engine.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub symbol: String,
    /// Side of the book the row was selected from, not the sign of
    /// `notional_usd`.
    pub side: Side,
    /// The signed target notional from the signal file.
    pub signal: f64,
    pub ref_price: f64,
    /// Share of gross capital in percent, rounded to 3 decimals.
    pub weight_pct: f64,
    /// Dollar size, rounded to 2 decimals.
    pub notional_usd: f64,
}

impl Order {
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Approximate unit count at the reference price.
    pub fn estimated_quantity(&self) -> f64 {
        if self.ref_price > 0.0 {
            self.notional_usd / self.ref_price
        } else {
            0.0
        }
    }
}

/// Totals over an order list, for display next to the table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BookSummary {
    pub buy_count: usize,
    pub sell_count: usize,
    pub buy_notional: f64,
    pub sell_notional: f64,
    pub total_weight_pct: f64,
}

impl BookSummary {
    pub fn from_orders(orders: &[Order]) -> Self {
        orders.iter().fold(Self::default(), |mut acc, o| {
            match o.side {
                Side::Buy => {
                    acc.buy_count += 1;
                    acc.buy_notional += o.notional_usd;
                }
                Side::Sell => {
                    acc.sell_count += 1;
                    acc.sell_notional += o.notional_usd;
                }
            }
            acc.total_weight_pct += o.weight_pct;
            acc
        })
    }

    /// Long exposure minus short exposure.
    pub fn net_notional(&self) -> f64 {
        self.buy_notional - self.sell_notional
    }

    pub fn gross_notional(&self) -> f64 {
        self.buy_notional + self.sell_notional
    }

    pub fn order_count(&self) -> usize {
        self.buy_count + self.sell_count
    }
}
