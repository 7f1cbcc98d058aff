//! Order list CSV export.
//!
//! Columns: `symbol, side, signal, ref_price, weight_pct, notional_usd`.
//! Numbers are written as plain decimals.

use crate::domain::error::SignalPulseError;
use crate::domain::order::Order;
use std::io::Write;

pub const HEADER: [&str; 6] = [
    "symbol",
    "side",
    "signal",
    "ref_price",
    "weight_pct",
    "notional_usd",
];

fn csv_error(e: csv::Error) -> SignalPulseError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => SignalPulseError::Io(io),
        other => SignalPulseError::Io(std::io::Error::other(format!("{:?}", other))),
    }
}

/// Format without exponent; `f64`'s `Display` never uses scientific notation.
fn decimal(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    value.to_string()
}

pub fn write_orders<W: Write>(orders: &[Order], writer: W) -> Result<(), SignalPulseError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).map_err(csv_error)?;

    for order in orders {
        let signal = decimal(order.signal);
        let ref_price = decimal(order.ref_price);
        let weight_pct = decimal(order.weight_pct);
        let notional_usd = decimal(order.notional_usd);
        wtr.write_record([
            order.symbol.as_str(),
            order.side.as_str(),
            signal.as_str(),
            ref_price.as_str(),
            weight_pct.as_str(),
            notional_usd.as_str(),
        ])
        .map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn orders_to_csv(orders: &[Order]) -> Result<String, SignalPulseError> {
    let mut buf = Vec::new();
    write_orders(orders, &mut buf)?;
    String::from_utf8(buf).map_err(|e| SignalPulseError::Io(std::io::Error::other(e)))
}
