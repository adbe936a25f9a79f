// ===============================
// src/positions.rs (PnL tracker)
// ===============================
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::trace;

use crate::domain::{Price, Qty, Side};
use crate::metrics::{FILLS, PNL_REALIZED, PNL_TOTAL, POSITION};

/// Signed position (long > 0) and the cash flow realized by fills.
#[derive(Debug, Default, Clone)]
pub struct PnlTracker {
    position: Qty,
    cash: Decimal,
}

impl PnlTracker {
    pub fn new() -> Self { Self::default() }

    /// Fills with a non-positive quantity are dropped without error.
    pub fn on_fill(&mut self, side: Side, qty: Qty, px: Price) {
        if qty <= Decimal::ZERO {
            trace!(?side, %qty, "pnl: non-positive fill ignored");
            return;
        }
        let notional = qty * px;
        match side {
            Side::Buy => {
                self.position += qty;
                self.cash -= notional;
            }
            Side::Sell => {
                self.position -= qty;
                self.cash += notional;
            }
        }

        FILLS.with_label_values(&[side.label()]).inc();
        POSITION.set(self.position.to_f64().unwrap_or(0.0));
        PNL_REALIZED.set(self.cash.to_f64().unwrap_or(0.0));
    }

    pub fn position(&self) -> Qty { self.position }

    pub fn realized_pnl(&self) -> Decimal { self.cash }

    pub fn total_pnl(&self, mid: Price) -> Decimal { self.cash + self.position * mid }

    pub fn mark_to_market(&self, mid: Price) -> Decimal {
        let total = self.total_pnl(mid);
        PNL_TOTAL.set(total.to_f64().unwrap_or(0.0));
        total
    }
}
