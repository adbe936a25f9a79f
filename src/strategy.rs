// ===============================
// src/strategy.rs
// ===============================
//
// Mean-reversion against a smoothed fair value.
//
// Two phases:
// - Warming (count < window): every tick folds the mid into an exponential
//   average that starts at 0, and no order is produced.
// - Active (count == window): the average is frozen at its last warm-up
//   value. mid below mean*(1-threshold) -> Buy at the ask, mid above
//   mean*(1+threshold) -> Sell at the bid, otherwise nothing.
//
// Output is a FIX message: a 35=D New Order Single, or an empty message for
// "no signal".
//
use rust_decimal::Decimal;
use tracing::debug;

use crate::book::OrderBook;
use crate::config::StrategyParams;
use crate::domain::{Price, Side};
use crate::fix::{msg_type, tags, FixMessage};
use crate::metrics::WARMING;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase { Warming, Active }

pub struct MeanReversion {
    mean: Price,
    count: u32,
    params: StrategyParams,
}

impl MeanReversion {
    pub fn new(params: StrategyParams) -> Self {
        WARMING.set(1);
        Self { mean: Decimal::ZERO, count: 0, params }
    }

    pub fn phase(&self) -> Phase {
        if self.count < self.params.window { Phase::Warming } else { Phase::Active }
    }

    pub fn mean(&self) -> Price { self.mean }

    pub fn count(&self) -> u32 { self.count }

    pub fn generate_signal(&mut self, ob: &OrderBook) -> FixMessage {
        let mid = ob.get_midprice();

        if self.phase() == Phase::Warming {
            self.mean += self.params.alpha * (mid - self.mean);
            self.count += 1;
            if self.phase() == Phase::Active {
                WARMING.set(0);
                debug!(mean = %self.mean, ticks = self.count, "strategy: warm-up complete");
            }
            return FixMessage::new();
        }

        let one = Decimal::ONE;
        if mid < self.mean * (one - self.params.threshold) {
            return self.order(Side::Buy, ob.get_best_ask());
        }
        if mid > self.mean * (one + self.params.threshold) {
            return self.order(Side::Sell, ob.get_best_bid());
        }
        FixMessage::new()
    }

    fn order(&self, side: Side, px: Price) -> FixMessage {
        FixMessage::of_type(msg_type::NEW_ORDER_SINGLE)
            .with_field(tags::SYMBOL, self.params.symbol.as_str())
            .with_field(tags::SIDE, side.fix_code())
            .with_field(tags::ORDER_QTY, self.params.qty.to_string())
            .with_field(tags::PRICE, px.to_string())
    }
}
