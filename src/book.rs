// ===============================
// src/book.rs (order book + top-of-book cache)
// ===============================
//
// One book, two feeds:
// - add_order / cancel_order aggregate resting quantity per price level;
//   the top-of-book pair is re-derived from the levels after each change.
// - update(bid, ask) overwrites the top-of-book pair directly (tick
//   simulator, inbound 35=X quotes).
// Queries always read the top-of-book pair, so callers don't care which
// feed drives the book.
//
use std::cmp::Reverse;
use std::collections::BTreeMap;

use ahash::AHashMap as HashMap;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{Order, OrderId, Price, Qty, Quote, Side};

#[derive(Debug, Default)]
pub struct OrderBook {
    symbol: String,
    bids: BTreeMap<Reverse<Price>, Qty>,
    asks: BTreeMap<Price, Qty>,
    order_index: HashMap<OrderId, Order>,
    top: Quote,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), ..Self::default() }
    }

    pub fn symbol(&self) -> &str { &self.symbol }

    /// Orders with a non-positive quantity and reused ids are ignored.
    pub fn add_order(&mut self, order: Order) {
        if order.qty <= Decimal::ZERO {
            debug!(order_id = order.order_id, qty = %order.qty, "book: non-positive order qty ignored");
            return;
        }
        if self.order_index.contains_key(&order.order_id) {
            debug!(order_id = order.order_id, "book: duplicate order id ignored");
            return;
        }
        match order.side {
            Side::Buy => *self.bids.entry(Reverse(order.px)).or_insert(Decimal::ZERO) += order.qty,
            Side::Sell => *self.asks.entry(order.px).or_insert(Decimal::ZERO) += order.qty,
        }
        self.order_index.insert(order.order_id, order);
        self.refresh_top();
    }

    /// Unknown ids are ignored. The order leaves the index on cancel, so a
    /// second cancel of the same id never touches the level again.
    pub fn cancel_order(&mut self, order_id: OrderId) {
        let Some(order) = self.order_index.remove(&order_id) else { return };
        match order.side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&Reverse(order.px)) {
                    *level -= order.qty;
                }
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&order.px) {
                    *level -= order.qty;
                }
            }
        }
        self.refresh_top();
    }

    pub fn update(&mut self, bid: Price, ask: Price) {
        self.top = Quote { bid, ask };
    }

    pub fn get_best_bid(&self) -> Price { self.top.bid }

    pub fn get_best_ask(&self) -> Price { self.top.ask }

    pub fn get_midprice(&self) -> Price {
        (self.get_best_bid() + self.get_best_ask()) / Decimal::TWO
    }

    pub fn quote(&self) -> Quote { self.top }

    /// Both sides carry a real price (zero is the empty-side sentinel).
    pub fn has_quote(&self) -> bool {
        self.top.bid > Decimal::ZERO && self.top.ask > Decimal::ZERO
    }

    pub fn level_qty(&self, side: Side, px: Price) -> Qty {
        let level = match side {
            Side::Buy => self.bids.get(&Reverse(px)),
            Side::Sell => self.asks.get(&px),
        };
        level.copied().unwrap_or(Decimal::ZERO)
    }

    pub fn active_orders(&self) -> usize { self.order_index.len() }

    fn refresh_top(&mut self) {
        let bid = self
            .bids
            .iter()
            .find(|(_, q)| **q > Decimal::ZERO)
            .map(|(Reverse(p), _)| *p)
            .unwrap_or(Decimal::ZERO);
        let ask = self
            .asks
            .iter()
            .find(|(_, q)| **q > Decimal::ZERO)
            .map(|(p, _)| *p)
            .unwrap_or(Decimal::ZERO);
        self.top = Quote { bid, ask };
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap as StdHashMap;

    const TICKS: std::ops::Range<i64> = 9_900..10_100;

    fn order() -> impl Strategy<Value = Order> {
        (0..16u64, any::<bool>(), TICKS, 1..50u32).prop_map(|(order_id, buy, ticks, qty)| Order {
            order_id,
            qty: Decimal::from(qty),
            px: Decimal::new(ticks, 2),
            side: if buy { Side::Buy } else { Side::Sell },
        })
    }

    /// `Ok` adds an order, `Err` cancels an id.
    fn op() -> impl Strategy<Value = Result<Order, OrderId>> {
        prop_oneof![order().prop_map(Ok::<Order, OrderId>), (0..16u64).prop_map(Err::<Order, OrderId>)]
    }

    fn apply(ob: &mut OrderBook, op: &Result<Order, OrderId>) {
        match op {
            Ok(o) => ob.add_order(o.clone()),
            Err(id) => ob.cancel_order(*id),
        }
    }

    fn snapshot(ob: &OrderBook) -> (Quote, usize, Vec<(Qty, Qty)>) {
        let levels = TICKS
            .map(|t| {
                let px = Decimal::new(t, 2);
                (ob.level_qty(Side::Buy, px), ob.level_qty(Side::Sell, px))
            })
            .collect();
        (ob.quote(), ob.active_orders(), levels)
    }

    proptest! {
        /// Best bid is the highest positive bid level (0 when none), best
        /// ask the lowest positive ask level, after any add/cancel sequence.
        #[test]
        fn prop_best_prices_match_levels(ops in prop::collection::vec(op(), 0..64)) {
            let mut ob = OrderBook::new("TEST");
            let mut live: StdHashMap<OrderId, Order> = StdHashMap::new();
            for op in &ops {
                apply(&mut ob, op);
                match op {
                    Ok(o) => { live.entry(o.order_id).or_insert_with(|| o.clone()); }
                    Err(id) => { live.remove(id); }
                }

                let mut bids: BTreeMap<Price, Qty> = BTreeMap::new();
                let mut asks: BTreeMap<Price, Qty> = BTreeMap::new();
                for o in live.values() {
                    let side = if o.side == Side::Buy { &mut bids } else { &mut asks };
                    *side.entry(o.px).or_insert(Decimal::ZERO) += o.qty;
                }
                let best_bid = bids.keys().next_back().copied().unwrap_or(Decimal::ZERO);
                let best_ask = asks.keys().next().copied().unwrap_or(Decimal::ZERO);
                prop_assert_eq!(ob.get_best_bid(), best_bid);
                prop_assert_eq!(ob.get_best_ask(), best_ask);
                prop_assert_eq!(ob.active_orders(), live.len());
                for (px, qty) in &bids {
                    prop_assert_eq!(ob.level_qty(Side::Buy, *px), *qty);
                }
            }
        }

        /// A repeated cancel of the same id leaves the book unchanged.
        #[test]
        fn prop_cancel_is_idempotent(ops in prop::collection::vec(op(), 0..48), id in 0..16u64) {
            let mut ob = OrderBook::new("TEST");
            for op in &ops {
                apply(&mut ob, op);
            }
            ob.cancel_order(id);
            let before = snapshot(&ob);
            ob.cancel_order(id);
            prop_assert_eq!(snapshot(&ob), before);
        }
    }
}
