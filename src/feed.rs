// ===============================
// src/feed.rs
// ===============================
//
// Top-of-book sources:
// - TickSimulator : random-walk generator, one quote per call
// - quote_from_message : best bid/ask from an inbound 35=X message
//                        (132 = bid px, 133 = ask px)
//
// Simulator price scale: 2 decimals, moves in whole ticks of 0.01.
//
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::domain::{Price, Quote};
use crate::fix::{msg_type, tags, FixMessage};

const START_BID_TICKS: i64 = 100_00; // 100.00
const FLOOR_BID_TICKS: i64 = 50_00;
const MAX_STEP_TICKS: i64 = 3;
const PX_SCALE: u32 = 2;

pub struct TickSimulator {
    bid_ticks: i64,
    rng: StdRng,
}

impl TickSimulator {
    /// Same seed, same path.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { bid_ticks: START_BID_TICKS, rng }
    }

    pub fn next_quote(&mut self) -> Quote {
        let step = self.rng.gen_range(-MAX_STEP_TICKS..=MAX_STEP_TICKS);
        self.bid_ticks = (self.bid_ticks + step).max(FLOOR_BID_TICKS);
        Quote {
            bid: Decimal::new(self.bid_ticks, PX_SCALE),
            ask: Decimal::new(self.bid_ticks + 1, PX_SCALE),
        }
    }
}

fn positive_px(msg: &FixMessage, tag: u32) -> Option<Price> {
    let px = Decimal::from_str(msg.get_field(tag)?.trim()).ok()?;
    (px > Decimal::ZERO).then_some(px)
}

/// `None` unless the message is a 35=X carrying positive 132 and 133.
pub fn quote_from_message(msg: &FixMessage) -> Option<Quote> {
    if msg.msg_type() != Some(msg_type::MD_INCREMENTAL_REFRESH) {
        return None;
    }
    match (positive_px(msg, tags::BID_PX), positive_px(msg, tags::OFFER_PX)) {
        (Some(bid), Some(ask)) => Some(Quote { bid, ask }),
        _ => {
            debug!(%msg, "feed: 35=X without usable 132/133, ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn simulator_keeps_one_tick_spread_and_floor() {
        let mut sim = TickSimulator::new(Some(7));
        let mut prev = dec!(100.00);
        for _ in 0..10_000 {
            let q = sim.next_quote();
            assert_eq!(q.ask - q.bid, dec!(0.01));
            assert!(q.bid >= dec!(50.00));
            assert!((q.bid - prev).abs() <= dec!(0.03));
            prev = q.bid;
        }
    }

    #[test]
    fn same_seed_same_path() {
        let mut a = TickSimulator::new(Some(42));
        let mut b = TickSimulator::new(Some(42));
        for _ in 0..100 {
            assert_eq!(a.next_quote(), b.next_quote());
        }
    }

    #[test]
    fn md_refresh_becomes_quote() {
        let raw = b"8=FIX.4.4\x0135=X\x0155=AAPL\x01132=189.5\x01133=189.52\x01134=300\x01135=200\x01";
        let q = quote_from_message(&FixMessage::decode(raw)).unwrap();
        assert_eq!(q, Quote { bid: dec!(189.5), ask: dec!(189.52) });
    }

    #[test]
    fn other_types_or_bad_prices_are_not_quotes() {
        let hb = FixMessage::of_type("0").with_field(132, "1").with_field(133, "2");
        assert!(quote_from_message(&hb).is_none());

        let missing_ask = FixMessage::of_type("X").with_field(132, "100");
        assert!(quote_from_message(&missing_ask).is_none());

        let zero_bid = FixMessage::of_type("X").with_field(132, "0").with_field(133, "100");
        assert!(quote_from_message(&zero_bid).is_none());

        let junk = FixMessage::of_type("X").with_field(132, "abc").with_field(133, "100");
        assert!(quote_from_message(&junk).is_none());
    }
}
