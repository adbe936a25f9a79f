// ===============================
// src/domain.rs
// ===============================
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fix::FixMessage;

pub type Price = Decimal;
pub type Qty = Decimal;
pub type OrderId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side { Buy, Sell }

impl Side {
    /// FIX tag 54 code.
    pub fn fix_code(&self) -> &'static str {
        match self { Side::Buy => "1", Side::Sell => "2" }
    }

    pub fn from_fix(code: &str) -> Option<Side> {
        match code { "1" => Some(Side::Buy), "2" => Some(Side::Sell), _ => None }
    }

    pub fn label(&self) -> &'static str {
        match self { Side::Buy => "buy", Side::Sell => "sell" }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order { pub order_id: OrderId, pub qty: Qty, pub px: Price, pub side: Side }

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote { pub bid: Price, pub ask: Price }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill { pub cl_id: String, pub side: Side, pub qty: Qty, pub px: Price }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Quote { ts_ns: i128, quote: Quote },
    Order { ts_ns: i128, msg: FixMessage },
    Fill { ts_ns: i128, fill: Fill },
    Inbound { ts_ns: i128, msg: FixMessage },
    Outbound { ts_ns: i128, msg: FixMessage },
}

pub fn now_ns() -> i128 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0) as i128
}
