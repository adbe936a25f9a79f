// ===============================
// src/fix.rs
// ===============================
//
// FIX-style tag/value message and its SOH wire codec.
//
// - Wire form: `tag=value` pairs, each followed by 0x01, ascending tag order.
// - Decoding never fails: empty segments, segments without `=` and segments
//   with a non-numeric tag are skipped one by one, the rest still parses.
//
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

pub const SOH: u8 = 0x01;

pub mod tags {
    pub const CL_ORD_ID: u32 = 11;
    pub const MSG_TYPE: u32 = 35;
    pub const ORDER_QTY: u32 = 38;
    pub const ORD_STATUS: u32 = 39;
    pub const PRICE: u32 = 44;
    pub const SIDE: u32 = 54;
    pub const SYMBOL: u32 = 55;
    pub const ENCRYPT_METHOD: u32 = 98;
    pub const HEART_BT_INT: u32 = 108;
    pub const TEST_REQ_ID: u32 = 112;
    pub const BID_PX: u32 = 132;
    pub const OFFER_PX: u32 = 133;
    pub const EXEC_TYPE: u32 = 150;
}

pub mod msg_type {
    pub const HEARTBEAT: &str = "0";
    pub const TEST_REQUEST: &str = "1";
    pub const LOGON: &str = "A";
    pub const NEW_ORDER_SINGLE: &str = "D";
    pub const EXECUTION_REPORT: &str = "8";
    pub const MD_INCREMENTAL_REFRESH: &str = "X";
}

/// Flat tag -> value record. Keys are unique; the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixMessage {
    fields: BTreeMap<u32, String>,
}

impl FixMessage {
    pub fn new() -> Self { Self::default() }

    /// Start a message with tag 35 already set.
    pub fn of_type(msg_type: &str) -> Self {
        let mut m = Self::new();
        m.set_field(tags::MSG_TYPE, msg_type);
        m
    }

    pub fn set_field(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        self.fields.insert(tag, value.into());
        self
    }

    pub fn with_field(mut self, tag: u32, value: impl Into<String>) -> Self {
        self.set_field(tag, value);
        self
    }

    pub fn get_field(&self, tag: u32) -> Option<&str> {
        self.fields.get(&tag).map(String::as_str)
    }

    pub fn msg_type(&self) -> Option<&str> { self.get_field(tags::MSG_TYPE) }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn len(&self) -> usize { self.fields.len() }

    /// Copy `tag` from `src` when present.
    pub fn echo_field(&mut self, src: &FixMessage, tag: u32) -> &mut Self {
        if let Some(v) = src.get_field(tag) {
            self.set_field(tag, v);
        }
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.fields.len() * 8);
        for (tag, value) in &self.fields {
            out.extend_from_slice(tag.to_string().as_bytes());
            out.push(b'=');
            out.extend_from_slice(value.as_bytes());
            out.push(SOH);
        }
        out
    }

    pub fn decode(data: &[u8]) -> FixMessage {
        let mut msg = FixMessage::new();
        for segment in data.split(|b| *b == SOH) {
            if segment.is_empty() {
                continue;
            }
            let Some(eq) = segment.iter().position(|b| *b == b'=') else {
                trace!(segment = %String::from_utf8_lossy(segment), "fix: segment without '=', skipped");
                continue;
            };
            let tag = std::str::from_utf8(&segment[..eq])
                .ok()
                .and_then(|s| s.parse::<u32>().ok());
            match tag {
                Some(tag) => {
                    let value = String::from_utf8_lossy(&segment[eq + 1..]);
                    msg.set_field(tag, value);
                }
                None => {
                    trace!(segment = %String::from_utf8_lossy(segment), "fix: non-numeric tag, skipped");
                }
            }
        }
        msg
    }
}

/// Human-readable form with `|` in place of SOH, for logs.
impl fmt::Display for FixMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (tag, value) in &self.fields {
            write!(f, "{tag}={value}|")?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any tag -> value mapping without SOH in its values survives
        /// encode + decode unchanged.
        #[test]
        fn prop_encode_decode_round_trip(
            fields in prop::collection::btree_map(any::<u32>(), "[^\x01]{0,12}", 0..16)
        ) {
            let msg = fields
                .iter()
                .fold(FixMessage::new(), |m, (tag, value)| m.with_field(*tag, value.as_str()));
            let decoded = FixMessage::decode(&msg.encode());
            prop_assert_eq!(decoded.len(), fields.len());
            for (tag, value) in &fields {
                prop_assert_eq!(decoded.get_field(*tag), Some(value.as_str()));
            }
        }
    }
}
