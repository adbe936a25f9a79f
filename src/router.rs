// ===============================
// src/router.rs (inbound message -> canned response)
// ===============================
//
// Stateless: the response depends on tag 35 of the inbound message only,
// plus the fields each branch echoes back.
//
//   0 Heartbeat       -> 0
//   1 Test Request    -> 0 + 112 echoed
//   A Logon           -> A, 98=0, 108=30
//   D New Order       -> 8, 150=0, 39=0 + 11/55/54/38 echoed
//   anything else     -> empty (nothing to send)
//
use crate::fix::{msg_type, tags, FixMessage};

/// Encrypt method "none".
pub const ENCRYPT_NONE: &str = "0";
pub const HEARTBEAT_INTERVAL_SECS: &str = "30";
/// Exec type / order status "new".
pub const STATUS_NEW: &str = "0";

pub fn respond(inbound: &FixMessage) -> FixMessage {
    match inbound.msg_type() {
        Some(msg_type::HEARTBEAT) => FixMessage::of_type(msg_type::HEARTBEAT),
        Some(msg_type::TEST_REQUEST) => {
            let mut out = FixMessage::of_type(msg_type::HEARTBEAT);
            out.echo_field(inbound, tags::TEST_REQ_ID);
            out
        }
        Some(msg_type::LOGON) => FixMessage::of_type(msg_type::LOGON)
            .with_field(tags::ENCRYPT_METHOD, ENCRYPT_NONE)
            .with_field(tags::HEART_BT_INT, HEARTBEAT_INTERVAL_SECS),
        Some(msg_type::NEW_ORDER_SINGLE) => {
            let mut out = FixMessage::of_type(msg_type::EXECUTION_REPORT)
                .with_field(tags::EXEC_TYPE, STATUS_NEW)
                .with_field(tags::ORD_STATUS, STATUS_NEW);
            for tag in [tags::CL_ORD_ID, tags::SYMBOL, tags::SIDE, tags::ORDER_QTY] {
                out.echo_field(inbound, tag);
            }
            out
        }
        _ => FixMessage::new(),
    }
}
