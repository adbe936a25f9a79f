// ===============================
// src/lib.rs
// ===============================
pub mod book;
pub mod config;
pub mod domain;
pub mod feed;
pub mod fix;
pub mod gateway;          // UDP receive/send endpoints
pub mod metrics;
pub mod positions;
pub mod recorder;
pub mod router;           // inbound message -> canned response
pub mod strategy;
pub mod system;
