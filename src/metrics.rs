// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use tracing::{error, info, warn};

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Pipeline --------
pub static TICKS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("ticks_total", "top-of-book updates applied").unwrap());

pub static CYCLES: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("cycles_total", "orchestrator cycles").unwrap());

pub static SIGNALS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(Opts::new("signals_total", "strategy signals by side"), &["side"]).unwrap()
});

pub static WARMING: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("strategy_warming", "1 while the strategy is warming up").unwrap());

pub static ORDERS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("orders_sent_total", "new order singles sent").unwrap());

pub static FILLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(Opts::new("fills_total", "simulated fills by side"), &["side"]).unwrap()
});

// -------- Session traffic --------
pub static INBOUND: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("inbound_messages_total", "inbound messages by tag 35"),
        &["msg_type"],
    )
    .unwrap()
});

pub static RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("responses_total", "responses sent by tag 35"),
        &["msg_type"],
    )
    .unwrap()
});

pub static SEND_ERRORS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("send_errors_total", "outbound sends that failed").unwrap());

// -------- Inventory & PnL --------
pub static POSITION: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("position_qty", "signed position").unwrap());

pub static PNL_REALIZED: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("pnl_realized", "realized cash from fills").unwrap());

pub static PNL_TOTAL: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("pnl_total", "cash + position marked at mid").unwrap());

// ---- Config visibility ----
pub static CONFIG_FEED_MODE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(Opts::new("config_feed_mode", "feed mode (label: mode)"), &["mode"]).unwrap()
});

pub static CONFIG_SYMBOL: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(Opts::new("config_symbol", "configured symbol (label: symbol)"), &["symbol"])
        .unwrap()
});

pub fn init() {
    let results = [
        REGISTRY.register(Box::new(TICKS.clone())),
        REGISTRY.register(Box::new(CYCLES.clone())),
        REGISTRY.register(Box::new(SIGNALS.clone())),
        REGISTRY.register(Box::new(WARMING.clone())),
        REGISTRY.register(Box::new(ORDERS.clone())),
        REGISTRY.register(Box::new(FILLS.clone())),
        REGISTRY.register(Box::new(INBOUND.clone())),
        REGISTRY.register(Box::new(RESPONSES.clone())),
        REGISTRY.register(Box::new(SEND_ERRORS.clone())),
        REGISTRY.register(Box::new(POSITION.clone())),
        REGISTRY.register(Box::new(PNL_REALIZED.clone())),
        REGISTRY.register(Box::new(PNL_TOTAL.clone())),
        REGISTRY.register(Box::new(CONFIG_FEED_MODE.clone())),
        REGISTRY.register(Box::new(CONFIG_SYMBOL.clone())),
    ];
    for r in results {
        if let Err(e) = r {
            warn!(?e, "metrics: register failed");
        }
    }
}

// Encode all metrics in Prometheus text format
fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

// Serve one HTTP request (any path): tiny HTTP 1.1 responder
fn handle_client(mut stream: TcpStream) {
    let mut _req_buf = [0u8; 1024];
    let _ = stream.read(&mut _req_buf);

    let body = encode_metrics();
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

// Dedicated OS thread, so the trading loop stays single-threaded
pub fn serve_metrics(port: u16) {
    thread::spawn(move || {
        let addr = format!("0.0.0.0:{port}");
        let listener = match TcpListener::bind(&addr) {
            Ok(l) => l,
            Err(e) => {
                error!(?e, %addr, "metrics bind failed, endpoint disabled");
                return;
            }
        };
        info!(%addr, "metrics listening");

        for conn in listener.incoming() {
            match conn {
                Ok(stream) => handle_client(stream),
                Err(e) => warn!(?e, "metrics accept error"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_text_contains_registered_counter() {
        init();
        ORDERS.inc();
        let text = String::from_utf8(encode_metrics()).unwrap();
        assert!(text.contains("orders_sent_total"));
    }
}
