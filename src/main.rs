// ===============================
// src/main.rs
// ===============================
/*
=============================================================================
Project : fix_node — single-symbol FIX trading node simulator in Rust
Module  : main.rs
Version : 0.1.0

Summary : Receives FIX tag/value datagrams (or simulates ticks), keeps a
          top-of-book, runs a warm-up/active mean-reversion signal, sends
          orders with immediate simulated fills tracked as PnL, and answers
          session messages with canned responses.

Usage   :
  # drive it with a logon + test request (SOH written as $'\x01')
  printf '35=A\x01' | nc -u -w0 127.0.0.1 9999
  printf '35=1\x01112=PING\x01' | nc -u -w0 127.0.0.1 9999

  # metrics
  curl -s localhost:9898/metrics | egrep '^(orders_sent_total|pnl_total|position_qty)'
=============================================================================
*/
use std::process::ExitCode;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fix_node::domain::Event;
use fix_node::system::{System, SystemCfg};
use fix_node::{config, metrics, recorder};

// single-threaded trading loop
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // ---- Logging ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ---- Load config ----
    let args = config::load();
    let cfg = match SystemCfg::from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    // ---- Metrics ----
    metrics::init();
    if args.metrics_port != 0 {
        metrics::serve_metrics(args.metrics_port);
    }
    metrics::CONFIG_FEED_MODE.with_label_values(&[args.feed_mode.as_str()]).set(1);
    metrics::CONFIG_SYMBOL.with_label_values(&[cfg.strategy.symbol.as_str()]).set(1);

    info!(
        listen = %cfg.listen_addr,
        peer = %cfg.peer_addr,
        feed_mode = %args.feed_mode.as_str(),
        symbol = %cfg.strategy.symbol,
        window = cfg.strategy.window,
        alpha = %cfg.strategy.alpha,
        threshold = %cfg.strategy.threshold,
        qty = %cfg.strategy.qty,
        cycle_delay_ms = args.cycle_delay_ms,
        recv_timeout_ms = args.recv_timeout_ms,
        "startup config"
    );

    // ---- System (endpoints bound here; failure aborts startup) ----
    let mut system = match System::bind(cfg).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    // ---- Recorder (optional) ----
    let mut recorder_task = None;
    if let Some(path) = args.record_file.clone() {
        let (rec_tx, rec_rx) = mpsc::channel::<Event>(8192);
        recorder_task = Some(tokio::spawn(recorder::run(rec_rx, path)));
        system = system.with_recorder(rec_tx);
    }

    // ---- Ctrl-C -> stop ----
    let stop = system.stop_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("received shutdown signal");
                stop.stop();
            }
            Err(e) => warn!(?e, "failed to listen for Ctrl-C, stop via code only"),
        }
    });

    let res = system.start().await;

    // drop the system (and its recorder sender) so the recorder drains and exits
    drop(system);
    if let Some(task) = recorder_task {
        let _ = task.await;
    }

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "system terminated");
            ExitCode::FAILURE
        }
    }
}
