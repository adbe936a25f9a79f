// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : fix_node — single-symbol FIX trading node simulator in Rust
Module  : config.rs
Version : 0.1.0

Summary : Receives FIX tag/value datagrams (or simulates ticks), keeps a
          top-of-book, runs a warm-up/active mean-reversion signal, sends
          orders with immediate simulated fills tracked as PnL, and answers
          session messages with canned responses.
=============================================================================
*/
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use thiserror::Error;

/// Where the book's top-of-book comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeedMode {
    /// random-walk tick simulator, one tick per cycle
    Synthetic,
    /// 35=X quotes (tags 132/133) received on the inbound socket
    Inbound,
}

impl FeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::Synthetic => "synthetic",
            FeedMode::Inbound => "inbound",
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(name = "fix_node", version, about = "Single-symbol FIX trading node simulator")]
pub struct Args {
    // transport
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub listen_host: String,
    #[arg(long, env = "CLIENT_IN_PORT", default_value_t = 9999)]
    pub in_port: u16,
    #[arg(long, env = "RESPONSE_HOST", default_value = "127.0.0.1")]
    pub response_host: String,
    #[arg(long, env = "CLIENT_OUT_PORT", default_value_t = 10000)]
    pub out_port: u16,

    // feed
    #[arg(long, env = "FEED_MODE", value_enum, default_value_t = FeedMode::Synthetic)]
    pub feed_mode: FeedMode,
    #[arg(long, env = "SIM_SEED")]
    pub sim_seed: Option<u64>,

    // strategy
    #[arg(long, env = "SYMBOL", default_value = "TEST")]
    pub symbol: String,
    #[arg(long, env = "ORDER_QTY", default_value = "10")]
    pub order_qty: Decimal,
    #[arg(long, env = "WARMUP_WINDOW", default_value_t = 20)]
    pub warmup_window: u32,
    #[arg(long, env = "EMA_ALPHA", default_value = "0.1")]
    pub ema_alpha: Decimal,
    #[arg(long, env = "SIGNAL_THRESHOLD", default_value = "0.005")]
    pub signal_threshold: Decimal,

    // loop pacing
    #[arg(long, env = "CYCLE_DELAY_MS", default_value_t = 5)]
    pub cycle_delay_ms: u64,
    #[arg(long, env = "RECV_TIMEOUT_MS", default_value_t = 1)]
    pub recv_timeout_ms: u64,

    // files/metrics
    #[arg(long, env = "RECORD_FILE")]
    pub record_file: Option<String>,
    /// 0 disables the metrics endpoint
    #[arg(long, env = "METRICS_PORT", default_value_t = 9898)]
    pub metrics_port: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrategyParams {
    pub window: u32,
    pub alpha: Decimal,
    pub threshold: Decimal,
    pub symbol: String,
    pub qty: Decimal,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("EMA alpha must be in (0, 1), got {0}")]
    Alpha(Decimal),
    #[error("warm-up window must be at least 1")]
    Window,
    #[error("signal threshold must be positive, got {0}")]
    Threshold(Decimal),
    #[error("order quantity must be positive, got {0}")]
    Qty(Decimal),
    #[error("symbol must not be empty")]
    Symbol,
}

impl Args {
    pub fn listen_addr(&self) -> String { format!("{}:{}", self.listen_host, self.in_port) }

    pub fn peer_addr(&self) -> String { format!("{}:{}", self.response_host, self.out_port) }

    pub fn strategy_params(&self) -> Result<StrategyParams, ConfigError> {
        if self.ema_alpha <= Decimal::ZERO || self.ema_alpha >= Decimal::ONE {
            return Err(ConfigError::Alpha(self.ema_alpha));
        }
        if self.warmup_window == 0 {
            return Err(ConfigError::Window);
        }
        if self.signal_threshold <= Decimal::ZERO {
            return Err(ConfigError::Threshold(self.signal_threshold));
        }
        if self.order_qty <= Decimal::ZERO {
            return Err(ConfigError::Qty(self.order_qty));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Symbol);
        }
        Ok(StrategyParams {
            window: self.warmup_window,
            alpha: self.ema_alpha,
            threshold: self.signal_threshold,
            symbol: self.symbol.trim().to_string(),
            qty: self.order_qty,
        })
    }
}

pub fn load() -> Args {
    // .env first so the env-backed flags below see it
    let _ = dotenv();
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["fix_node"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("args parse")
    }

    #[test]
    fn explicit_flags_build_params() {
        let args = parse(&[
            "--symbol", "ABC",
            "--order-qty", "5",
            "--warmup-window", "8",
            "--ema-alpha", "0.2",
            "--signal-threshold", "0.01",
            "--feed-mode", "inbound",
            "--in-port", "7001",
            "--response-host", "10.0.0.1",
            "--out-port", "7002",
        ]);
        assert_eq!(args.feed_mode, FeedMode::Inbound);
        assert_eq!(args.peer_addr(), "10.0.0.1:7002");
        assert!(args.listen_addr().ends_with(":7001"));
        assert_eq!(
            args.strategy_params().unwrap(),
            StrategyParams {
                window: 8,
                alpha: dec!(0.2),
                threshold: dec!(0.01),
                symbol: "ABC".into(),
                qty: dec!(5),
            }
        );
    }

    #[test]
    fn alpha_outside_unit_interval_is_rejected() {
        let args = parse(&["--ema-alpha", "1"]);
        assert_eq!(args.strategy_params(), Err(ConfigError::Alpha(dec!(1))));
        let args = parse(&["--ema-alpha", "0"]);
        assert_eq!(args.strategy_params(), Err(ConfigError::Alpha(dec!(0))));
    }

    #[test]
    fn zero_window_and_bad_threshold_are_rejected() {
        assert_eq!(parse(&["--warmup-window", "0", "--ema-alpha", "0.1"]).strategy_params(), Err(ConfigError::Window));
        assert_eq!(
            parse(&["--signal-threshold=-0.1", "--ema-alpha", "0.1", "--warmup-window", "3"]).strategy_params(),
            Err(ConfigError::Threshold(dec!(-0.1)))
        );
    }

    #[test]
    fn non_positive_qty_is_rejected() {
        let args = parse(&["--order-qty", "0", "--ema-alpha", "0.1", "--warmup-window", "3", "--signal-threshold", "0.005"]);
        assert_eq!(args.strategy_params(), Err(ConfigError::Qty(dec!(0))));
    }

    #[test]
    fn bad_feed_mode_fails_to_parse() {
        assert!(Args::try_parse_from(["fix_node", "--feed-mode", "carrier-pigeon"]).is_err());
    }
}
