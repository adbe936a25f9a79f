// ===============================
// src/system.rs (orchestrator)
// ===============================
//
// Owns the endpoints, the book, the strategy and the PnL tracker, and runs
// one cycle after another until stopped:
//
//   1) wait (bounded) for at most one inbound datagram
//   2) refresh top-of-book: simulator tick, or the inbound 35=X quote
//   3) strategy, only on a cycle that brought a quote and only on a
//      two-sided book; a 35=D intent gets a ClOrdID, is sent, and is filled
//      immediately into the PnL tracker
//   4) inbound message -> router -> response sent if non-empty
//   5) fixed inter-cycle delay
//
// Send failures are logged and counted; the cycle goes on. A receive
// failure ends the run.
//
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, trace, warn};

use crate::book::OrderBook;
use crate::config::{Args, ConfigError, FeedMode, StrategyParams};
use crate::domain::{now_ns, Event, Fill, Side};
use crate::feed::{quote_from_message, TickSimulator};
use crate::fix::{msg_type, tags, FixMessage};
use crate::gateway::{GatewayError, UdpReceiver, UdpSender};
use crate::metrics::{CYCLES, INBOUND, ORDERS, RESPONSES, SEND_ERRORS, SIGNALS, TICKS};
use crate::positions::PnlTracker;
use crate::router;
use crate::strategy::MeanReversion;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("startup failed: {0}")]
    Startup(#[source] GatewayError),
    #[error("transport failed: {0}")]
    Transport(#[source] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState { Stopped, Running }

#[derive(Debug, Clone)]
pub struct SystemCfg {
    pub listen_addr: String,
    pub peer_addr: String,
    pub feed_mode: FeedMode,
    pub sim_seed: Option<u64>,
    pub cycle_delay: Duration,
    pub recv_timeout: Duration,
    pub strategy: StrategyParams,
}

impl SystemCfg {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: args.listen_addr(),
            peer_addr: args.peer_addr(),
            feed_mode: args.feed_mode,
            sim_seed: args.sim_seed,
            cycle_delay: Duration::from_millis(args.cycle_delay_ms),
            recv_timeout: Duration::from_millis(args.recv_timeout_ms),
            strategy: args.strategy_params()?,
        })
    }
}

/// Cloneable stop request. Sticky: once stopped, `start` returns at the
/// next cycle boundary (or immediately if not yet running).
#[derive(Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
        // wakes a pending receive wait; stored as a permit otherwise
        self.wake.notify_one();
    }

    pub fn is_stopped(&self) -> bool { self.flag.load(Ordering::Acquire) }
}

pub struct System {
    cfg: SystemCfg,
    receiver: UdpReceiver,
    sender: UdpSender,
    book: OrderBook,
    strategy: MeanReversion,
    pnl: PnlTracker,
    sim: Option<TickSimulator>,
    recorder: Option<mpsc::Sender<Event>>,
    stop: StopHandle,
    state: RunState,
    next_cl_id: u64,
}

impl System {
    /// Binds the receive endpoint and opens the send endpoint. Whatever was
    /// created before a failure is dropped (and closed) on the way out.
    pub async fn bind(cfg: SystemCfg) -> Result<Self, SystemError> {
        let receiver = UdpReceiver::bind(&cfg.listen_addr).await.map_err(SystemError::Startup)?;
        let sender = UdpSender::open(&cfg.peer_addr).await.map_err(SystemError::Startup)?;

        let sim = match cfg.feed_mode {
            FeedMode::Synthetic => Some(TickSimulator::new(cfg.sim_seed)),
            FeedMode::Inbound => None,
        };
        Ok(Self {
            book: OrderBook::new(cfg.strategy.symbol.clone()),
            strategy: MeanReversion::new(cfg.strategy.clone()),
            pnl: PnlTracker::new(),
            sim,
            recorder: None,
            stop: StopHandle::default(),
            state: RunState::Stopped,
            next_cl_id: 0,
            receiver,
            sender,
            cfg,
        })
    }

    pub fn with_recorder(mut self, tx: mpsc::Sender<Event>) -> Self {
        self.recorder = Some(tx);
        self
    }

    pub fn stop_handle(&self) -> StopHandle { self.stop.clone() }

    pub fn stop(&self) { self.stop.stop(); }

    pub fn state(&self) -> RunState { self.state }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> { self.receiver.local_addr() }

    pub fn book(&self) -> &OrderBook { &self.book }

    pub fn pnl(&self) -> &PnlTracker { &self.pnl }

    pub fn strategy(&self) -> &MeanReversion { &self.strategy }

    /// Main loop; returns once stopped, or with the first fatal transport error.
    pub async fn start(&mut self) -> Result<(), SystemError> {
        self.state = RunState::Running;
        info!(
            feed_mode = %self.cfg.feed_mode.as_str(),
            symbol = %self.book.symbol(),
            peer = %self.sender.peer(),
            "system running"
        );

        let mut res = Ok(());
        while !self.stop.is_stopped() {
            if let Err(e) = self.cycle().await {
                res = Err(e);
                break;
            }
        }

        self.state = RunState::Stopped;
        let mid = self.book.get_midprice();
        info!(
            position = %self.pnl.position(),
            realized = %self.pnl.realized_pnl(),
            total = %self.pnl.total_pnl(mid),
            orders = self.next_cl_id,
            "system stopped"
        );
        res
    }

    async fn cycle(&mut self) -> Result<(), SystemError> {
        CYCLES.inc();
        let inbound = self.poll_inbound().await?;

        let quote = match self.sim.as_mut() {
            Some(sim) => Some(sim.next_quote()),
            None => inbound.as_ref().and_then(quote_from_message),
        };
        if let Some(q) = quote {
            self.book.update(q.bid, q.ask);
            TICKS.inc();
            self.record(Event::Quote { ts_ns: now_ns(), quote: q });

            if self.book.has_quote() {
                let intent = self.strategy.generate_signal(&self.book);
                if intent.msg_type() == Some(msg_type::NEW_ORDER_SINGLE) {
                    self.execute(intent).await;
                }
            }
        }

        if let Some(msg) = inbound {
            self.answer(&msg).await;
        }

        if !self.cfg.cycle_delay.is_zero() {
            sleep(self.cfg.cycle_delay).await;
        }
        Ok(())
    }

    /// At most one datagram, waiting no longer than `recv_timeout` and
    /// giving up early on a stop request.
    async fn poll_inbound(&mut self) -> Result<Option<FixMessage>, SystemError> {
        let wake = self.stop.wake.clone();
        let received = tokio::select! {
            _ = wake.notified() => return Ok(None),
            r = timeout(self.cfg.recv_timeout, self.receiver.recv()) => r,
        };
        let bytes = match received {
            Err(_elapsed) => return Ok(None),
            Ok(res) => res.map_err(SystemError::Transport)?,
        };
        if bytes.is_empty() {
            return Ok(None);
        }

        let msg = FixMessage::decode(&bytes);
        INBOUND.with_label_values(&[type_label(&msg)]).inc();
        debug!(%msg, "inbound");
        self.record(Event::Inbound { ts_ns: now_ns(), msg: msg.clone() });
        Ok(Some(msg))
    }

    async fn execute(&mut self, mut order: FixMessage) {
        let side = order.get_field(tags::SIDE).and_then(Side::from_fix);
        let qty = decimal_field(&order, tags::ORDER_QTY);
        let px = decimal_field(&order, tags::PRICE);
        let (Some(side), Some(qty), Some(px)) = (side, qty, px) else {
            warn!(%order, "order intent missing side/qty/price, dropped");
            return;
        };

        self.next_cl_id += 1;
        let cl_id = format!("CL-{}", self.next_cl_id);
        order.set_field(tags::CL_ORD_ID, cl_id.as_str());
        SIGNALS.with_label_values(&[side.label()]).inc();

        if !self.send(&order).await {
            return;
        }
        ORDERS.inc();
        self.record(Event::Order { ts_ns: now_ns(), msg: order });

        self.pnl.on_fill(side, qty, px);
        let total = self.pnl.mark_to_market(self.book.get_midprice());
        info!(
            %cl_id,
            side = side.label(),
            %qty,
            %px,
            mean = %self.strategy.mean(),
            position = %self.pnl.position(),
            total_pnl = %total,
            "order sent & filled"
        );
        self.record(Event::Fill { ts_ns: now_ns(), fill: Fill { cl_id, side, qty, px } });
    }

    async fn answer(&mut self, inbound: &FixMessage) {
        let resp = router::respond(inbound);
        if resp.is_empty() {
            trace!(msg_type = ?inbound.msg_type(), "no response for inbound");
            return;
        }
        if self.send(&resp).await {
            RESPONSES.with_label_values(&[type_label(&resp)]).inc();
        }
    }

    /// Best effort: a failure is logged and counted, never retried.
    async fn send(&mut self, msg: &FixMessage) -> bool {
        match self.sender.send(&msg.encode()).await {
            Ok(()) => {
                debug!(%msg, "outbound");
                self.record(Event::Outbound { ts_ns: now_ns(), msg: msg.clone() });
                true
            }
            Err(e) => {
                SEND_ERRORS.inc();
                warn!(error = %e, %msg, "send failed, skipped");
                false
            }
        }
    }

    fn record(&self, ev: Event) {
        if let Some(tx) = &self.recorder {
            if tx.try_send(ev).is_err() {
                trace!("recorder busy or closed, event dropped");
            }
        }
    }
}

fn decimal_field(msg: &FixMessage, tag: u32) -> Option<Decimal> {
    Decimal::from_str(msg.get_field(tag)?).ok()
}

/// Bounded label set for the per-type counters.
fn type_label(msg: &FixMessage) -> &'static str {
    match msg.msg_type() {
        Some(msg_type::HEARTBEAT) => "0",
        Some(msg_type::TEST_REQUEST) => "1",
        Some(msg_type::LOGON) => "A",
        Some(msg_type::NEW_ORDER_SINGLE) => "D",
        Some(msg_type::EXECUTION_REPORT) => "8",
        Some(msg_type::MD_INCREMENTAL_REFRESH) => "X",
        Some(_) => "other",
        None => "none",
    }
}
