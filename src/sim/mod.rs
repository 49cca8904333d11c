/**
 * Telemetry Scheduler and Simulator
 *
 * Two threads share one CommandSlot:
 * 1. receive thread: decodes control frames, overwrites the slot
 * 2. tick thread: every tick reads the slot, advances the vessel,
 *    sends HDT then RMC
 *
 * Neither thread waits on the other.
 */

pub mod ticker;

use std::sync::{Arc, RwLock, atomic::{AtomicBool, AtomicU64, Ordering}};
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, trace, warn};

use crate::config::{Framing, SimConfig};
use crate::error::{Result, SimError};
use crate::kinematics::{VesselModel, VesselState};
use crate::nmea::{encode_tick, Sentence};
use crate::slot::{CommandReader, CommandSlot};
use crate::transport::{frame_sentences, open_sink, ControlReceiver, SentenceSink};
pub use ticker::Ticker;

/// Counters shared by both threads.
#[derive(Debug, Default)]
pub struct SimStats {
    ticks: AtomicU64,
    frames_accepted: AtomicU64,
    frames_rejected: AtomicU64,
    send_failures: AtomicU64,
    missed_ticks: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    pub send_failures: u64,
    pub missed_ticks: u64,
}

impl SimStats {
    pub(crate) fn tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn frame_accepted(&self) -> u64 {
        self.frames_accepted.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn frame_rejected(&self) -> u64 {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn send_failed(&self) -> u64 {
        self.send_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn ticks_missed(&self, n: u64) {
        self.missed_ticks.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_accepted: self.frames_accepted.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            missed_ticks: self.missed_ticks.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ticking,
}

/// Tick core: owns the vessel model and turns the latest command into sentences.
pub struct TelemetryScheduler {
    model: VesselModel,
    reader: CommandReader,
    dt_seconds: f64,
    framing: Framing,
    phase: Phase,
}

impl TelemetryScheduler {
    pub fn new(initial: VesselState, slot: Arc<CommandSlot>, dt_seconds: f64, framing: Framing) -> Self {
        Self {
            model: VesselModel::new(initial),
            reader: CommandReader::new(slot),
            dt_seconds,
            framing,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &VesselState {
        self.model.state()
    }

    /// One tick: apply the latest command (idle if none arrived yet) and encode.
    pub fn tick(&mut self, now: DateTime<Utc>) -> [Sentence; 2] {
        self.phase = Phase::Ticking;

        let (cmd, fresh) = self.reader.poll();
        if fresh {
            debug!(rudder = cmd.rudder_angle, speed = cmd.speed_command, gear = %cmd.gear, "applying new command");
        }

        let state = self.model.step(&cmd, self.dt_seconds);
        encode_tick(state, now)
    }

    /// Ticks and hands the payloads to `sink`. A failed send is logged and
    /// counted, the advanced state is kept.
    pub fn tick_and_send(&mut self, now: DateTime<Utc>, sink: &mut dyn SentenceSink, stats: &SimStats) {
        let sentences = self.tick(now);
        stats.tick();

        for payload in frame_sentences(&sentences, self.framing) {
            match sink.send(&payload) {
                Ok(()) => trace!(payload = %String::from_utf8_lossy(&payload), "sentence out"),
                Err(e) => {
                    let failures = stats.send_failed();
                    warn!(sink = %sink.describe(), error = %e, failures, "send failed");
                }
            }
        }
    }
}

/// Handles of a started simulator.
pub struct SimHandle {
    receiver: JoinHandle<()>,
    ticker: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl SimHandle {
    /// Address the control receiver is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for both threads. A thread that panicked is reported as an error.
    pub fn join(self) -> Result<()> {
        let receiver = join_thread("control-rx", self.receiver);
        let ticker = join_thread("telemetry-tick", self.ticker);
        receiver.and(ticker)
    }
}

fn join_thread(name: &'static str, handle: JoinHandle<()>) -> Result<()> {
    handle.join().map_err(|panic| {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(thread = name, reason = %reason, "simulator thread panicked");
        SimError::ThreadPanicked { name, reason }
    })
}

/// The whole simulator: receive loop plus fixed cadence tick loop.
pub struct Simulator {
    config: SimConfig,
    slot: Arc<CommandSlot>,
    stats: Arc<SimStats>,
    running: Arc<AtomicBool>,
    // latest tick result for observers
    state: Arc<RwLock<VesselState>>,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        let initial = VesselState::from(config.initial);
        Self {
            config,
            slot: Arc::new(CommandSlot::new()),
            stats: Arc::new(SimStats::default()),
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn vessel_state(&self) -> VesselState {
        match self.state.read() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Validates the config, binds the listen socket, opens the sink and
    /// spawns both threads.
    pub fn start(&self) -> Result<SimHandle> {
        let config = self.config.clone().validate()?;

        let receiver = ControlReceiver::bind(config.listen, Arc::clone(&self.slot), Arc::clone(&self.stats))?;
        let local_addr = receiver.local_addr()?;
        let sink = open_sink(&config.output, &receiver)?;

        self.running.store(true, Ordering::SeqCst);
        info!(listen = %local_addr, output = %sink.describe(), interval_ms = config.tick_interval_ms, "simulator started");

        let running = Arc::clone(&self.running);
        let receiver = thread::Builder::new()
            .name("control-rx".into())
            .spawn(move || receiver.run(running))?;

        let ticker = self.spawn_ticker(&config, sink)?;

        Ok(SimHandle { receiver, ticker, local_addr })
    }

    fn spawn_ticker(&self, config: &SimConfig, mut sink: Box<dyn SentenceSink>) -> Result<JoinHandle<()>> {
        let interval = config.tick_interval();
        let mut scheduler = TelemetryScheduler::new(
            VesselState::from(config.initial),
            Arc::clone(&self.slot),
            interval.as_secs_f64(),
            config.framing,
        );
        let running = Arc::clone(&self.running);
        let stats = Arc::clone(&self.stats);
        let shared_state = Arc::clone(&self.state);

        let handle = thread::Builder::new()
            .name("telemetry-tick".into())
            .spawn(move || {
                let mut ticker = Ticker::new(interval);
                while running.load(Ordering::SeqCst) {
                    let missed = ticker.wait();
                    if missed > 0 {
                        stats.ticks_missed(missed);
                        debug!(missed, "tick loop fell behind");
                    }
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }

                    scheduler.tick_and_send(Utc::now(), sink.as_mut(), &stats);

                    if let Ok(mut state) = shared_state.write() {
                        *state = *scheduler.state();
                    }
                }
                debug!("tick loop stopped");
            })?;

        Ok(handle)
    }

    /// Signals both threads to stop; they exit within one receive timeout or tick.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let s = self.stats.snapshot();
            info!(
                ticks = s.ticks,
                frames_accepted = s.frames_accepted,
                frames_rejected = s.frames_rejected,
                send_failures = s.send_failures,
                missed_ticks = s.missed_ticks,
                "simulator stopping"
            );
        }
    }
}
