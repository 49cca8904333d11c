//! Simulator configuration, loadable from a RON file.
//!
//! ```ron
//! SimConfig(
//!     listen: "127.0.0.1:25565",
//!     output: Udp(dest: "127.0.0.1:25567"),
//!     initial: (latitude_ddmm: 4454.5453, longitude_ddmm: 3716.1331, heading_deg: 0.0, speed_mps: 0.0),
//!     tick_interval_ms: 100,
//!     framing: (combined: true, crlf: false),
//! )
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{config_error, Result};
use crate::kinematics::geo::wrap360;
use crate::kinematics::VesselState;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:25565";
pub const DEFAULT_DEST: &str = "127.0.0.1:25567";
pub const DEFAULT_TICK_MS: u64 = 100;
/// NMEA 0183 line rate.
pub const DEFAULT_SERIAL_BAUD: u32 = 4800;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Where control frames are received.
    pub listen: SocketAddr,
    pub output: OutputConfig,
    pub initial: InitialState,
    pub tick_interval_ms: u64,
    pub framing: Framing,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            listen: default_addr(DEFAULT_LISTEN),
            output: OutputConfig::default(),
            initial: InitialState::default(),
            tick_interval_ms: DEFAULT_TICK_MS,
            framing: Framing::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputConfig {
    Udp { dest: SocketAddr },
    Serial { port: String, baud: u32 },
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::Udp { dest: default_addr(DEFAULT_DEST) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub latitude_ddmm: f64,
    pub longitude_ddmm: f64,
    pub heading_deg: f64,
    pub speed_mps: f64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            latitude_ddmm: 4454.5453,
            longitude_ddmm: 3716.1331,
            heading_deg: 0.0,
            speed_mps: 0.0,
        }
    }
}

impl From<InitialState> for VesselState {
    fn from(init: InitialState) -> Self {
        VesselState::new(init.latitude_ddmm, init.longitude_ddmm, init.heading_deg, init.speed_mps)
    }
}

/// How the sentences of one tick are handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Framing {
    /// Both sentences in one datagram, heading first.
    pub combined: bool,
    /// Terminate each sentence with `\r\n`.
    pub crlf: bool,
}

impl Default for Framing {
    fn default() -> Self {
        Self { combined: true, crlf: false }
    }
}

// the literals above are valid socket addresses
fn default_addr(s: &str) -> SocketAddr {
    s.parse().unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 0)))
}

impl SimConfig {
    pub fn from_ron_str(s: &str) -> Result<Self> {
        let config: SimConfig = ron::from_str(s)?;
        config.validate()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| config_error!("cannot read {}: {}", path.display(), e))?;
        Self::from_ron_str(&content)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Rejects unusable settings, normalizes recoverable ones.
    pub fn validate(mut self) -> Result<Self> {
        if self.tick_interval_ms == 0 {
            return Err(config_error!("tick interval must be greater than 0 ms"));
        }

        if let OutputConfig::Serial { port, baud } = &self.output {
            if port.is_empty() || *baud == 0 {
                return Err(config_error!("serial output needs a port name and a non-zero baud rate"));
            }
        }

        let heading = wrap360(self.initial.heading_deg);
        if heading != self.initial.heading_deg {
            warn!(from = self.initial.heading_deg, to = heading, "initial heading normalized");
            self.initial.heading_deg = heading;
        }

        if !(self.initial.speed_mps >= 0.0) {
            warn!(speed = self.initial.speed_mps, "negative initial speed clamped to 0");
            self.initial.speed_mps = 0.0;
        }

        Ok(self)
    }
}
