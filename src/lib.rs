pub mod error;
pub mod frame;
pub mod kinematics;
pub mod nmea;
pub mod slot;
pub mod config;
pub mod transport;
pub mod sim;
pub mod ffi;

#[cfg(feature = "python")]
pub mod python;

pub use error::{FrameError, SentenceError, SimError, Result};
pub use frame::{ControlCommand, Gear, FRAME_SIZE, decode_frame};
pub use kinematics::{VesselModel, VesselState, advance};
pub use nmea::{Sentence, SentenceKind, checksum, encode_tick, verify};
pub use slot::{CommandSlot, CommandReader};
pub use config::{SimConfig, OutputConfig, InitialState, Framing};
pub use transport::{ControlReceiver, SentenceSink, UdpSink, SerialSink};
pub use sim::{Simulator, SimHandle, SimStats, StatsSnapshot, TelemetryScheduler, Ticker};
