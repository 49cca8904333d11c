/**
 * Datagram boundary
 *
 * - ControlReceiver: UDP receive loop feeding the command slot
 * - SentenceSink: where rendered sentences go (UDP peer or serial line)
 */

use std::io::{self, Write};
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info, trace, warn};

use crate::config::{Framing, OutputConfig};
use crate::error::{Result, SimError};
use crate::frame::ControlCommand;
use crate::nmea::Sentence;
use crate::sim::SimStats;
use crate::slot::CommandSlot;

/// Larger datagrams are truncated and then rejected as malformed.
const MAX_DATAGRAM_SIZE: usize = 100;
/// How often a blocked receive re-checks the running flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(50);
const SERIAL_TIMEOUT: Duration = Duration::from_millis(100);

/// Receives control frames and publishes each valid one to the command slot.
pub struct ControlReceiver {
    socket: UdpSocket,
    slot: Arc<CommandSlot>,
    stats: Arc<SimStats>,
}

impl ControlReceiver {
    pub fn bind(addr: SocketAddr, slot: Arc<CommandSlot>, stats: Arc<SimStats>) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| SimError::Bind { addr, source })?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        info!(addr = %socket.local_addr()?, "listening for control frames");
        Ok(Self { socket, slot, stats })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Second handle on the listening socket, outgoing datagrams then leave
    /// from the listen port.
    pub fn try_clone_socket(&self) -> io::Result<UdpSocket> {
        self.socket.try_clone()
    }

    /// Decodes one datagram. Bad frames are dropped and the previous command stays in effect.
    pub fn handle_datagram(&self, data: &[u8], from: SocketAddr) -> Option<ControlCommand> {
        match ControlCommand::from_bytes(data) {
            Ok(cmd) => {
                let epoch = self.slot.publish(cmd);
                let accepted = self.stats.frame_accepted();
                if accepted == 1 {
                    info!(%from, rudder = cmd.rudder_angle, speed = cmd.speed_command, gear = %cmd.gear, "first control frame");
                } else {
                    debug!(%from, epoch, rudder = cmd.rudder_angle, speed = cmd.speed_command, gear = %cmd.gear, "control frame");
                }
                Some(cmd)
            }
            Err(e) => {
                self.stats.frame_rejected();
                warn!(%from, len = data.len(), error = %e, "control frame dropped");
                None
            }
        }
    }

    /// Runs until `running` is cleared.
    pub fn run(self, running: Arc<AtomicBool>) {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        while running.load(Ordering::SeqCst) {
            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    self.handle_datagram(&buf[..n], from);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => {
                    warn!(error = %e, "UDP receive error");
                    std::thread::sleep(RECV_TIMEOUT);
                }
            }
        }
        debug!("control receiver stopped");
    }
}

/// Destination of rendered sentences.
pub trait SentenceSink: Send {
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;

    fn describe(&self) -> String;
}

pub struct UdpSink {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl UdpSink {
    pub fn new(socket: UdpSocket, dest: SocketAddr) -> Self {
        Self { socket, dest }
    }
}

impl SentenceSink for UdpSink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let n = self.socket.send_to(payload, self.dest)?;
        trace!(bytes = n, dest = %self.dest, "sent");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.dest)
    }
}

pub struct SerialSink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialSink {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(SERIAL_TIMEOUT)
            .open()?;
        info!(port = port_name, baud = baud_rate, "serial output opened");
        Ok(Self { port, name: port_name.to_string() })
    }
}

impl SentenceSink for SerialSink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.port.write_all(payload)?;
        self.port.flush()
    }

    fn describe(&self) -> String {
        format!("serial://{}", self.name)
    }
}

/// Opens the configured sink. UDP output reuses the listening socket.
pub fn open_sink(output: &OutputConfig, receiver: &ControlReceiver) -> Result<Box<dyn SentenceSink>> {
    match output {
        OutputConfig::Udp { dest } => {
            let socket = receiver.try_clone_socket()?;
            Ok(Box::new(UdpSink::new(socket, *dest)))
        }
        OutputConfig::Serial { port, baud } => Ok(Box::new(SerialSink::open(port, *baud)?)),
    }
}

/// Byte payloads for one tick, in send order.
pub fn frame_sentences(sentences: &[Sentence], framing: Framing) -> Vec<Vec<u8>> {
    let render = |s: &Sentence| {
        let mut bytes = s.to_bytes();
        if framing.crlf {
            bytes.extend_from_slice(b"\r\n");
        }
        bytes
    };

    if framing.combined {
        vec![sentences.iter().flat_map(render).collect()]
    } else {
        sentences.iter().map(render).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use chrono::{TimeZone, Utc};
    use crate::frame::Gear;
    use crate::kinematics::VesselState;
    use crate::nmea::encode_tick;

    /// Sink that records every payload.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
        pub fail: bool,
    }

    impl SentenceSink for RecordingSink {
        fn send(&mut self, payload: &[u8]) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::Other, "sink down"));
            }
            self.sent.lock().unwrap().push(payload.to_vec());
            Ok(())
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    fn tick_sentences() -> [Sentence; 2] {
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        encode_tick(&VesselState::default(), time)
    }

    #[test]
    fn test_combined_framing() {
        let sentences = tick_sentences();
        let payloads = frame_sentences(&sentences, Framing { combined: true, crlf: false });
        assert_eq!(payloads.len(), 1);
        let expected = format!("{}{}", sentences[0], sentences[1]);
        assert_eq!(payloads[0], expected.into_bytes());
    }

    #[test]
    fn test_separate_crlf_framing() {
        let sentences = tick_sentences();
        let payloads = frame_sentences(&sentences, Framing { combined: false, crlf: true });
        assert_eq!(payloads.len(), 2);
        assert!(payloads[0].starts_with(b"$GPHDT"));
        assert!(payloads[0].ends_with(b"\r\n"));
        assert!(payloads[1].starts_with(b"$GPRMC"));
    }

    #[test]
    fn test_receiver_keeps_last_good_command() {
        let slot = Arc::new(CommandSlot::new());
        let stats = Arc::new(SimStats::default());
        let receiver = ControlReceiver::bind("127.0.0.1:0".parse().unwrap(), Arc::clone(&slot), Arc::clone(&stats)).unwrap();
        let from: SocketAddr = "127.0.0.1:9".parse().unwrap();

        assert!(receiver.handle_datagram(&[0x0A, 0x32, 0x01], from).is_some());
        assert!(receiver.handle_datagram(&[0x0A, 0x32], from).is_none());
        assert!(receiver.handle_datagram(&[0x0A, 0x32, 0x07], from).is_none());

        assert_eq!(slot.latest_or_default(), ControlCommand::new(10, 50, Gear::Drive));
        assert_eq!(stats.snapshot().frames_accepted, 1);
        assert_eq!(stats.snapshot().frames_rejected, 2);
    }

    #[test]
    fn test_udp_sink_delivers() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();

        let mut sink = UdpSink::new(socket, peer.local_addr().unwrap());
        sink.send(b"$GPHDT,0.0,T*2B").unwrap();

        let mut buf = [0u8; 64];
        let (n, _) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"$GPHDT,0.0,T*2B");
        assert!(sink.describe().starts_with("udp://"));
    }

    #[test]
    fn test_bind_failure_reported() {
        let taken = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();
        let result = ControlReceiver::bind(addr, Arc::new(CommandSlot::new()), Arc::new(SimStats::default()));
        assert!(matches!(result, Err(SimError::Bind { .. })));
    }
}
