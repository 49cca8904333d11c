/**
 * Vessel Simulator Binary
 *
 * Receives 3-byte control frames (rudder, throttle, gear) over UDP and
 * emits $GPHDT / $GPRMC sentences for the simulated vessel at a fixed rate.
 *
 * Usage: vessel_sim [--config sim.ron] [--listen addr] [--dest addr | --serial port] ...
 * Default: listen 127.0.0.1:25565, send to 127.0.0.1:25567 every 100 ms
 */

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vessel_sim::config::{OutputConfig, SimConfig, DEFAULT_SERIAL_BAUD};
use vessel_sim::{Result, Simulator};

#[derive(Parser, Debug)]
#[command(about = "synthetic GPS/heading source driven by UDP control frames")]
struct Args {
    /// RON config file, command line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// address to receive control frames on
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// UDP destination for sentences
    #[arg(long, conflicts_with = "serial")]
    dest: Option<SocketAddr>,

    /// serial port for sentences instead of UDP
    #[arg(long)]
    serial: Option<String>,

    /// serial baud rate
    #[arg(long, default_value_t = DEFAULT_SERIAL_BAUD)]
    baud: u32,

    /// initial latitude as DDMM.mmmm
    #[arg(long)]
    lat: Option<f64>,

    /// initial longitude as DDDMM.mmmm
    #[arg(long)]
    lon: Option<f64>,

    /// initial heading in degrees
    #[arg(long)]
    heading: Option<f64>,

    /// initial speed in m/s
    #[arg(long)]
    speed: Option<f64>,

    /// tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// send each sentence in its own datagram
    #[arg(long)]
    separate: bool,

    /// terminate sentences with CR LF
    #[arg(long)]
    crlf: bool,

    /// log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(&self, mut config: SimConfig) -> Result<SimConfig> {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(dest) = self.dest {
            config.output = OutputConfig::Udp { dest };
        }
        if let Some(port) = &self.serial {
            config.output = OutputConfig::Serial { port: port.clone(), baud: self.baud };
        }
        if let Some(lat) = self.lat {
            config.initial.latitude_ddmm = lat;
        }
        if let Some(lon) = self.lon {
            config.initial.longitude_ddmm = lon;
        }
        if let Some(heading) = self.heading {
            config.initial.heading_deg = heading;
        }
        if let Some(speed) = self.speed {
            config.initial.speed_mps = speed;
        }
        if let Some(ms) = self.interval_ms {
            config.tick_interval_ms = ms;
        }
        if self.separate {
            config.framing.combined = false;
        }
        if self.crlf {
            config.framing.crlf = true;
        }
        config.validate()
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(args: Args) -> Result<()> {
    let base = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let config = args.apply(base)?;

    info!(
        lat = config.initial.latitude_ddmm,
        lon = config.initial.longitude_ddmm,
        heading = config.initial.heading_deg,
        "initial vessel position"
    );

    let sim = Arc::new(Simulator::new(config));
    let handle = sim.start()?;

    let stopper = Arc::clone(&sim);
    ctrlc::set_handler(move || stopper.shutdown())
        .map_err(|e| vessel_sim::SimError::Config(format!("cannot install signal handler: {e}")))?;

    handle.join()?;
    info!(state = ?sim.vessel_state(), "final vessel state");
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = run(args) {
        error!(error = %e, "vessel simulator failed");
        std::process::exit(1);
    }
}
