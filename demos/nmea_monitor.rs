/**
 * NMEA Monitor
 *
 * Listens where the simulator sends its sentences, checks every checksum
 * and prints a summary at the end.
 *
 * Usage: cargo run --example nmea_monitor [listen_addr] [seconds]
 * Default: 127.0.0.1:25567, 10 s
 */

use std::io;
use std::net::UdpSocket;
use std::time::{Duration, Instant};
use vessel_sim::nmea::{split_sentences, verify};

fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let addr = args.get(1).map(|s| s.as_str()).unwrap_or("127.0.0.1:25567");
    let seconds: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);

    let socket = UdpSocket::bind(addr)?;
    socket.set_read_timeout(Some(Duration::from_millis(200)))?;
    println!("Listening on {} for {} s\n", addr, seconds);

    let mut buf = [0u8; 1024];
    let start = Instant::now();
    let mut hdt_count = 0;
    let mut rmc_count = 0;
    let mut bad_count = 0;

    while start.elapsed() < Duration::from_secs(seconds) {
        let n = match socket.recv_from(&mut buf) {
            Ok((n, _)) => n,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) => return Err(e),
        };

        let text = String::from_utf8_lossy(&buf[..n]);
        for sentence in split_sentences(&text) {
            match verify(sentence) {
                Ok(body) if body.starts_with("GPHDT") => {
                    hdt_count += 1;
                    if hdt_count % 10 == 1 {
                        println!("[HDT] {}", sentence);
                    }
                }
                Ok(body) if body.starts_with("GPRMC") => {
                    rmc_count += 1;
                    if rmc_count % 10 == 1 {
                        println!("[RMC] {}", sentence);
                    }
                }
                Ok(_) => println!("[???] {}", sentence),
                Err(e) => {
                    bad_count += 1;
                    println!("[BAD] {} ({})", sentence, e);
                }
            }
        }
    }

    println!("\n  HDT sentences: {}", hdt_count);
    println!("  RMC sentences: {}", rmc_count);
    println!("  Bad checksums: {}", bad_count);
    Ok(())
}
