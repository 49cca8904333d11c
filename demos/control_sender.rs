/**
 * Control Frame Sender
 *
 * Keyboard helper that sends 3-byte control frames to a running simulator.
 *
 * Usage: cargo run --example control_sender [sim_addr]
 * Default: 127.0.0.1:25565
 */

use std::io::{self, Write};
use std::net::UdpSocket;
use vessel_sim::{ControlCommand, Gear};

const RUDDER_STEP: i8 = 10;
const SPEED_STEP: i8 = 10;

fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let target = args.get(1).map(|s| s.as_str()).unwrap_or("127.0.0.1:25565");

    let socket = UdpSocket::bind("127.0.0.1:0")?;
    let mut cmd = ControlCommand::new(0, 0, Gear::Neutral);

    println!("Sending control frames to {}", target);
    println!("  a/d - rudder port/starboard");
    println!("  w/s - throttle up/down");
    println!("  n/f/r - neutral/drive/reverse");
    println!("  0 - center rudder");
    println!("  x - exit\n");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        match input.trim() {
            "a" => cmd.rudder_angle = cmd.rudder_angle.saturating_sub(RUDDER_STEP),
            "d" => cmd.rudder_angle = cmd.rudder_angle.saturating_add(RUDDER_STEP),
            "w" => cmd.speed_command = cmd.speed_command.saturating_add(SPEED_STEP),
            "s" => cmd.speed_command = cmd.speed_command.saturating_sub(SPEED_STEP),
            "n" => cmd.gear = Gear::Neutral,
            "f" => cmd.gear = Gear::Drive,
            "r" => cmd.gear = Gear::Reverse,
            "0" => cmd.rudder_angle = 0,
            "x" | "exit" | "quit" => break,
            "" => {}
            other => {
                println!("Unknown command: {}", other);
                continue;
            }
        }

        socket.send_to(&cmd.to_bytes(), target)?;
        println!("[TX] rudder={} speed={} gear={}", cmd.rudder_angle, cmd.speed_command, cmd.gear);
    }

    //leave the vessel idle
    socket.send_to(&ControlCommand::default().to_bytes(), target)?;
    Ok(())
}
