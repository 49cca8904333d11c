use std::fmt;
use crate::error::FrameError;

//frame format: [RUDDER][SPEED][GEAR]
//              i8      i8     i8
pub const FRAME_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum Gear{
    #[default]
    Neutral = 0,
    Drive = 1,
    Reverse = 2,
}

impl Gear{
    pub fn from_i8(val: i8) -> Result<Self, FrameError>{
        match val{
            0 => Ok(Gear::Neutral),
            1 => Ok(Gear::Drive),
            2 => Ok(Gear::Reverse),
            other => Err(FrameError::InvalidGear(other)),
        }
    }

    pub fn as_i8(self) -> i8{
        self as i8
    }
}

impl fmt::Display for Gear{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result{
        let name = match self{
            Gear::Neutral => "neutral",
            Gear::Drive => "drive",
            Gear::Reverse => "reverse",
        };
        f.write_str(name)
    }
}

/// Steering and propulsion command decoded from one control frame.
///
/// `rudder_angle` is in tenths of a degree, `speed_command` is a raw signed
/// throttle value that the kinematics model scales to m/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlCommand{
    pub rudder_angle: i8,
    pub speed_command: i8,
    pub gear: Gear,
}

impl ControlCommand{
    pub fn new(rudder_angle: i8, speed_command: i8, gear: Gear) -> Self{
        ControlCommand{ rudder_angle, speed_command, gear }
    }

    /// Decodes a frame. The whole frame is rejected unless it is exactly
    /// [`FRAME_SIZE`] bytes long.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FrameError>{
        if data.len() != FRAME_SIZE{
            return Err(FrameError::MalformedFrame{ len: data.len() });
        }

        let rudder_angle = data[0] as i8;
        let speed_command = data[1] as i8;
        let gear = Gear::from_i8(data[2] as i8)?;

        Ok(ControlCommand{ rudder_angle, speed_command, gear })
    }

    pub fn to_bytes(&self) -> [u8; FRAME_SIZE]{
        [
            self.rudder_angle as u8,
            self.speed_command as u8,
            self.gear.as_i8() as u8,
        ]
    }
}

pub fn decode_frame(data: &[u8]) -> Result<ControlCommand, FrameError>{
    ControlCommand::from_bytes(data)
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_decode_drive_frame(){
        let cmd = decode_frame(&[0x0A, 0x32, 0x01]).unwrap();
        assert_eq!(cmd, ControlCommand{ rudder_angle: 10, speed_command: 50, gear: Gear::Drive });
    }

    #[test]
    fn test_decode_signed_bytes(){
        //0xF6 = -10, 0x80 = -128
        let cmd = decode_frame(&[0xF6, 0x80, 0x02]).unwrap();
        assert_eq!(cmd.rudder_angle, -10);
        assert_eq!(cmd.speed_command, -128);
        assert_eq!(cmd.gear, Gear::Reverse);
    }

    #[test]
    fn test_short_frame_rejected(){
        assert_eq!(decode_frame(&[0x00, 0x01]), Err(FrameError::MalformedFrame{ len: 2 }));
        assert_eq!(decode_frame(&[]), Err(FrameError::MalformedFrame{ len: 0 }));
    }

    #[test]
    fn test_long_frame_rejected(){
        assert_eq!(decode_frame(&[0, 0, 1, 0]), Err(FrameError::MalformedFrame{ len: 4 }));
    }

    #[test]
    fn test_invalid_gear(){
        assert_eq!(decode_frame(&[0, 0, 3]), Err(FrameError::InvalidGear(3)));
        assert_eq!(decode_frame(&[0, 0, 0xFF]), Err(FrameError::InvalidGear(-1)));
    }

    #[test]
    fn test_to_bytes_matches_wire_layout(){
        let cmd = ControlCommand::new(-5, 100, Gear::Neutral);
        assert_eq!(cmd.to_bytes(), [0xFB, 0x64, 0x00]);
        assert_eq!(ControlCommand::from_bytes(&cmd.to_bytes()).unwrap(), cmd);
    }

    #[test]
    fn test_default_is_idle(){
        let cmd = ControlCommand::default();
        assert_eq!(cmd.rudder_angle, 0);
        assert_eq!(cmd.speed_command, 0);
        assert_eq!(cmd.gear, Gear::Neutral);
    }
}
