use std::ffi::c_char;
use std::ptr;
use chrono::{TimeZone, Utc};
use crate::error::FrameError;
use crate::frame::{ControlCommand, Gear};
use crate::kinematics::{VesselModel, VesselState};
use crate::nmea::Sentence;

//return codes
pub const VSIM_OK: i32 = 0;
pub const VSIM_ERR_NULL: i32 = -1;
pub const VSIM_ERR_MALFORMED_FRAME: i32 = -2;
pub const VSIM_ERR_INVALID_GEAR: i32 = -3;
pub const VSIM_ERR_BUFFER_TOO_SMALL: i32 = -4;
pub const VSIM_ERR_BAD_TIME: i32 = -5;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct VsimCommand{
    pub rudder_angle: i8,
    pub speed_command: i8,
    pub gear: i8,        //0 neutral, 1 drive, 2 reverse
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct VsimState{
    pub latitude_ddmm: f64,
    pub longitude_ddmm: f64,
    pub heading_deg: f64,
    pub speed_mps: f64,
}

impl From<&VesselState> for VsimState{
    fn from(s: &VesselState) -> Self{
        VsimState{
            latitude_ddmm: s.latitude_ddmm,
            longitude_ddmm: s.longitude_ddmm,
            heading_deg: s.heading_deg,
            speed_mps: s.speed_mps,
        }
    }
}

fn frame_error_code(e: FrameError) -> i32{
    match e{
        FrameError::MalformedFrame{ .. } => VSIM_ERR_MALFORMED_FRAME,
        FrameError::InvalidGear(_) => VSIM_ERR_INVALID_GEAR,
    }
}

//writes a NUL terminated string, returns its length without the NUL
unsafe fn write_str(text: &str, out: *mut c_char, max_len: usize) -> i32{
    let bytes = text.as_bytes();
    if bytes.len() + 1 > max_len{
        return VSIM_ERR_BUFFER_TOO_SMALL;
    }
    unsafe{
        ptr::copy_nonoverlapping(bytes.as_ptr(), out as *mut u8, bytes.len());
        *out.add(bytes.len()) = 0;
    }
    bytes.len() as i32
}

pub struct VsimVessel{
    inner: VesselModel,
}

#[no_mangle]
pub unsafe extern "C" fn vsim_decode_frame(
    data: *const u8,
    len: usize,
    out: *mut VsimCommand,
) -> i32{
    if data.is_null() || out.is_null(){
        return VSIM_ERR_NULL;
    }

    unsafe{
        let slice = std::slice::from_raw_parts(data, len);
        match ControlCommand::from_bytes(slice){
            Ok(cmd) =>{
                *out = VsimCommand{
                    rudder_angle: cmd.rudder_angle,
                    speed_command: cmd.speed_command,
                    gear: cmd.gear.as_i8(),
                };
                VSIM_OK
            }
            Err(e) => frame_error_code(e),
        }
    }
}

#[no_mangle]
pub extern "C" fn vsim_vessel_new(
    latitude_ddmm: f64,
    longitude_ddmm: f64,
    heading_deg: f64,
    speed_mps: f64,
) -> *mut VsimVessel{
    let state = VesselState::new(latitude_ddmm, longitude_ddmm, heading_deg, speed_mps);
    let vessel = Box::new(VsimVessel{ inner: VesselModel::new(state) });
    Box::into_raw(vessel)
}

#[no_mangle]
pub unsafe extern "C" fn vsim_vessel_free(vessel: *mut VsimVessel){
    if !vessel.is_null(){
        unsafe{ drop(Box::from_raw(vessel)); }
    }
}

#[no_mangle]
pub unsafe extern "C" fn vsim_vessel_advance(
    vessel: *mut VsimVessel,
    cmd: VsimCommand,
    dt_seconds: f64,
) -> i32{
    if vessel.is_null(){
        return VSIM_ERR_NULL;
    }

    let gear = match Gear::from_i8(cmd.gear){
        Ok(g) => g,
        Err(e) => return frame_error_code(e),
    };

    unsafe{
        let v = &mut *vessel;
        v.inner.step(&ControlCommand::new(cmd.rudder_angle, cmd.speed_command, gear), dt_seconds);
    }
    VSIM_OK
}

#[no_mangle]
pub unsafe extern "C" fn vsim_vessel_state(vessel: *const VsimVessel, out: *mut VsimState) -> i32{
    if vessel.is_null() || out.is_null(){
        return VSIM_ERR_NULL;
    }
    unsafe{
        *out = VsimState::from((*vessel).inner.state());
    }
    VSIM_OK
}

#[no_mangle]
pub unsafe extern "C" fn vsim_vessel_encode_hdt(
    vessel: *const VsimVessel,
    out: *mut c_char,
    max_len: usize,
) -> i32{
    if vessel.is_null() || out.is_null(){
        return VSIM_ERR_NULL;
    }
    unsafe{
        let sentence = Sentence::heading((*vessel).inner.state());
        write_str(&sentence.to_string(), out, max_len)
    }
}

#[no_mangle]
pub unsafe extern "C" fn vsim_vessel_encode_rmc(
    vessel: *const VsimVessel,
    unix_seconds: i64,
    out: *mut c_char,
    max_len: usize,
) -> i32{
    if vessel.is_null() || out.is_null(){
        return VSIM_ERR_NULL;
    }
    let time = match Utc.timestamp_opt(unix_seconds, 0).single(){
        Some(t) => t,
        None => return VSIM_ERR_BAD_TIME,
    };
    unsafe{
        let sentence = Sentence::position_velocity((*vessel).inner.state(), time);
        write_str(&sentence.to_string(), out, max_len)
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use std::ffi::CStr;
    use crate::nmea::verify;

    #[test]
    fn test_ffi_decode_frame(){
        let mut out = VsimCommand::default();
        let data: [u8; 3] = [0x0A, 0x32, 0x01];
        unsafe{
            assert_eq!(vsim_decode_frame(data.as_ptr(), 3, &mut out), VSIM_OK);
            assert_eq!(out.rudder_angle, 10);
            assert_eq!(out.speed_command, 50);
            assert_eq!(out.gear, 1);

            assert_eq!(vsim_decode_frame(data.as_ptr(), 2, &mut out), VSIM_ERR_MALFORMED_FRAME);
            let bad: [u8; 3] = [0, 0, 9];
            assert_eq!(vsim_decode_frame(bad.as_ptr(), 3, &mut out), VSIM_ERR_INVALID_GEAR);
            assert_eq!(vsim_decode_frame(ptr::null(), 3, &mut out), VSIM_ERR_NULL);
        }
    }

    #[test]
    fn test_ffi_vessel_lifecycle(){
        let vessel = vsim_vessel_new(4454.5453, 3716.1331, 0.0, 0.0);
        assert!(!vessel.is_null());

        unsafe{
            let cmd = VsimCommand{ rudder_angle: 0, speed_command: 0, gear: 2 };
            assert_eq!(vsim_vessel_advance(vessel, cmd, 0.1), VSIM_OK);

            let mut state = VsimState::default();
            assert_eq!(vsim_vessel_state(vessel, &mut state), VSIM_OK);
            assert_eq!(state.heading_deg, 180.0);

            //an infinite step leaves the position untouched
            let ahead = VsimCommand{ rudder_angle: 0, speed_command: 100, gear: 1 };
            assert_eq!(vsim_vessel_advance(vessel, ahead, f64::INFINITY), VSIM_OK);
            assert_eq!(vsim_vessel_state(vessel, &mut state), VSIM_OK);
            assert!((state.latitude_ddmm - 4454.5453).abs() < 1e-8);

            let bad = VsimCommand{ gear: 5, ..cmd };
            assert_eq!(vsim_vessel_advance(vessel, bad, 0.1), VSIM_ERR_INVALID_GEAR);

            vsim_vessel_free(vessel);
        }
    }

    #[test]
    fn test_ffi_encode(){
        let vessel = vsim_vessel_new(4454.5453, 3716.1331, 90.0, 0.0);
        let mut buf = [0 as c_char; 128];

        unsafe{
            let n = vsim_vessel_encode_hdt(vessel, buf.as_mut_ptr(), buf.len());
            assert!(n > 0);
            let text = CStr::from_ptr(buf.as_ptr()).to_str().unwrap();
            assert_eq!(text.len(), n as usize);
            assert_eq!(verify(text).unwrap(), "GPHDT,90.0,T");

            //2024-01-01 00:00:00 UTC
            let n = vsim_vessel_encode_rmc(vessel, 1_704_067_200, buf.as_mut_ptr(), buf.len());
            assert!(n > 0);
            let text = CStr::from_ptr(buf.as_ptr()).to_str().unwrap();
            assert!(verify(text).unwrap().starts_with("GPRMC,000000,A,4454.5453,N,03716.1331,E,"));
            assert!(text.contains(",010124,"));

            let mut small = [0 as c_char; 4];
            assert_eq!(vsim_vessel_encode_hdt(vessel, small.as_mut_ptr(), small.len()), VSIM_ERR_BUFFER_TOO_SMALL);

            vsim_vessel_free(vessel);
        }
    }
}
