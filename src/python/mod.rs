use pyo3::prelude::*;
use pyo3::exceptions::PyValueError;
use chrono::{TimeZone, Utc};
use crate::frame::{ControlCommand, Gear};
use crate::kinematics::{VesselModel, VesselState};
use crate::nmea::{self, Sentence};

fn to_py_err(e: impl std::fmt::Display) -> PyErr{
    PyValueError::new_err(e.to_string())
}

#[pyclass]
pub struct PyVessel{
    inner: VesselModel,
}

#[pymethods]
impl PyVessel{
    #[new]
    #[pyo3(signature = (latitude_ddmm=4454.5453, longitude_ddmm=3716.1331, heading_deg=0.0, speed_mps=0.0))]
    fn new(latitude_ddmm: f64, longitude_ddmm: f64, heading_deg: f64, speed_mps: f64) -> Self{
        PyVessel{
            inner: VesselModel::new(VesselState::new(latitude_ddmm, longitude_ddmm, heading_deg, speed_mps)),
        }
    }

    fn advance(&mut self, rudder_angle: i8, speed_command: i8, gear: i8, dt_seconds: f64) -> PyResult<()>{
        let gear = Gear::from_i8(gear).map_err(to_py_err)?;
        self.inner.step(&ControlCommand::new(rudder_angle, speed_command, gear), dt_seconds);
        Ok(())
    }

    fn apply_frame(&mut self, frame: &[u8], dt_seconds: f64) -> PyResult<()>{
        let cmd = ControlCommand::from_bytes(frame).map_err(to_py_err)?;
        self.inner.step(&cmd, dt_seconds);
        Ok(())
    }

    #[getter]
    fn latitude_ddmm(&self) -> f64{
        self.inner.state().latitude_ddmm
    }

    #[getter]
    fn longitude_ddmm(&self) -> f64{
        self.inner.state().longitude_ddmm
    }

    #[getter]
    fn heading_deg(&self) -> f64{
        self.inner.state().heading_deg
    }

    #[getter]
    fn speed_mps(&self) -> f64{
        self.inner.state().speed_mps
    }

    fn hdt(&self) -> String{
        Sentence::heading(self.inner.state()).to_string()
    }

    fn rmc(&self, unix_seconds: i64) -> PyResult<String>{
        let time = Utc.timestamp_opt(unix_seconds, 0).single()
            .ok_or_else(|| PyValueError::new_err("timestamp out of range"))?;
        Ok(Sentence::position_velocity(self.inner.state(), time).to_string())
    }
}

#[pyfunction]
fn decode_frame(frame: &[u8]) -> PyResult<(i8, i8, i8)>{
    let cmd = ControlCommand::from_bytes(frame).map_err(to_py_err)?;
    Ok((cmd.rudder_angle, cmd.speed_command, cmd.gear.as_i8()))
}

#[pyfunction]
fn verify_sentence(text: &str) -> PyResult<String>{
    nmea::verify(text).map(str::to_string).map_err(to_py_err)
}

#[pymodule]
fn vessel_sim(_py: Python, m: &PyModule) -> PyResult<()>{
    m.add_class::<PyVessel>()?;
    m.add_function(wrap_pyfunction!(decode_frame, m)?)?;
    m.add_function(wrap_pyfunction!(verify_sentence, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_py_vessel_reverse(){
        let mut vessel = PyVessel::new(4454.5453, 3716.1331, 0.0, 0.0);
        vessel.advance(0, 0, 2, 0.1).unwrap();
        assert_eq!(vessel.heading_deg(), 180.0);
    }

    #[test]
    fn test_py_decode_frame(){
        assert_eq!(decode_frame(&[0x0A, 0x32, 0x01]).unwrap(), (10, 50, 1));
    }

    #[test]
    fn test_py_sentences_verify(){
        let vessel = PyVessel::new(4454.5453, 3716.1331, 12.5, 1.0);
        assert_eq!(verify_sentence(&vessel.hdt()).unwrap(), "GPHDT,12.5,T");
        assert!(verify_sentence(&vessel.rmc(0).unwrap()).unwrap().starts_with("GPRMC,000000,A,"));
    }
}
