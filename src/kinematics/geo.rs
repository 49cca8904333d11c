//! Spherical-earth helpers: DDMM coordinate conversion, cyclic angles and the
//! great-circle destination point.

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Wraps an angle in degrees into `[0, 360)`.
#[inline]
pub fn wrap360(deg: f64) -> f64{
    let x = deg % 360.0;
    let x = if x < 0.0 { x + 360.0 } else { x };
    //-0.0 and tiny negatives that round up to 360.0
    if x >= 360.0 || x == 0.0 { 0.0 } else { x }
}

/// Cyclic addition of two angles in degrees.
#[inline]
pub fn add_cyclic(a: f64, b: f64) -> f64{
    wrap360(a + b)
}

/// `DDMM.mmmm` to decimal degrees.
pub fn ddmm_to_decimal(ddmm: f64) -> f64{
    let degrees = (ddmm / 100.0).trunc();
    let minutes = ddmm - degrees * 100.0;
    degrees + minutes / 60.0
}

/// Decimal degrees to `DDMM.mmmm`.
pub fn decimal_to_ddmm(decimal: f64) -> f64{
    let degrees = decimal.trunc();
    degrees * 100.0 + (decimal - degrees) * 60.0
}

/// `asin` with the argument clamped to `[-1, 1]`; rounding can push it just
/// outside near the poles.
#[inline]
pub fn clamped_asin(x: f64) -> f64{
    x.clamp(-1.0, 1.0).asin()
}

/// Destination reached from (`lat`, `lon`) after travelling `distance_m` along
/// the initial bearing `course`. All angles in radians.
pub fn destination(lat: f64, lon: f64, course: f64, distance_m: f64) -> (f64, f64){
    let delta = distance_m / EARTH_RADIUS_M;
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_d, cos_d) = delta.sin_cos();

    let new_lat = clamped_asin(sin_lat * cos_d + cos_lat * sin_d * course.cos());

    let new_lon = lon + (course.sin() * sin_d * cos_lat).atan2(cos_d - sin_lat * new_lat.sin());

    (new_lat, new_lon)
}
