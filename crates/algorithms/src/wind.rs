//! Wind vector conversions
//!
//! Meteorological convention: direction is where the wind blows *from*,
//! in degrees clockwise from north. `u` is the eastward and `v` the
//! northward component.

/// Calm threshold for [`speed_direction`].
const CALM: f64 = 1e-12;

/// `(u, v)` from speed and meteorological direction in degrees.
///
/// ```
/// use windmesh_algorithms::wind::components;
///
/// // a northerly wind blows towards the south
/// let (u, v) = components(10.0, 0.0);
/// assert!(u.abs() < 1e-12 && (v + 10.0).abs() < 1e-12);
/// ```
pub fn components(speed: f64, direction_deg: f64) -> (f64, f64) {
    let theta = direction_deg.to_radians();
    (-speed * theta.sin(), -speed * theta.cos())
}

/// Speed and meteorological direction in `[0, 360)` from `(u, v)`.
///
/// Direction is `NaN` for calm air.
pub fn speed_direction(u: f64, v: f64) -> (f64, f64) {
    let speed = u.hypot(v);
    if !(speed > CALM) {
        return (speed, f64::NAN);
    }
    let dir = (-u).atan2(-v).to_degrees().rem_euclid(360.0);
    (speed, dir)
}
