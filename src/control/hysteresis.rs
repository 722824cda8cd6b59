//! Activity decisions for a single loop.

/// Bang-bang decision with a hysteresis band centred on `setpoint`.
///
/// Below `setpoint - hysteresis/2` the loop is active unless high-acting;
/// above `setpoint + hysteresis/2` it is active only if high-acting.
/// Inside the band (edges included) the previous decision holds.
pub fn band(previous: bool, value: f32, setpoint: f32, hysteresis: f32, high_acting: bool) -> bool {
    let half = hysteresis / 2.0;
    if value < setpoint - half {
        !high_acting
    } else if value > setpoint + half {
        high_acting
    } else {
        previous
    }
}

/// Time-window decision: active within `[start, start + width)`.
pub fn window(value: f32, start: f32, width: f32) -> bool {
    value >= start && value < start + width
}
