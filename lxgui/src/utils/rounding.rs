//! Snapping of UI-unit values to the device pixel grid.

/// Specifies how [`round`] snaps a value to the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMethod {
    /// Round to the nearest multiple of the unit.
    Nearest,
    /// Like `Nearest`, but a non-zero input never rounds to zero. The result
    /// has a magnitude of at least 1 and keeps the input's sign.
    NearestNotZero,
    /// Round towards positive infinity.
    Up,
    /// Round towards negative infinity.
    Down,
}

impl Default for RoundingMethod {
    fn default() -> Self {
        RoundingMethod::Nearest
    }
}

/// Round `value` to a multiple of `unit` using `method`.
///
/// `unit` is the size of one device pixel in UI units, i.e. the reciprocal of
/// the interface scaling factor. Non-finite inputs are returned as they are so
/// that unbounded sizes (`f32::INFINITY`) survive rounding.
pub fn round(value: f32, unit: f32, method: RoundingMethod) -> f32 {
    if !value.is_finite() || !(unit > 0.0) {
        return value;
    }

    let scaled = value / unit;
    match method {
        RoundingMethod::Nearest => scaled.round() * unit,
        RoundingMethod::NearestNotZero => {
            let rounded = scaled.round() * unit;
            if value > 0.0 {
                rounded.max(1.0)
            } else if value < 0.0 {
                rounded.min(-1.0)
            } else {
                0.0
            }
        }
        RoundingMethod::Up => scaled.ceil() * unit,
        RoundingMethod::Down => scaled.floor() * unit,
    }
}
