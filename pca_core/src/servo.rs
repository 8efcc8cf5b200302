//! Servo calibration curve: maps an angle or speed to a duty value.
//!
//! Calibration points sit at -90°, 0° and +90° (stored internally as knots at
//! 0, 90 and 180). Two points, or three evenly spaced ones, give a straight
//! line; an uneven midpoint gives a natural cubic spline through all three.

use crate::phase::PWM_FULL;

/// Knot spacing in degrees.
const KNOT_SPAN: f32 = 90.0;
const FULL_SWEEP: f32 = 2.0 * KNOT_SPAN;

/// `a + b·x + c·x² + d·x³` over one knot interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl CubicSegment {
    #[inline]
    fn eval(&self, x: f32) -> f32 {
        self.a + x * (self.b + x * (self.c + x * self.d))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServoCurve {
    Linear { offset: f32, slope: f32 },
    /// Segments for [0, 90] and (90, 180].
    Spline([CubicSegment; 2]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoEval {
    curve: ServoCurve,
}

impl ServoEval {
    /// Straight line from `min` at -90° to `max` at +90°.
    pub fn linear(min: u16, max: u16) -> Self {
        let min = min.min(PWM_FULL);
        let max = max.clamp(min, PWM_FULL);
        Self {
            curve: linear_curve(min, max),
        }
    }

    /// Curve through `min` at -90°, `mid` at 0° and `max` at +90°.
    ///
    /// Points are forced non-decreasing and capped at full scale.
    pub fn new(min: u16, mid: u16, max: u16) -> Self {
        let min = min.min(PWM_FULL);
        let mid = mid.clamp(min, PWM_FULL);
        let max = max.clamp(mid, PWM_FULL);

        let curve = if max - mid == mid - min {
            linear_curve(min, max)
        } else {
            natural_spline(f32::from(min), f32::from(mid), f32::from(max))
        };
        Self { curve }
    }

    pub fn curve(&self) -> &ServoCurve {
        &self.curve
    }

    pub fn is_spline(&self) -> bool {
        matches!(self.curve, ServoCurve::Spline(_))
    }

    /// Duty for `angle` in degrees, -90 to +90. Out-of-range angles clamp.
    pub fn pwm_for_angle(&self, angle: f32) -> u16 {
        let x = if angle.is_nan() {
            KNOT_SPAN
        } else {
            (angle + KNOT_SPAN).clamp(0.0, FULL_SWEEP)
        };
        let value = match &self.curve {
            ServoCurve::Linear { offset, slope } => offset + slope * x,
            ServoCurve::Spline([lower, upper]) => {
                if x <= KNOT_SPAN {
                    lower.eval(x)
                } else {
                    upper.eval(x - KNOT_SPAN)
                }
            }
        };
        // In range after the clamp, so the cast cannot truncate.
        value.round().clamp(0.0, f32::from(PWM_FULL)) as u16
    }

    /// Duty for a continuous-rotation `speed`, -1 to +1.
    pub fn pwm_for_speed(&self, speed: f32) -> u16 {
        self.pwm_for_angle(speed * KNOT_SPAN)
    }
}

fn linear_curve(min: u16, max: u16) -> ServoCurve {
    ServoCurve::Linear {
        offset: f32::from(min),
        slope: (f32::from(max) - f32::from(min)) / FULL_SWEEP,
    }
}

/// Natural cubic spline through (0, y0), (90, y1), (180, y2).
///
/// Second derivatives vanish at both ends, which leaves a single unknown
/// curvature at the middle knot.
fn natural_spline(y0: f32, y1: f32, y2: f32) -> ServoCurve {
    let h = KNOT_SPAN;
    let rhs = (3.0 / h) * (y2 - y1) - (3.0 / h) * (y1 - y0);
    let c_mid = rhs / (2.0 * FULL_SWEEP);
    let c = [0.0, c_mid, 0.0];
    let y = [y0, y1, y2];

    let segment = |i: usize| CubicSegment {
        a: y[i],
        b: (y[i + 1] - y[i]) / h - h * (c[i + 1] + 2.0 * c[i]) / 3.0,
        c: c[i],
        d: (c[i + 1] - c[i]) / (3.0 * h),
    };
    ServoCurve::Spline([segment(0), segment(1)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_hits_endpoints_and_centre() {
        let s = ServoEval::linear(102, 512);
        assert_eq!(s.pwm_for_angle(-90.0), 102);
        assert_eq!(s.pwm_for_angle(0.0), 307);
        assert_eq!(s.pwm_for_angle(90.0), 512);
    }

    #[test]
    fn spline_segments_meet_at_the_middle_knot() {
        let s = ServoEval::new(100, 400, 500);
        let ServoCurve::Spline([lower, upper]) = *s.curve() else {
            panic!("expected spline");
        };
        assert!((lower.eval(KNOT_SPAN) - upper.eval(0.0)).abs() < 1e-2);
        assert_eq!(lower.c, 0.0);
        assert!((upper.eval(KNOT_SPAN) - 500.0).abs() < 1e-2);
    }

    #[test]
    fn nan_angle_maps_to_centre() {
        let s = ServoEval::linear(100, 500);
        assert_eq!(s.pwm_for_angle(f32::NAN), 300);
    }
}
