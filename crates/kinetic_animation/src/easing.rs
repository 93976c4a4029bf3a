//! Easing functions for animations
//!
//! [`evaluate`] maps linear progress in `[0, 1]` to eased progress. Every
//! standard curve returns exactly 0 at `t = 0` and exactly 1 at `t = 1`.
//! Elastic, Back and Bounce curves leave `[0, 1]` at interior `t`; that
//! overshoot is part of their shape.
//!
//! [`Ease::Custom`] samples a user supplied [`EaseCurve`] through
//! [`evaluate_with`].

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Easing curve identifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    #[default]
    Linear,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InElastic,
    OutElastic,
    InOutElastic,
    InBack,
    OutBack,
    InOutBack,
    InBounce,
    OutBounce,
    InOutBounce,
    /// CSS-style cubic bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
    /// Sample an externally supplied [`EaseCurve`]
    Custom,
}

impl Ease {
    /// Every curve with a closed form, in declaration order
    pub const STANDARD: [Ease; 31] = [
        Ease::Linear,
        Ease::InSine,
        Ease::OutSine,
        Ease::InOutSine,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::InQuart,
        Ease::OutQuart,
        Ease::InOutQuart,
        Ease::InQuint,
        Ease::OutQuint,
        Ease::InOutQuint,
        Ease::InExpo,
        Ease::OutExpo,
        Ease::InOutExpo,
        Ease::InCirc,
        Ease::OutCirc,
        Ease::InOutCirc,
        Ease::InElastic,
        Ease::OutElastic,
        Ease::InOutElastic,
        Ease::InBack,
        Ease::OutBack,
        Ease::InOutBack,
        Ease::InBounce,
        Ease::OutBounce,
        Ease::InOutBounce,
    ];

    /// Apply the easing function to a progress value (0.0 to 1.0)
    ///
    /// `Custom` has no curve here and behaves as `Linear`.
    pub fn apply(&self, t: f32) -> f32 {
        evaluate(t, *self)
    }
}

/// Evaluate a tagged easing curve at `t`
pub fn evaluate(t: f32, ease: Ease) -> f32 {
    evaluate_with(t, ease, None)
}

/// Evaluate at `t`, sampling `curve` when `ease` is [`Ease::Custom`]
pub fn evaluate_with(t: f32, ease: Ease, curve: Option<&EaseCurve>) -> f32 {
    if let Ease::Custom = ease {
        return match curve {
            Some(curve) => curve.evaluate(t),
            None => t.clamp(0.0, 1.0),
        };
    }

    // Endpoints are always exact
    if t <= 0.0 || t.is_nan() {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    match ease {
        Ease::Linear | Ease::Custom => t,
        Ease::InSine => 1.0 - (t * PI / 2.0).cos(),
        Ease::OutSine => (t * PI / 2.0).sin(),
        Ease::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
        Ease::InQuad => t * t,
        Ease::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        Ease::InOutQuad => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
            }
        }
        Ease::InCubic => t * t * t,
        Ease::OutCubic => 1.0 - (1.0 - t).powi(3),
        Ease::InOutCubic => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
            }
        }
        Ease::InQuart => t * t * t * t,
        Ease::OutQuart => 1.0 - (1.0 - t).powi(4),
        Ease::InOutQuart => {
            if t < 0.5 {
                8.0 * t * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
            }
        }
        Ease::InQuint => t * t * t * t * t,
        Ease::OutQuint => 1.0 - (1.0 - t).powi(5),
        Ease::InOutQuint => {
            if t < 0.5 {
                16.0 * t * t * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
            }
        }
        Ease::InExpo => 2f32.powf(10.0 * t - 10.0),
        Ease::OutExpo => 1.0 - 2f32.powf(-10.0 * t),
        Ease::InOutExpo => {
            if t < 0.5 {
                2f32.powf(20.0 * t - 10.0) / 2.0
            } else {
                (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
            }
        }
        Ease::InCirc => 1.0 - (1.0 - t * t).sqrt(),
        Ease::OutCirc => (1.0 - (t - 1.0) * (t - 1.0)).sqrt(),
        Ease::InOutCirc => {
            if t < 0.5 {
                (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
            } else {
                ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
            }
        }
        Ease::InElastic => {
            const C4: f32 = 2.0 * PI / 3.0;
            -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * C4).sin()
        }
        Ease::OutElastic => {
            const C4: f32 = 2.0 * PI / 3.0;
            2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * C4).sin() + 1.0
        }
        Ease::InOutElastic => {
            const C5: f32 = 2.0 * PI / 4.5;
            if t < 0.5 {
                -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * C5).sin()) / 2.0
            } else {
                (2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * C5).sin()) / 2.0 + 1.0
            }
        }
        Ease::InBack => {
            const C1: f32 = 1.70158;
            const C3: f32 = C1 + 1.0;
            C3 * t * t * t - C1 * t * t
        }
        Ease::OutBack => {
            const C1: f32 = 1.70158;
            const C3: f32 = C1 + 1.0;
            1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
        }
        Ease::InOutBack => {
            const C2: f32 = 1.70158 * 1.525;
            if t < 0.5 {
                ((2.0 * t).powi(2) * ((C2 + 1.0) * 2.0 * t - C2)) / 2.0
            } else {
                ((2.0 * t - 2.0).powi(2) * ((C2 + 1.0) * (t * 2.0 - 2.0) + C2) + 2.0) / 2.0
            }
        }
        Ease::InBounce => 1.0 - out_bounce(1.0 - t),
        Ease::OutBounce => out_bounce(t),
        Ease::InOutBounce => {
            if t < 0.5 {
                (1.0 - out_bounce(1.0 - 2.0 * t)) / 2.0
            } else {
                (1.0 + out_bounce(2.0 * t - 1.0)) / 2.0
            }
        }
        Ease::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, x1, y1, x2, y2),
    }
}

fn out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// One axis of a cubic bezier anchored at 0 and 1, as `((a u + b) u + c) u`
///
/// Coefficients are kept in f64 so high frame rates do not jitter.
#[derive(Clone, Copy)]
struct BezierAxis {
    a: f64,
    b: f64,
    c: f64,
}

impl BezierAxis {
    fn new(p1: f32, p2: f32) -> Self {
        let c = 3.0 * f64::from(p1);
        let b = 3.0 * (f64::from(p2) - f64::from(p1)) - c;
        Self {
            a: 1.0 - c - b,
            b,
            c,
        }
    }

    #[inline]
    fn at(self, u: f64) -> f64 {
        ((self.a * u + self.b) * u + self.c) * u
    }

    #[inline]
    fn slope(self, u: f64) -> f64 {
        (3.0 * self.a * u + 2.0 * self.b) * u + self.c
    }

    /// Parameter `u` in [0, 1] where this axis reaches `x`
    ///
    /// Newton steps converge quickly on well-behaved curves; flat spots fall
    /// through to bisection, which always terminates since the axis is
    /// monotonic once its control points sit in [0, 1].
    fn solve(self, x: f64) -> f64 {
        const TOLERANCE: f64 = 1e-7;

        let mut u = x;
        for _ in 0..8 {
            let error = self.at(u) - x;
            if error.abs() < TOLERANCE {
                return u;
            }
            let slope = self.slope(u);
            if slope.abs() < 1e-6 {
                break;
            }
            u = (u - error / slope).clamp(0.0, 1.0);
        }

        let (mut low, mut high) = (0.0, 1.0);
        u = x;
        for _ in 0..32 {
            let error = self.at(u) - x;
            if error.abs() < TOLERANCE {
                break;
            }
            if error < 0.0 {
                low = u;
            } else {
                high = u;
            }
            u = 0.5 * (low + high);
        }
        u
    }
}

/// CSS-style `cubic-bezier(x1, y1, x2, y2)` evaluated at progress `t`
///
/// The x control points are clamped into [0, 1] so x stays a function of
/// the curve parameter. The y control points may overshoot.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let x_axis = BezierAxis::new(x1.clamp(0.0, 1.0), x2.clamp(0.0, 1.0));
    let y_axis = BezierAxis::new(y1, y2);
    y_axis.at(x_axis.solve(f64::from(t))) as f32
}

// ============================================================================
// Custom Curves
// ============================================================================

/// A key on a custom easing curve
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key
    pub in_tangent: f32,
    /// Slope leaving this key
    pub out_tangent: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Piecewise cubic Hermite curve
///
/// Outside the key range the curve holds its first/last value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EaseCurve {
    keys: Vec<CurveKey>,
}

impl EaseCurve {
    /// Build from keys in any order; non-finite keys are dropped
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.retain(|k| k.time.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Straight line from (0, 0) to (1, 1)
    pub fn linear() -> Self {
        Self::new(vec![
            CurveKey::new(0.0, 0.0, 1.0, 1.0),
            CurveKey::new(1.0, 1.0, 1.0, 1.0),
        ])
    }

    /// Smooth curve through `(time, value)` points
    ///
    /// Tangents are finite differences of the neighbouring points
    /// (Catmull-Rom style), one-sided at the ends.
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        let mut sorted: Vec<(f32, f32)> = points
            .iter()
            .copied()
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        let keys = (0..n)
            .map(|i| {
                let prev = sorted[i.saturating_sub(1)];
                let next = sorted[(i + 1).min(n - 1)];
                let span = next.0 - prev.0;
                let tangent = if span > f32::EPSILON {
                    (next.1 - prev.1) / span
                } else {
                    0.0
                };
                CurveKey::new(sorted[i].0, sorted[i].1, tangent, tangent)
            })
            .collect();
        Self { keys }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Sample the curve at `t`; an empty curve is linear
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };
        if t.is_nan() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; always in 1..len here
        let next = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[next - 1];
        let k1 = &self.keys[next];
        let span = k1.time - k0.time;
        if span <= 0.0 {
            return k1.value;
        }

        let s = (t - k0.time) / span;
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * k0.value + h10 * span * k0.out_tangent + h01 * k1.value + h11 * span * k1.in_tangent
    }
}
