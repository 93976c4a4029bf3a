//! Damped spring integration
//!
//! One step of a second-order system pulling `value` toward `target`:
//!
//! ```text
//! x'' = -stiffness * (x - c) - damping * (x' - target_velocity)
//! damping = 2 * damping_ratio * sqrt(stiffness)
//! ```
//!
//! Unit mass is assumed throughout. Every function advances the state in
//! place by `dt` seconds using a closed-form solution, so large steps stay
//! stable where explicit integrators (Euler, RK4) blow up.
//!
//! Tiers, fastest first:
//!
//! - [`spring_simple`]: critical damping only, approximate exponential
//! - [`spring_elastic`]: any damping ratio, approximate exponential, `f32`
//! - [`spring_precise`]: any damping ratio, exact exponential, `f64`, with
//!   series fallbacks near the critical point and overflow-safe hyperbolics
//! - [`spring_simple_velocity_smoothing`], [`spring_simple_duration_limit`],
//!   [`spring_simple_double_smoothing`]: `spring_simple` driven through an
//!   auxiliary intermediate state
//!
//! The `*_lanes` variants apply the same step to each lane of a vector value.
//! Lanes are independent because stiffness and damping are scalar.

use kinetic_core::Lanes;

/// `|damping_ratio - 1|` below this is treated as critically damped
pub const CRITICAL_EPSILON: f32 = 1e-3;

/// Absolute tolerance used by [`approximately`]
pub const APPROX_ABS_EPSILON: f32 = 1e-3;

/// Relative tolerance used by [`approximately`]
pub const APPROX_REL_EPSILON: f32 = 1e-5;

/// How far ahead (in half-lives) the smoothing variants aim their goal
const APPREHENSION: f32 = 2.0;

const EPSILON: f32 = 1e-5;

/// Below this `w * dt`, sin/sinh over w switch to their Taylor series
const SERIES_THRESHOLD: f64 = 1e-4;

/// Convergence check with absolute and relative tolerance
///
/// Floating accumulation never lands exactly on the target, so spring
/// completion is decided by this instead of equality.
#[inline]
pub fn approximately(value: f32, target: f32) -> bool {
    if value == target {
        return true;
    }
    let diff = (value - target).abs();
    let scale = value.abs().max(target.abs());
    diff <= APPROX_ABS_EPSILON.max(APPROX_REL_EPSILON * scale)
}

/// [`approximately`] over the active lanes of a value
pub fn approximately_lanes(value: &[f32; 4], target: &[f32; 4], lanes: usize) -> bool {
    value
        .iter()
        .zip(target.iter())
        .take(lanes)
        .all(|(v, t)| approximately(*v, *t))
}

/// `exp(-x)` for `x >= 0` without calling `exp`
#[inline]
fn fast_negexp(x: f32) -> f32 {
    1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x)
}

/// Time for the critically damped error to halve, given `y = sqrt(stiffness)`
#[inline]
fn half_life(y: f32) -> f32 {
    // Critical decay is (1 + y t) e^(-y t); 1.678 solves (1 + u) e^(-u) = 0.5.
    1.678_347 / (y + EPSILON)
}

/// Resting point of a spring whose goal moves at `target_velocity`
#[inline]
fn resting_point(target: f32, target_velocity: f32, y: f32, stiffness: f32) -> f32 {
    if target_velocity == 0.0 {
        target
    } else {
        target + (2.0 * y * target_velocity) / (stiffness + EPSILON)
    }
}

/// Where a spring chasing `target` with goal velocity `target_velocity` comes to rest
///
/// Equal to `target` when the goal velocity is zero. Pass a damping ratio of
/// 1.0 for [`spring_simple`].
pub fn rest_position(
    target: f32,
    target_velocity: f32,
    damping_ratio: f32,
    stiffness: f32,
) -> f32 {
    let s = stiffness.max(0.0);
    resting_point(target, target_velocity, damping_ratio.max(0.0) * s.sqrt(), s)
}

// ============================================================================
// Scalar Dampers
// ============================================================================

/// Critically damped step
///
/// The damping ratio is implicitly 1.0.
#[inline]
pub fn spring_simple(
    dt: f32,
    value: &mut f32,
    velocity: &mut f32,
    target: f32,
    target_velocity: f32,
    stiffness: f32,
) {
    let s = stiffness.max(0.0);
    let y = s.sqrt();
    let c = resting_point(target, target_velocity, y, s);
    critical_step(dt, value, velocity, c, y, fast_negexp(y * dt));
}

#[inline]
fn critical_step(dt: f32, value: &mut f32, velocity: &mut f32, c: f32, y: f32, eydt: f32) {
    let j0 = *value - c;
    let j1 = *velocity + j0 * y;
    *value = eydt * (j0 + j1 * dt) + c;
    *velocity = eydt * (*velocity - j1 * y * dt);
}

/// General damping ratio step using the fast exponential approximation
pub fn spring_elastic(
    dt: f32,
    value: &mut f32,
    velocity: &mut f32,
    target: f32,
    target_velocity: f32,
    damping_ratio: f32,
    stiffness: f32,
) {
    let s = stiffness.max(0.0);
    let ratio = damping_ratio.max(0.0);
    let root = s.sqrt();
    let y = ratio * root;
    let c = resting_point(target, target_velocity, y, s);

    if (ratio - 1.0).abs() < CRITICAL_EPSILON {
        critical_step(dt, value, velocity, c, y, fast_negexp(y * dt));
    } else if ratio < 1.0 {
        let w = (s - y * y).sqrt();
        let a = *value - c;
        let b = (*velocity + y * a) / (w + EPSILON);
        let eydt = fast_negexp(y * dt);
        let (sin, cos) = (w * dt).sin_cos();

        *value = c + eydt * (a * cos + b * sin);
        *velocity = eydt * ((w * b - y * a) * cos - (w * a + y * b) * sin);
    } else {
        let disc = (y * y - s).sqrt();
        let y0 = y + disc;
        let y1 = y - disc;
        let j1 = (c * y0 - *value * y0 - *velocity) / (y1 - y0);
        let j0 = *value - j1 - c;
        let ey0dt = fast_negexp(y0 * dt);
        let ey1dt = fast_negexp(y1 * dt);

        *value = j0 * ey0dt + j1 * ey1dt + c;
        *velocity = -y0 * j0 * ey0dt - y1 * j1 * ey1dt;
    }
}

/// General damping ratio step computed in `f64` with exact exponentials
///
/// All three regimes share one form:
///
/// ```text
/// x(t) = c + e^(-y t) * (a * C(t) + b * S(t))
/// ```
///
/// with `C = cos(w t)`, `S = sin(w t) / w` when underdamped, their hyperbolic
/// counterparts when overdamped, and `C = 1`, `S = t` at the critical point.
/// `S` switches to its series when `w t` is tiny, which removes the division
/// by a near-zero `w` that the split-regime formulas suffer from.
pub fn spring_precise(
    dt: f32,
    value: &mut f32,
    velocity: &mut f32,
    target: f32,
    target_velocity: f32,
    damping_ratio: f32,
    stiffness: f32,
) {
    let dt = dt.max(0.0) as f64;
    let s = stiffness.max(0.0) as f64;
    let ratio = damping_ratio.max(0.0) as f64;
    let y = ratio * s.sqrt();
    let c = if target_velocity == 0.0 {
        target as f64
    } else {
        target as f64 + (2.0 * y * target_velocity as f64) / (s + EPSILON as f64)
    };

    let x0 = *value as f64;
    let v0 = *velocity as f64;
    let a = x0 - c;
    let b = v0 + y * a;

    // k = w^2 for underdamped, -w^2 for overdamped
    let k = if (ratio - 1.0).abs() < CRITICAL_EPSILON as f64 {
        0.0
    } else {
        s - y * y
    };

    // (e^(-y t) * C, e^(-y t) * S)
    let (ec, es) = if k > 0.0 {
        let w = k.sqrt();
        let eydt = (-y * dt).exp();
        let wt = w * dt;
        let sinc = if wt < SERIES_THRESHOLD {
            dt * (1.0 - wt * wt / 6.0)
        } else {
            wt.sin() / w
        };
        (eydt * wt.cos(), eydt * sinc)
    } else if k < 0.0 {
        let w = (-k).sqrt();
        let wt = w * dt;
        // y - w computed as s / (y + w) to avoid cancellation when y ~ w
        let slow = (-(s / (y + w)) * dt).exp();
        let fast = (-(y + w) * dt).exp();
        let sinhc = if wt < SERIES_THRESHOLD {
            (-y * dt).exp() * dt * (1.0 + wt * wt / 6.0)
        } else {
            (slow - fast) / (2.0 * w)
        };
        ((slow + fast) * 0.5, sinhc)
    } else {
        let eydt = (-y * dt).exp();
        (eydt, eydt * dt)
    };

    *value = (c + a * ec + b * es) as f32;
    *velocity = (v0 * ec - (y * b + k * a) * es) as f32;
}

/// Critically damped step that follows a goal moving toward `target` at no
/// more than `max_velocity`
///
/// `intermediate` tracks that rate-limited goal between calls and should
/// start at the initial value. Large target jumps are spread over time,
/// which keeps the velocity estimate smooth. A non-positive `max_velocity`
/// disables the limit.
pub fn spring_simple_velocity_smoothing(
    dt: f32,
    value: &mut f32,
    velocity: &mut f32,
    intermediate: &mut f32,
    target: f32,
    max_velocity: f32,
    stiffness: f32,
) {
    let y = stiffness.max(0.0).sqrt();
    let diff = target - *intermediate;
    let distance = diff.abs();

    if max_velocity <= 0.0 {
        *intermediate = target;
        spring_simple(dt, value, velocity, target, 0.0, stiffness);
        return;
    }

    let step = diff.signum() * max_velocity;
    let lookahead = dt + APPREHENSION * half_life(y);
    let goal = if lookahead < distance / max_velocity {
        *intermediate + step * lookahead
    } else {
        target
    };

    spring_simple(dt, value, velocity, goal, 0.0, stiffness);

    *intermediate = if distance > dt * max_velocity {
        *intermediate + step * dt
    } else {
        target
    };
}

/// Critically damped step that reaches `target` once `remaining` seconds
/// have passed
///
/// `intermediate` moves linearly from its start to the target over the
/// remaining time and the spring chases a point slightly ahead of it. When
/// `remaining` runs out the state snaps onto the target, bounding the
/// worst-case settle time at the cost of a small discontinuity.
pub fn spring_simple_duration_limit(
    dt: f32,
    value: &mut f32,
    velocity: &mut f32,
    intermediate: &mut f32,
    target: f32,
    remaining: f32,
    stiffness: f32,
) {
    if remaining <= dt || remaining <= 0.0 {
        *value = target;
        *velocity = 0.0;
        *intermediate = target;
        return;
    }

    let y = stiffness.max(0.0).sqrt();
    let goal_velocity = (target - *intermediate) / remaining;
    let lookahead = dt + APPREHENSION * half_life(y);
    let goal = if lookahead < remaining {
        *intermediate + goal_velocity * lookahead
    } else {
        target
    };

    spring_simple(dt, value, velocity, goal, 0.0, stiffness);
    *intermediate += goal_velocity * dt;
}

/// Two chained critically damped steps
///
/// The intermediate spring follows the target and the value follows the
/// intermediate. Each stage runs at four times the stiffness (half the
/// half-life) so the pair settles in about the same time as one simple
/// spring, with a smoother S-shaped start.
pub fn spring_simple_double_smoothing(
    dt: f32,
    value: &mut f32,
    velocity: &mut f32,
    intermediate: &mut f32,
    intermediate_velocity: &mut f32,
    target: f32,
    stiffness: f32,
) {
    let stage = stiffness * 4.0;
    spring_simple(dt, intermediate, intermediate_velocity, target, 0.0, stage);
    spring_simple(dt, value, velocity, *intermediate, 0.0, stage);
}

// ============================================================================
// Vector Dampers
// ============================================================================

/// [`spring_simple`] over every lane of `T`
pub fn spring_simple_lanes<T: Lanes>(
    dt: f32,
    value: &mut T,
    velocity: &mut T,
    target: T,
    target_velocity: T,
    stiffness: f32,
) {
    let mut x = value.to_lanes();
    let mut v = velocity.to_lanes();
    let g = target.to_lanes();
    let q = target_velocity.to_lanes();
    for i in 0..T::LANES {
        spring_simple(dt, &mut x[i], &mut v[i], g[i], q[i], stiffness);
    }
    *value = T::from_lanes(x);
    *velocity = T::from_lanes(v);
}

/// [`spring_elastic`] over every lane of `T`
pub fn spring_elastic_lanes<T: Lanes>(
    dt: f32,
    value: &mut T,
    velocity: &mut T,
    target: T,
    target_velocity: T,
    damping_ratio: f32,
    stiffness: f32,
) {
    let mut x = value.to_lanes();
    let mut v = velocity.to_lanes();
    let g = target.to_lanes();
    let q = target_velocity.to_lanes();
    for i in 0..T::LANES {
        spring_elastic(dt, &mut x[i], &mut v[i], g[i], q[i], damping_ratio, stiffness);
    }
    *value = T::from_lanes(x);
    *velocity = T::from_lanes(v);
}

/// [`spring_precise`] over every lane of `T`
pub fn spring_precise_lanes<T: Lanes>(
    dt: f32,
    value: &mut T,
    velocity: &mut T,
    target: T,
    target_velocity: T,
    damping_ratio: f32,
    stiffness: f32,
) {
    let mut x = value.to_lanes();
    let mut v = velocity.to_lanes();
    let g = target.to_lanes();
    let q = target_velocity.to_lanes();
    for i in 0..T::LANES {
        spring_precise(dt, &mut x[i], &mut v[i], g[i], q[i], damping_ratio, stiffness);
    }
    *value = T::from_lanes(x);
    *velocity = T::from_lanes(v);
}

/// [`spring_simple_velocity_smoothing`] over every lane of `T`
pub fn spring_simple_velocity_smoothing_lanes<T: Lanes>(
    dt: f32,
    value: &mut T,
    velocity: &mut T,
    intermediate: &mut T,
    target: T,
    max_velocity: f32,
    stiffness: f32,
) {
    let mut x = value.to_lanes();
    let mut v = velocity.to_lanes();
    let mut xi = intermediate.to_lanes();
    let g = target.to_lanes();
    for i in 0..T::LANES {
        spring_simple_velocity_smoothing(
            dt,
            &mut x[i],
            &mut v[i],
            &mut xi[i],
            g[i],
            max_velocity,
            stiffness,
        );
    }
    *value = T::from_lanes(x);
    *velocity = T::from_lanes(v);
    *intermediate = T::from_lanes(xi);
}

/// [`spring_simple_duration_limit`] over every lane of `T`
pub fn spring_simple_duration_limit_lanes<T: Lanes>(
    dt: f32,
    value: &mut T,
    velocity: &mut T,
    intermediate: &mut T,
    target: T,
    remaining: f32,
    stiffness: f32,
) {
    let mut x = value.to_lanes();
    let mut v = velocity.to_lanes();
    let mut xi = intermediate.to_lanes();
    let g = target.to_lanes();
    for i in 0..T::LANES {
        spring_simple_duration_limit(
            dt,
            &mut x[i],
            &mut v[i],
            &mut xi[i],
            g[i],
            remaining,
            stiffness,
        );
    }
    *value = T::from_lanes(x);
    *velocity = T::from_lanes(v);
    *intermediate = T::from_lanes(xi);
}

/// [`spring_simple_double_smoothing`] over every lane of `T`
pub fn spring_simple_double_smoothing_lanes<T: Lanes>(
    dt: f32,
    value: &mut T,
    velocity: &mut T,
    intermediate: &mut T,
    intermediate_velocity: &mut T,
    target: T,
    stiffness: f32,
) {
    let mut x = value.to_lanes();
    let mut v = velocity.to_lanes();
    let mut xi = intermediate.to_lanes();
    let mut vi = intermediate_velocity.to_lanes();
    let g = target.to_lanes();
    for i in 0..T::LANES {
        spring_simple_double_smoothing(
            dt,
            &mut x[i],
            &mut v[i],
            &mut xi[i],
            &mut vi[i],
            g[i],
            stiffness,
        );
    }
    *value = T::from_lanes(x);
    *velocity = T::from_lanes(v);
    *intermediate = T::from_lanes(xi);
    *intermediate_velocity = T::from_lanes(vi);
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_core::Vec3;

    const RATIOS: [f32; 5] = [0.1, 0.5, 1.0, 1.0 - 1e-4, 2.5];
    const RATIOS_NEAR_CRITICAL: [f32; 2] = [1.0 + 1e-4, 1.0 + 2e-3];
    const STIFFNESSES: [f32; 5] = [1e-4, 0.5, 10.0, 170.0, 2_000.0];
    const STEPS: [f32; 6] = [0.0, 1e-6, 1.0 / 240.0, 1.0 / 60.0, 0.25, 1.0];

    fn assert_finite(label: &str, value: f32, velocity: f32) {
        assert!(
            value.is_finite() && velocity.is_finite(),
            "{label}: value={value} velocity={velocity}"
        );
    }

    #[test]
    fn test_general_dampers_stay_finite() {
        for ratio in RATIOS.iter().chain(RATIOS_NEAR_CRITICAL.iter()) {
            for stiffness in STIFFNESSES {
                for dt in STEPS {
                    let (mut x, mut v) = (-35.0, 12.0);
                    spring_elastic(dt, &mut x, &mut v, 100.0, 0.0, *ratio, stiffness);
                    assert_finite("elastic", x, v);

                    let (mut x, mut v) = (-35.0, 12.0);
                    spring_precise(dt, &mut x, &mut v, 100.0, 0.0, *ratio, stiffness);
                    assert_finite("precise", x, v);
                }
            }
        }
    }

    #[test]
    fn test_simple_dampers_stay_finite() {
        for stiffness in STIFFNESSES {
            for dt in STEPS {
                let (mut x, mut v) = (-35.0, 12.0);
                spring_simple(dt, &mut x, &mut v, 100.0, 3.0, stiffness);
                assert_finite("simple", x, v);

                let (mut x, mut v, mut xi) = (-35.0, 12.0, -35.0);
                spring_simple_velocity_smoothing(dt, &mut x, &mut v, &mut xi, 100.0, 50.0, stiffness);
                assert_finite("velocity smoothing", x, v);
                assert!(xi.is_finite());

                let (mut x, mut v, mut xi) = (-35.0, 12.0, -35.0);
                spring_simple_duration_limit(dt, &mut x, &mut v, &mut xi, 100.0, 0.5, stiffness);
                assert_finite("duration limit", x, v);

                let (mut x, mut v, mut xi, mut vi) = (-35.0, 12.0, -35.0, 0.0);
                spring_simple_double_smoothing(dt, &mut x, &mut v, &mut xi, &mut vi, 100.0, stiffness);
                assert_finite("double smoothing", x, v);
            }
        }
    }

    #[test]
    fn test_zero_dt_is_identity() {
        for ratio in RATIOS {
            let (mut x, mut v) = (3.0, -2.0);
            spring_precise(0.0, &mut x, &mut v, 10.0, 0.0, ratio, 50.0);
            assert!((x - 3.0).abs() < 1e-5);
            assert!((v + 2.0).abs() < 1e-5);

            let (mut x, mut v) = (3.0, -2.0);
            spring_elastic(0.0, &mut x, &mut v, 10.0, 0.0, ratio, 50.0);
            assert!((x - 3.0).abs() < 1e-4);
            assert!((v + 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_all_regimes_converge() {
        let dt = 1.0 / 60.0;
        for ratio in RATIOS.iter().chain(RATIOS_NEAR_CRITICAL.iter()) {
            let (mut xe, mut ve) = (0.0, 0.0);
            let (mut xp, mut vp) = (0.0, 0.0);
            for _ in 0..20_000 {
                spring_elastic(dt, &mut xe, &mut ve, 100.0, 0.0, *ratio, 100.0);
                spring_precise(dt, &mut xp, &mut vp, 100.0, 0.0, *ratio, 100.0);
            }
            assert!(approximately(xe, 100.0), "elastic ratio={ratio} x={xe}");
            assert!(approximately(ve, 0.0), "elastic ratio={ratio} v={ve}");
            assert!(approximately(xp, 100.0), "precise ratio={ratio} x={xp}");
            assert!(approximately(vp, 0.0), "precise ratio={ratio} v={vp}");
        }
    }

    #[test]
    fn test_simple_variants_converge() {
        let dt = 1.0 / 60.0;
        let (mut x, mut v) = (0.0, 0.0);
        let (mut xs, mut vs, mut xis) = (0.0, 0.0, 0.0);
        let (mut xd, mut vd, mut xid, mut vid) = (0.0, 0.0, 0.0, 0.0);
        let (mut xl, mut vl, mut xil) = (0.0, 0.0, 0.0);
        let mut remaining = 2.0;

        for _ in 0..3_000 {
            spring_simple(dt, &mut x, &mut v, 100.0, 0.0, 40.0);
            spring_simple_velocity_smoothing(dt, &mut xs, &mut vs, &mut xis, 100.0, 80.0, 40.0);
            spring_simple_double_smoothing(dt, &mut xd, &mut vd, &mut xid, &mut vid, 100.0, 40.0);
            spring_simple_duration_limit(dt, &mut xl, &mut vl, &mut xil, 100.0, remaining, 40.0);
            remaining -= dt;
        }

        assert!(approximately(x, 100.0), "simple x={x}");
        assert!(approximately(xs, 100.0), "velocity smoothing x={xs}");
        assert!(approximately(xd, 100.0), "double smoothing x={xd}");
        assert_eq!(xl, 100.0);
        assert_eq!(vl, 0.0);
    }

    #[test]
    fn test_elastic_and_precise_agree() {
        for ratio in [0.3, 1.0, 1.8] {
            let (mut xe, mut ve) = (0.0, 0.0);
            let (mut xp, mut vp) = (0.0, 0.0);
            for _ in 0..30 {
                spring_elastic(1.0 / 60.0, &mut xe, &mut ve, 1.0, 0.0, ratio, 150.0);
                spring_precise(1.0 / 60.0, &mut xp, &mut vp, 1.0, 0.0, ratio, 150.0);
            }
            assert!((xe - xp).abs() < 0.02, "ratio={ratio} elastic={xe} precise={xp}");
        }
    }

    #[test]
    fn test_underdamped_overshoots_and_overdamped_does_not() {
        let (mut x, mut v) = (0.0, 0.0);
        let mut peak: f32 = 0.0;
        for _ in 0..240 {
            spring_precise(1.0 / 60.0, &mut x, &mut v, 1.0, 0.0, 0.2, 200.0);
            peak = peak.max(x);
        }
        assert!(peak > 1.2);

        let (mut x, mut v) = (0.0, 0.0);
        for _ in 0..240 {
            spring_precise(1.0 / 60.0, &mut x, &mut v, 1.0, 0.0, 2.5, 200.0);
            assert!(x <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_velocity_smoothing_limits_goal_speed() {
        let dt = 1.0 / 60.0;
        let (mut x, mut v, mut xi) = (0.0, 0.0, 0.0);
        spring_simple_velocity_smoothing(dt, &mut x, &mut v, &mut xi, 1_000.0, 60.0, 100.0);
        assert!((xi - 1.0).abs() < 1e-4);
        assert!(x < 10.0);
    }

    #[test]
    fn test_precise_large_step_does_not_overflow() {
        let (mut x, mut v) = (0.0, 0.0);
        spring_precise(1.0, &mut x, &mut v, 100.0, 0.0, 2.5, 1.0e6);
        assert_finite("precise stiff overdamped", x, v);
        assert!((x - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_goal_velocity_offsets_rest_position() {
        let rest = rest_position(100.0, 5.0, 1.0, 100.0);
        assert!((rest - 101.0).abs() < 1e-3);
        assert_eq!(rest_position(100.0, 0.0, 0.3, 100.0), 100.0);

        let (mut x, mut v) = (0.0, 0.0);
        for _ in 0..600 {
            spring_simple(1.0 / 60.0, &mut x, &mut v, 100.0, 5.0, 100.0);
        }
        assert!(approximately(x, rest), "simple rests at {x}, expected {rest}");
        assert!(approximately(v, 0.0));

        for ratio in [0.5, 2.0] {
            let rest = rest_position(100.0, 5.0, ratio, 100.0);
            let (mut x, mut v) = (0.0, 0.0);
            let (mut px, mut pv) = (0.0, 0.0);
            for _ in 0..3600 {
                spring_elastic(1.0 / 60.0, &mut x, &mut v, 100.0, 5.0, ratio, 100.0);
                spring_precise(1.0 / 60.0, &mut px, &mut pv, 100.0, 5.0, ratio, 100.0);
            }
            assert!(approximately(x, rest), "elastic {ratio}: {x} vs {rest}");
            assert!(approximately(px, rest), "precise {ratio}: {px} vs {rest}");
        }
    }

    #[test]
    fn test_approximately() {
        for x in [0.0, -1.0, 1e-6, 3.5, 1e6, -7.25e4] {
            assert!(approximately(x, x));
            assert!(!approximately(x, x + 10.0 + x.abs()));
        }
        assert!(approximately(100.0, 100.0005));
        assert!(!approximately(0.0, 0.01));
        assert!(!approximately(f32::NAN, f32::NAN));
    }

    #[test]
    fn test_lane_variant_matches_scalar() {
        let mut value = Vec3::new(0.0, 10.0, -5.0);
        let mut velocity = Vec3::ZERO;
        let target = Vec3::new(1.0, 20.0, 5.0);
        spring_elastic_lanes(0.1, &mut value, &mut velocity, target, Vec3::ZERO, 0.5, 80.0);

        let (mut y, mut vy) = (10.0, 0.0);
        spring_elastic(0.1, &mut y, &mut vy, 20.0, 0.0, 0.5, 80.0);
        assert_eq!(value.y, y);
        assert_eq!(velocity.y, vy);
    }
}
