//! Spring physics animation
//!
//! Spring parameters, the per-record spring state, and a standalone
//! [`Spring`] stepper for callers that want damper math without the record
//! machinery. All integration is delegated to [`crate::damper`].

use crate::damper;
use kinetic_core::Lanes;

/// Which damper tier integrates a spring
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SpringSolver {
    /// Critical damping only, fastest
    Simple,
    /// Any damping ratio, fast approximate exponential
    #[default]
    Elastic,
    /// Any damping ratio, exact and numerically careful
    Precise,
    /// Simple spring chasing a goal that moves at most `max_velocity` units/s
    VelocitySmoothing { max_velocity: f32 },
    /// Simple spring guaranteed to land on the target after `duration` seconds
    DurationLimit { duration: f32 },
    /// Two chained simple springs
    DoubleSmoothing,
}

/// Configuration for a spring animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringOptions {
    pub stiffness: f32,
    /// < 1 oscillates, 1 is critical, > 1 creeps without overshoot
    pub damping_ratio: f32,
    /// Velocity of the goal, per lane
    pub target_velocity: [f32; 4],
    pub solver: SpringSolver,
}

impl SpringOptions {
    /// Create a new spring configuration
    pub fn new(stiffness: f32, damping_ratio: f32) -> Self {
        Self {
            stiffness,
            damping_ratio,
            target_velocity: [0.0; 4],
            solver: SpringSolver::default(),
        }
    }

    /// Convert from mass-spring-damper coefficients
    pub fn from_coefficients(stiffness: f32, damping: f32, mass: f32) -> Self {
        let mass = mass.max(f32::EPSILON);
        let stiffness = stiffness / mass;
        let ratio = (damping / mass) / (2.0 * stiffness.max(0.0).sqrt()).max(f32::EPSILON);
        Self::new(stiffness, ratio)
    }

    /// A gentle, slow spring (good for page transitions)
    pub fn gentle() -> Self {
        Self::from_coefficients(120.0, 14.0, 1.0)
    }

    /// A wobbly spring with overshoot (good for playful UI)
    pub fn wobbly() -> Self {
        Self::from_coefficients(180.0, 12.0, 1.0)
    }

    /// A stiff, snappy spring (good for buttons)
    pub fn stiff() -> Self {
        Self::from_coefficients(400.0, 30.0, 1.0)
    }

    /// A very stiff spring with minimal oscillation (good for quick responses)
    pub fn snappy() -> Self {
        Self::from_coefficients(600.0, 40.0, 1.0)
    }

    /// A slow spring with no overshoot (critically damped)
    pub fn molasses() -> Self {
        Self::new(100.0, 1.0)
    }

    pub fn with_solver(mut self, solver: SpringSolver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_target_velocity<T: Lanes>(mut self, velocity: T) -> Self {
        self.target_velocity = velocity.to_lanes();
        self
    }

    /// Check if the spring is underdamped (will oscillate)
    pub fn is_underdamped(&self) -> bool {
        self.damping_ratio < 1.0 - damper::CRITICAL_EPSILON
    }

    /// Check if the spring is critically damped (no oscillation, fastest settling)
    pub fn is_critically_damped(&self) -> bool {
        (self.damping_ratio - 1.0).abs() < damper::CRITICAL_EPSILON
    }

    /// Check if the spring is overdamped (slow settling, no oscillation)
    pub fn is_overdamped(&self) -> bool {
        self.damping_ratio > 1.0 + damper::CRITICAL_EPSILON
    }
}

impl Default for SpringOptions {
    fn default() -> Self {
        Self::stiff()
    }
}

/// Value state of a spring: what distinguishes it from stateless tweening
///
/// Lanes past the value's width stay zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpringState {
    pub value: [f32; 4],
    pub velocity: [f32; 4],
    pub target: [f32; 4],
    /// Auxiliary goal for the smoothing solvers
    pub intermediate: [f32; 4],
    pub intermediate_velocity: [f32; 4],
    pub lanes: usize,
}

impl SpringState {
    pub fn new<T: Lanes>(start: T, target: T) -> Self {
        let value = start.to_lanes();
        Self {
            value,
            velocity: [0.0; 4],
            target: target.to_lanes(),
            intermediate: value,
            intermediate_velocity: [0.0; 4],
            lanes: T::LANES,
        }
    }

    /// Advance every lane by `dt` seconds
    ///
    /// `elapsed` is the spring's play time before this step; only the
    /// duration-limited solver reads it.
    pub fn step(&mut self, dt: f32, elapsed: f32, options: &SpringOptions) {
        let dt = dt.max(0.0);
        for i in 0..self.lanes {
            let value = &mut self.value[i];
            let velocity = &mut self.velocity[i];
            let target = self.target[i];
            match options.solver {
                SpringSolver::Simple => damper::spring_simple(
                    dt,
                    value,
                    velocity,
                    target,
                    options.target_velocity[i],
                    options.stiffness,
                ),
                SpringSolver::Elastic => damper::spring_elastic(
                    dt,
                    value,
                    velocity,
                    target,
                    options.target_velocity[i],
                    options.damping_ratio,
                    options.stiffness,
                ),
                SpringSolver::Precise => damper::spring_precise(
                    dt,
                    value,
                    velocity,
                    target,
                    options.target_velocity[i],
                    options.damping_ratio,
                    options.stiffness,
                ),
                SpringSolver::VelocitySmoothing { max_velocity } => {
                    damper::spring_simple_velocity_smoothing(
                        dt,
                        value,
                        velocity,
                        &mut self.intermediate[i],
                        target,
                        max_velocity,
                        options.stiffness,
                    )
                }
                SpringSolver::DurationLimit { duration } => damper::spring_simple_duration_limit(
                    dt,
                    value,
                    velocity,
                    &mut self.intermediate[i],
                    target,
                    duration - elapsed,
                    options.stiffness,
                ),
                SpringSolver::DoubleSmoothing => damper::spring_simple_double_smoothing(
                    dt,
                    value,
                    velocity,
                    &mut self.intermediate[i],
                    &mut self.intermediate_velocity[i],
                    target,
                    options.stiffness,
                ),
            }
        }
    }

    /// Where the spring comes to rest, per lane
    ///
    /// A goal velocity on the closed-form solvers shifts the rest point past
    /// the target; every other solver rests on the target itself.
    pub fn rest_point(&self, options: &SpringOptions) -> [f32; 4] {
        let ratio = match options.solver {
            SpringSolver::Simple => 1.0,
            SpringSolver::Elastic | SpringSolver::Precise => options.damping_ratio,
            _ => return self.target,
        };
        let mut rest = self.target;
        for (i, lane) in rest.iter_mut().enumerate().take(self.lanes) {
            *lane = damper::rest_position(
                self.target[i],
                options.target_velocity[i],
                ratio,
                options.stiffness,
            );
        }
        rest
    }

    /// Value sits on the rest point and velocity has died out
    pub fn is_settled(&self, options: &SpringOptions) -> bool {
        let intermediate_settled = match options.solver {
            SpringSolver::DoubleSmoothing => {
                damper::approximately_lanes(&self.intermediate, &self.target, self.lanes)
                    && damper::approximately_lanes(
                        &self.intermediate_velocity,
                        &[0.0; 4],
                        self.lanes,
                    )
            }
            _ => true,
        };

        intermediate_settled
            && damper::approximately_lanes(&self.value, &self.rest_point(options), self.lanes)
            && damper::approximately_lanes(&self.velocity, &[0.0; 4], self.lanes)
    }

    /// Put the spring at rest
    pub fn snap_to_rest(&mut self, options: &SpringOptions) {
        self.value = self.rest_point(options);
        self.intermediate = self.target;
        self.velocity = [0.0; 4];
        self.intermediate_velocity = [0.0; 4];
    }
}

/// A spring-based animator
///
/// Standalone counterpart of a spring motion record: no handle, no
/// callbacks, just value + velocity chasing a target.
#[derive(Clone, Copy, Debug)]
pub struct Spring<T: Lanes> {
    options: SpringOptions,
    state: SpringState,
    elapsed: f32,
    _value: std::marker::PhantomData<T>,
}

impl<T: Lanes> Spring<T> {
    pub fn new(options: SpringOptions, initial: T) -> Self {
        Self {
            options,
            state: SpringState::new(initial, initial),
            elapsed: 0.0,
            _value: std::marker::PhantomData,
        }
    }

    pub fn value(&self) -> T {
        T::from_lanes(self.state.value)
    }

    pub fn velocity(&self) -> T {
        T::from_lanes(self.state.velocity)
    }

    pub fn target(&self) -> T {
        T::from_lanes(self.state.target)
    }

    pub fn options(&self) -> &SpringOptions {
        &self.options
    }

    /// Retarget; velocity is kept so the motion continues smoothly
    pub fn set_target(&mut self, target: T) {
        self.state.target = target.to_lanes();
        self.elapsed = 0.0;
    }

    /// Check if the spring has settled (at rest with negligible velocity)
    pub fn is_settled(&self) -> bool {
        self.state.is_settled(&self.options)
    }

    /// Step the spring simulation by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if self.is_settled() {
            self.state.snap_to_rest(&self.options);
            return;
        }
        self.state.step(dt, self.elapsed, &self.options);
        self.elapsed += dt.max(0.0);
    }
}
