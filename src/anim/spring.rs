use super::{DAMPING_RATIO_LOW_BOUNCY, DAMPING_RATIO_NO_BOUNCY, STIFFNESS_MEDIUM, STIFFNESS_MEDIUM_LOW};
use std::time::Duration;

// Integration step in seconds. Small enough to stay stable at STIFFNESS_HIGH.
const SUBSTEP: f32 = 1.0 / 240.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSpec {
    /// 1.0 = critically damped, < 1.0 bounces, > 1.0 creeps.
    pub damping_ratio: f32,
    pub stiffness: f32,
    /// Units per second below which the spring may settle.
    pub velocity_threshold: f32,
    /// Distance to target below which the spring may settle.
    pub position_threshold: f32,
}

impl SpringSpec {
    pub fn new(damping_ratio: f32, stiffness: f32) -> Self {
        Self {
            damping_ratio,
            stiffness,
            velocity_threshold: 0.1,
            position_threshold: 0.01,
        }
    }

    pub fn low_bouncy() -> Self {
        Self::new(DAMPING_RATIO_LOW_BOUNCY, STIFFNESS_MEDIUM_LOW)
    }
}

impl Default for SpringSpec {
    fn default() -> Self {
        Self::new(DAMPING_RATIO_NO_BOUNCY, STIFFNESS_MEDIUM)
    }
}

/// A scalar that is either at rest or being pulled towards a target.
///
/// Starting a new animation replaces the one in flight and keeps the current
/// velocity, so retargeting mid-flight stays smooth. Call [`stop`](Self::stop)
/// first for a fresh start.
#[derive(Debug, Clone)]
pub struct Animatable {
    value: f32,
    velocity: f32,
    target: f32,
    spec: SpringSpec,
    running: bool,
}

impl Animatable {
    pub fn new(initial: f32) -> Self {
        Self {
            value: initial,
            velocity: 0.0,
            target: initial,
            spec: SpringSpec::default(),
            running: false,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn animate_to(&mut self, target: f32, spec: SpringSpec) {
        self.target = target;
        self.spec = spec;
        self.running = true;
    }

    pub fn snap_to(&mut self, target: f32) {
        self.value = target;
        self.target = target;
        self.velocity = 0.0;
        self.running = false;
    }

    /// Freezes the value where it is. The target becomes the current value.
    pub fn stop(&mut self) {
        self.target = self.value;
        self.velocity = 0.0;
        self.running = false;
    }

    /// Advances by `dt`. Returns whether the animation is still running.
    pub fn step(&mut self, dt: Duration) -> bool {
        if !self.running {
            return false;
        }

        let stiffness = self.spec.stiffness;
        let damping = 2.0 * self.spec.damping_ratio * stiffness.sqrt();

        let dt = dt.as_secs_f32();
        let mut elapsed = 0.0;
        while elapsed < dt {
            let h = SUBSTEP.min(dt - elapsed);
            let displacement = self.value - self.target;
            let force = -stiffness * displacement - damping * self.velocity;
            // semi-implicit Euler
            self.velocity += force * h;
            self.value += self.velocity * h;
            elapsed += h;
        }

        let at_rest = self.velocity.abs() < self.spec.velocity_threshold;
        let near_target = (self.value - self.target).abs() < self.spec.position_threshold;
        if at_rest && near_target {
            self.snap_to(self.target);
        }
        self.running
    }
}

impl Default for Animatable {
    fn default() -> Self {
        Self::new(0.0)
    }
}
