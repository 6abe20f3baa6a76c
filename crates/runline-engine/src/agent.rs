//! The runner that drives streaming.

use glam::Vec3;
use runline_common::Point3;
use runline_world::{AgentFeed, AgentSample};

/// An agent moving at constant speed along a fixed heading.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerAgent {
    /// World position
    position: Point3,
    /// Unit heading
    forward: Vec3,
    /// Units per second
    speed: f32,
    /// Total distance covered
    travelled: f32,
}

impl RunnerAgent {
    /// Creates an agent. A zero `forward` falls back to +Z.
    #[must_use]
    pub fn new(position: Point3, forward: Vec3, speed: f32) -> Self {
        Self {
            position,
            forward: forward.try_normalize().unwrap_or(Vec3::Z),
            speed: speed.max(0.0),
            travelled: 0.0,
        }
    }

    /// Moves the agent forward by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let step = self.speed * dt.max(0.0);
        self.position += self.forward * step;
        self.travelled += step;
    }

    /// Returns the current position.
    #[must_use]
    pub const fn position(&self) -> Point3 {
        self.position
    }

    /// Returns the unit heading.
    #[must_use]
    pub const fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Returns the speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Returns the distance covered since creation.
    #[must_use]
    pub const fn travelled(&self) -> f32 {
        self.travelled
    }
}

impl AgentFeed for RunnerAgent {
    fn sample(&self) -> AgentSample {
        AgentSample::new(self.position, self.forward)
    }
}
