//! Sample behaviour: an agent that moves straight toward a target.
//!
//! Save this file while `kiln watch` runs and the new version replaces the
//! old one without restarting the host. Try changing `SPEED`.

use crate::prelude::*;

const SPEED: f32 = 120.0;
const ARRIVE_RADIUS: f32 = 10.0;

/// 2D point, shared with other behaviours as `crate::seek::Vec2`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn towards(self, target: Vec2, step: f32) -> Vec2 {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = Vec2::new(dx, dy).length();
        if dist <= step || dist == 0.0 {
            return target;
        }
        Vec2::new(self.x + dx / dist * step, self.y + dy / dist * step)
    }
}

#[derive(Default)]
pub struct Seek {
    agent: Vec2,
    target: Vec2,
}

impl Behaviour for Seek {
    fn initialize(&mut self) {
        self.agent = Vec2::new(100.0, 100.0);
        self.target = Vec2::new(400.0, 250.0);
        host::log("seek: hello from initialize");
    }

    fn update(&mut self) {
        self.agent = self.agent.towards(self.target, SPEED * host::frame_time());

        let gap = Vec2::new(self.target.x - self.agent.x, self.target.y - self.agent.y);
        if gap.length() < ARRIVE_RADIUS {
            host::log(&format!(
                "seek: reached ({:.0}, {:.0}) after {:.1}s",
                self.target.x,
                self.target.y,
                host::elapsed()
            ));
            // Hop to the mirrored corner
            self.target = Vec2::new(500.0 - self.target.x, 350.0 - self.target.y);
        }
    }
}
