//! Chases a target along a zig-zag path, slowing down once in range.
//!
//! Borrows `Vec2` from the seek behaviour: behaviours in one directory are
//! compiled together and may refer to each other.

use crate::prelude::*;
use crate::seek::Vec2;

const FAR_SPEED: f32 = 400.0;
const NEAR_SPEED: f32 = 100.0;
const RANGE: f32 = 200.0;
const ZIGZAG: f32 = 0.75;

pub struct ZigZagPursuit {
    agent: Vec2,
    target: Vec2,
}

impl Default for ZigZagPursuit {
    fn default() -> Self {
        Self {
            agent: Vec2::new(100.0, 100.0),
            target: Vec2::new(150.0, 150.0),
        }
    }
}

impl Behaviour for ZigZagPursuit {
    fn initialize(&mut self) {
        host::log("zigzag: hello from initialize");
    }

    fn update(&mut self) {
        let (dx, dy) = (self.target.x - self.agent.x, self.target.y - self.agent.y);
        let distance = Vec2::new(dx, dy).length();
        if distance * distance <= 100.0 {
            // Move the target around a slow circle so the chase never ends
            let t = host::elapsed() as f32;
            self.target = Vec2::new(250.0 + 150.0 * t.cos(), 200.0 + 150.0 * t.sin());
            return;
        }

        let speed = if distance > RANGE { FAR_SPEED } else { NEAR_SPEED };
        let wobble = (host::elapsed() as f32 * 10.0).sin() * ZIGZAG;
        let (px, py) = (-dy * wobble, dx * wobble);
        let heading = Vec2::new(dx + px, dy + py);
        let len = heading.length().max(f32::EPSILON);
        let step = speed * host::frame_time();

        self.agent = Vec2::new(
            self.agent.x + heading.x / len * step,
            self.agent.y + heading.y / len * step,
        );
    }
}
