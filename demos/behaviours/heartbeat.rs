use crate::prelude::*;

/// Logs the frame counter once per second of host time.
#[derive(Default)]
pub struct Heartbeat {
    next: f64,
}

impl Behaviour for Heartbeat {
    fn update(&mut self) {
        let now = host::elapsed();
        if now >= self.next {
            host::log(&format!("heartbeat: frame {} at {:.1}s", host::frame(), now));
            self.next = now.floor() + 1.0;
        }
    }
}
