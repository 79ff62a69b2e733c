//! `[host]` section configuration.
//!
//! ```toml
//! [host]
//! fps = 60    # Frame loop rate in watch mode
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

pub const MAX_FPS: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub fps: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

impl HostConfig {
    /// Target duration of one frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.clamp(1, MAX_FPS)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(1..=MAX_FPS).contains(&self.fps) {
            diag.error(
                FieldPath::new("host.fps"),
                format!("fps must be between 1 and {MAX_FPS}, got {}", self.fps),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_frame_interval() {
        let config = test_parse_config("[host]\nfps = 50");
        assert_eq!(config.host.frame_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_fps_out_of_range() {
        let mut diag = ConfigDiagnostics::new();
        HostConfig { fps: 0 }.validate(&mut diag);
        HostConfig { fps: 5000 }.validate(&mut diag);
        assert_eq!(diag.errors().len(), 2);
    }
}
