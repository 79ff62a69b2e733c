//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module  | TOML Section | Purpose                                  |
//! |---------|--------------|------------------------------------------|
//! | `watch` | `[watch]`    | Watched directory, extension, debounce   |
//! | `build` | `[build]`    | rustc invocation, artifacts, diagnostics |
//! | `host`  | `[host]`     | Frame loop                               |

mod build;
mod host;
mod watch;

pub use build::{BuildConfig, DiagnosticsConfig};
pub use host::HostConfig;
pub use watch::WatchConfig;
