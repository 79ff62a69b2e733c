//! Actor Message Definitions
//!
//! ```text
//! FsActor --Rebuild--> BuildActor <--Rebuild-- console
//! ```

use std::fmt;
use std::path::PathBuf;

/// Why a rebuild was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildReason {
    /// Initial build when watching starts
    Startup,
    /// Debounced source changes (sorted, possibly empty)
    FileChange(Vec<PathBuf>),
    /// The console `r` command
    Manual,
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => f.write_str("startup"),
            Self::FileChange(paths) => match paths.as_slice() {
                [] => f.write_str("file change"),
                [one] => write!(
                    f,
                    "{}",
                    one.file_name().unwrap_or(one.as_os_str()).to_string_lossy()
                ),
                many => write!(f, "{} changed files", many.len()),
            },
            Self::Manual => f.write_str("manual request"),
        }
    }
}

/// Messages to Build Actor
#[derive(Debug)]
pub enum BuildMsg {
    Rebuild { reason: RebuildReason },
    /// Finish in-flight cycles, then stop
    Shutdown,
}
