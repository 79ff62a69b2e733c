//! The capability contract as seen from the host.

use thiserror::Error;

/// A live behaviour instance.
///
/// Instances are built on a build thread and updated on the frame thread,
/// never concurrently.
pub trait Behaviour: Send {
    /// One-time setup, called by the registry before publication.
    fn initialize(&mut self) -> Result<(), PluginError>;

    /// Per-frame hook.
    fn update(&mut self) -> Result<(), PluginError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PluginError {
    #[error("constructor panicked")]
    ConstructPanicked,
    #[error("`{0}` panicked")]
    HookPanicked(&'static str),
    #[error("{0}")]
    Failed(String),
}
