//! Actor System for Hot Reload
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --> BuildActor --spawn_blocking--> PluginHost::rebuild
//! (watch)     (trigger)                      (gate, compile, publish)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `builder` - Runs compile cycles off the runtime threads
//! - `coordinator` - Wires up and runs actors

pub mod builder;
pub mod coordinator;
pub mod fs;
pub mod messages;

pub use builder::BuildHandle;
pub use coordinator::Coordinator;
