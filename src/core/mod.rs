//! Core runtime state shared across the codebase.

mod state;

pub use state::{
    is_shutdown, register_shutdown, request_shutdown, set_show_warnings, setup_shutdown_handler,
    show_warnings, toggle_show_warnings,
};
