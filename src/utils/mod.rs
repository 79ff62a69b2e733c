//! Small shared helpers.

pub mod date;
pub mod path;
pub mod plural;

pub use path::{display_relative, is_temp_file, normalize_path};
pub use plural::plural_count;
