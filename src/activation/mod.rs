//! Shell integration: generated activation scripts and the profile hook
//! that sources them.

pub mod env_file;
pub mod profile;

pub use env_file::materialize;
pub use profile::{ProfileContext, ProfileEdit, ShellProfile};
