//! `sdp`: list disks, read and write their power condition timers, and spin them down.
//!
//! The binary is a thin wrapper around [`commands`]. [`Opt`] is public so that man pages and
//! shell completions can be generated from it.

mod cli;
pub mod commands;
pub mod elevation;
pub mod render;

pub use cli::{Commands, Opt};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: u8 = 0;
    /// At least one disk failed.
    pub const FAILED: u8 = 1;
    /// Command line rejected. Matches clap's usage error code.
    pub const USAGE: u8 = 2;
    pub const NOT_ELEVATED: u8 = 3;
    /// Disk set could not be built.
    pub const DISK_SET: u8 = 4;
}
