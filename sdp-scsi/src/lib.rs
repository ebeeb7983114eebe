//! Library to query and change the power condition timers of SCSI/ATA direct-access block
//! devices. Powers the `sdp` command line tool.
//!
//! Everything goes through [`ScsiTransport`]: INQUIRY (plus the serial number and block device
//! characteristics VPD pages), READ CAPACITY (10)/(16), MODE SENSE (6)/(10), MODE SELECT
//! (6)/(10) and START STOP UNIT. The wire layouts live in [`codec`].
//!
//! # Platform Support
//!
//! - Linux (`SG_IO`)
//! - Windows (`IOCTL_SCSI_PASS_THROUGH_DIRECT`)
//!
//! # Usage
//!
//! ```no_run
//! use sdp_scsi::{Device, TimerRequest};
//!
//! let mut dev = Device::open_disk(1).unwrap();
//! let mut info = sdp_scsi::unit::probe(&mut dev).unwrap();
//! info.load_timers(&mut dev).unwrap();
//! println!("{} {} {:?}", info.vendor, info.product, info.timers.current);
//!
//! let request: TimerRequest = "Z7200".parse().unwrap();
//! sdp_scsi::timer::set_timers(&mut dev, &request).unwrap();
//! ```

use std::{io, time::Duration};

use thiserror::Error;

pub mod codec;
mod pal;
mod request;
pub mod timer;
mod transport;
pub mod unit;

pub use codec::DecodeError;
pub use pal::{Device, disk_path};
pub use request::{TimerParseError, TimerRequest};
pub use timer::{PowerCondition, PowerTimers, TimerMask};
pub use transport::{Cdb, DataPhase, ScsiTransport};
pub use unit::{FormFactor, UnitInfo};

/// Upper bound the transport waits for a single command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
/// Errors for this crate
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(#[from] io::Error),
    /// The command completed but the device did not report GOOD status.
    #[error("Command {opcode:#04x} failed with status {status:#04x} (sense key {sense_key:?})")]
    Status {
        opcode: u8,
        status: u8,
        sense_key: Option<u8>,
    },
    #[error("Malformed device data: {0}")]
    Decode(#[from] DecodeError),
    #[error("Device has no power condition timers.")]
    NoTimers,
    #[error("Timers not writable.")]
    NotWritable,

    #[cfg(windows)]
    #[error("Windows Error: {0}")]
    WindowsError(#[from] windows::core::Error),
}
