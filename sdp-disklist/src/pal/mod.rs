#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(any(target_os = "linux", windows)))]
mod unsupported;
#[cfg(windows)]
mod windows;

#[cfg(target_os = "linux")]
pub use self::linux::{SystemVolume, fixed_volumes, physical_drive_ids};
#[cfg(not(any(target_os = "linux", windows)))]
pub use self::unsupported::{SystemVolume, fixed_volumes, physical_drive_ids};
#[cfg(windows)]
pub use self::windows::{SystemVolume, fixed_volumes, physical_drive_ids};
