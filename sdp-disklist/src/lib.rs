//! Physical disks, the fixed volumes on them, and the lock, dismount, offline sequence that has
//! to happen before a disk may be stopped.
//!
//! - Windows: `QueryDosDevice`, volume disk extents, `FSCTL_LOCK_VOLUME`
//! - Linux: `lsblk` JSON output, non-forced `umount2`, exclusive (`O_EXCL`) reopen

use std::io;

use thiserror::Error;

mod device;
mod names;
mod pal;

pub use device::{DiskInfo, DiskSet, Volume, VolumeInfo};
pub use names::{parse_disk_id, split_multi_string, starting_with, validate_disk_ids};
pub use pal::SystemVolume;
use sdp_scsi::Device;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No physical drive.")]
    NoDrive,
    #[error("Disk numbers exceeds physical drive count.")]
    TooManyIds,
    #[error("Duplicate disk numbers not allowed.")]
    DuplicateIds,
    #[error("No such physical drive number.")]
    NoSuchDrive(u32),
    #[error("Failed to open disk {id}: {source}")]
    OpenDisk {
        id: u32,
        #[source]
        source: io::Error,
    },
    /// A volume on the disk could not be locked.
    #[error("Disk in use.")]
    DiskInUse { disk: u32, volume: String },
    #[error(transparent)]
    Scsi(#[from] sdp_scsi::Error),
    #[error(transparent)]
    Enumeration(#[from] anyhow::Error),
}

/// Ids of every physical disk the OS exposes.
pub fn physical_drive_ids() -> Result<Vec<u32>> {
    Ok(pal::physical_drive_ids()?)
}

/// Open the requested disks, or every disk when `requested` is empty.
///
/// Ids are validated before anything is opened. If one disk fails to open, the handles opened
/// so far are closed and the whole set fails. Volume enumeration problems only cost the volume
/// list.
pub fn open(requested: &[u32]) -> Result<DiskSet<Device, SystemVolume>> {
    let available = physical_drive_ids()?;
    let ids = validate_disk_ids(requested, &available)?;

    let volumes = pal::fixed_volumes().unwrap_or_else(|e| {
        tracing::warn!("Volume enumeration failed: {e:#}");
        Vec::new()
    });
    tracing::debug!(disks = ?ids, volumes = volumes.len(), "Building disk set");

    let mut disks = Vec::with_capacity(ids.len());
    for id in ids {
        let dev = Device::open_disk(id).map_err(|source| Error::OpenDisk { id, source })?;
        disks.push((id, dev));
    }

    Ok(DiskSet::new(volumes, disks))
}
