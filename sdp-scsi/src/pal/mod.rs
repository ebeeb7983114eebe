use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use crate::{Cdb, DataPhase, Result, ScsiTransport};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(any(target_os = "linux", windows)))]
mod unsupported;
#[cfg(windows)]
mod windows;

#[cfg(target_os = "linux")]
use self::linux as imp;
#[cfg(not(any(target_os = "linux", windows)))]
use self::unsupported as imp;
#[cfg(windows)]
use self::windows as imp;

/// OS path of physical disk `id`.
///
/// `\\.\PhysicalDrive<id>` on Windows, `/dev/sd<letters>` on Linux (0 is `sda`, 26 is `sdaa`).
pub fn disk_path(id: u32) -> PathBuf {
    imp::disk_path(id)
}

/// An open block device that accepts SCSI commands. The handle is closed on drop.
#[derive(Debug)]
pub struct Device {
    file: File,
    path: PathBuf,
}

impl Device {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        tracing::debug!("Opening {}", path.display());
        let file = imp::open(&path)?;
        Ok(Self { file, path })
    }

    pub fn open_disk(id: u32) -> io::Result<Self> {
        Self::open(disk_path(id))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScsiTransport for Device {
    fn execute(&mut self, cdb: &Cdb, data: DataPhase<'_>) -> Result<usize> {
        imp::execute(&self.file, cdb, data)
    }
}
