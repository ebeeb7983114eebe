use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use crate::{Cdb, DataPhase, Result};

pub(crate) fn disk_path(id: u32) -> PathBuf {
    PathBuf::from(format!("/dev/disk{id}"))
}

pub(crate) fn open(_: &Path) -> io::Result<File> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "SCSI pass-through is not supported on this platform",
    ))
}

pub(crate) fn execute(_: &File, _: &Cdb, _: DataPhase<'_>) -> Result<usize> {
    Err(io::Error::from(io::ErrorKind::Unsupported).into())
}
