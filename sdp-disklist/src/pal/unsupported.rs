use std::io;

use crate::{Volume, VolumeInfo};

pub fn physical_drive_ids() -> anyhow::Result<Vec<u32>> {
    anyhow::bail!("Disk enumeration is not supported on this platform")
}

pub fn fixed_volumes() -> anyhow::Result<Vec<VolumeInfo<SystemVolume>>> {
    Ok(Vec::new())
}

/// Never constructed on this platform.
#[derive(Debug)]
pub enum SystemVolume {}

impl Volume for SystemVolume {
    fn lock(&mut self) -> io::Result<()> {
        match *self {}
    }

    fn dismount(&mut self) -> io::Result<()> {
        match *self {}
    }

    fn offline(&mut self) -> io::Result<()> {
        match *self {}
    }
}
