use std::{
    ffi::CString,
    fs::{File, OpenOptions},
    io,
    os::{fd::AsRawFd, unix::fs::OpenOptionsExt},
    process::Command,
};

use anyhow::Context;
use serde::Deserialize;

use crate::{Volume, VolumeInfo};

const BLKFLSBUF: libc::c_ulong = 0x1261;

#[derive(Deserialize, Debug)]
struct Devices {
    blockdevices: Vec<BlockDevice>,
}

#[derive(Deserialize, Debug)]
struct BlockDevice {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    rm: bool,
    #[serde(default)]
    hotplug: bool,
    /// lsblk before 2.37
    mountpoint: Option<String>,
    #[serde(default)]
    mountpoints: Vec<Option<String>>,
    #[serde(default)]
    children: Vec<BlockDevice>,
}

impl BlockDevice {
    fn is_disk(&self) -> bool {
        self.kind == "disk"
    }

    fn is_fixed(&self) -> bool {
        !(self.rm || self.hotplug)
    }

    fn mount_points(&self) -> Vec<String> {
        let mut out: Vec<String> = self.mountpoints.iter().flatten().cloned().collect();
        if out.is_empty() {
            out.extend(self.mountpoint.iter().cloned());
        }
        out
    }

    /// Leaf devices below `self`. A disk without children is not a volume unless mounted.
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a BlockDevice>) {
        if self.children.is_empty() {
            if !self.is_disk() || !self.mount_points().is_empty() {
                out.push(self);
            }
            return;
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }
}

fn lsblk() -> anyhow::Result<Vec<BlockDevice>> {
    let output = Command::new("lsblk")
        .args(["--bytes", "--all", "--json", "--paths", "--output-all"])
        .output()
        .context("Failed to run lsblk")?;

    if !output.status.success() {
        anyhow::bail!(
            "lsblk failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let res: Devices =
        serde_json::from_slice(&output.stdout).context("Unexpected lsblk output")?;
    Ok(res.blockdevices)
}

/// `/dev/sdb` is 1, `/dev/sdaa` is 26.
fn disk_id(path: &str) -> Option<u32> {
    let letters = path.strip_prefix("/dev/sd")?;
    if letters.is_empty() {
        return None;
    }
    // Bijective base 26, the inverse of `sdp_scsi::disk_path`.
    let n = letters.bytes().try_fold(0u32, |n, b| {
        if !b.is_ascii_lowercase() {
            return None;
        }
        n.checked_mul(26)?.checked_add(u32::from(b - b'a') + 1)
    })?;
    Some(n - 1)
}

pub fn physical_drive_ids() -> anyhow::Result<Vec<u32>> {
    Ok(lsblk()?
        .iter()
        .filter(|d| d.is_disk())
        .filter_map(|d| disk_id(&d.name))
        .collect())
}

/// Leaves below non-removable disks with the ids of every disk they were found under. A device
/// that shows up under several disks (RAID, LVM spanning partitions) is listed once.
fn fixed_leaves(devices: &[BlockDevice]) -> Vec<(&BlockDevice, Vec<u32>)> {
    let mut leaves: Vec<(&BlockDevice, Vec<u32>)> = Vec::new();
    for disk in devices.iter().filter(|d| d.is_disk() && d.is_fixed()) {
        let Some(id) = disk_id(&disk.name) else {
            continue;
        };
        let mut found = Vec::new();
        disk.collect_leaves(&mut found);
        for leaf in found {
            match leaves.iter_mut().find(|(l, _)| l.name == leaf.name) {
                Some((_, disks)) => disks.push(id),
                None => leaves.push((leaf, vec![id])),
            }
        }
    }
    leaves
}

/// Volumes below non-removable disks. Volumes that cannot be opened are skipped.
pub fn fixed_volumes() -> anyhow::Result<Vec<VolumeInfo<SystemVolume>>> {
    let devices = lsblk()?;
    let leaves = fixed_leaves(&devices);

    let mut volumes = Vec::with_capacity(leaves.len());
    for (leaf, disks) in leaves {
        let mount_points = leaf.mount_points();
        match SystemVolume::open(&leaf.name, mount_points.clone()) {
            Ok(handle) => volumes.push(VolumeInfo::new(handle, &leaf.name, mount_points, disks)),
            Err(e) => tracing::warn!("Skipping volume {}: {e}", leaf.name),
        }
    }
    Ok(volumes)
}

#[derive(Debug)]
pub struct SystemVolume {
    path: String,
    file: File,
    mount_points: Vec<String>,
}

impl SystemVolume {
    fn open(path: &str, mount_points: Vec<String>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(path)?;
        Ok(Self {
            path: path.to_string(),
            file,
            mount_points,
        })
    }

    /// Non-forced unmount of every mount point. A busy filesystem fails with `EBUSY`.
    fn release_mount_points(&self) -> io::Result<()> {
        for mp in &self.mount_points {
            let target = CString::new(mp.as_str())?;
            // SAFETY: `target` is a valid NUL terminated string for the duration of the call.
            if unsafe { libc::umount2(target.as_ptr(), 0) } < 0 {
                let err = io::Error::last_os_error();
                // No longer a mount point.
                if err.raw_os_error() == Some(libc::EINVAL) {
                    continue;
                }
                return Err(err);
            }
            tracing::debug!("Unmounted {mp}");
        }
        Ok(())
    }
}

impl Volume for SystemVolume {
    /// Releases the mount points, then reopens the node with `O_EXCL`. The kernel refuses
    /// that with `EBUSY` while a filesystem or another holder still claims the device.
    fn lock(&mut self) -> io::Result<()> {
        self.release_mount_points()?;
        self.file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_CLOEXEC | libc::O_EXCL)
            .open(&self.path)?;
        Ok(())
    }

    /// Mount points are already gone once [`Volume::lock`] succeeded.
    fn dismount(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn offline(&mut self) -> io::Result<()> {
        // SAFETY: BLKFLSBUF takes no argument besides the descriptor.
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), BLKFLSBUF as _, 0) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
