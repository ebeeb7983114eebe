use std::{
    ffi::c_void,
    fs::{File, OpenOptions},
    io,
    os::windows::{fs::OpenOptionsExt, io::AsRawHandle},
};

use anyhow::Context;
use windows::{
    Win32::{
        Foundation::{ERROR_INSUFFICIENT_BUFFER, ERROR_MORE_DATA, HANDLE},
        Storage::FileSystem::{
            FILE_SHARE_READ, FILE_SHARE_WRITE, GetDriveTypeW, GetVolumePathNamesForVolumeNameW,
            QueryDosDeviceW,
        },
        System::{
            IO::DeviceIoControl,
            Ioctl::{FSCTL_DISMOUNT_VOLUME, FSCTL_LOCK_VOLUME, IOCTL_VOLUME_GET_VOLUME_DISK_EXTENTS},
        },
    },
    core::PCWSTR,
};

use crate::{Volume, VolumeInfo, names};

const DRIVE_FIXED: u32 = 3;
const IOCTL_VOLUME_OFFLINE: u32 = 0x0056_C00C;

const PHYSICAL_DRIVE_PREFIX: &str = "PhysicalDrive";
const VOLUME_PREFIX: &str = "Volume";

/// `VOLUME_DISK_EXTENTS` header: extent count plus padding.
const EXTENTS_HEADER_LEN: usize = 8;
/// `DISK_EXTENT`: disk number, padding, starting offset, length.
const EXTENT_LEN: usize = 24;

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Every name in the DOS device namespace.
fn dos_devices() -> anyhow::Result<Vec<String>> {
    let mut buf = vec![0u16; 64 * 1024];
    loop {
        // SAFETY: `buf` is a valid writable buffer of the given length.
        let len = unsafe { QueryDosDeviceW(PCWSTR::null(), Some(&mut buf)) } as usize;
        if len != 0 {
            return Ok(names::split_multi_string(&buf[..len]));
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(ERROR_INSUFFICIENT_BUFFER.0 as i32) || buf.len() >= 16 * 1024 * 1024
        {
            return Err(err).context("QueryDosDevice failed");
        }
        buf.resize(buf.len() * 2, 0);
    }
}

pub fn physical_drive_ids() -> anyhow::Result<Vec<u32>> {
    let devices = dos_devices()?;
    Ok(names::starting_with(&devices, PHYSICAL_DRIVE_PREFIX)
        .into_iter()
        .filter_map(|n| names::parse_disk_id(&n[PHYSICAL_DRIVE_PREFIX.len()..]))
        .collect())
}

fn is_fixed(volume: &str) -> bool {
    let root = wide(&format!("\\\\?\\{volume}\\"));
    // SAFETY: `root` is NUL terminated.
    unsafe { GetDriveTypeW(PCWSTR(root.as_ptr())) == DRIVE_FIXED }
}

fn disk_extents(file: &File) -> anyhow::Result<Vec<u32>> {
    let mut buf = vec![0u8; EXTENTS_HEADER_LEN + EXTENT_LEN];
    loop {
        let mut returned = 0u32;
        // SAFETY: output buffer is valid for `buf.len()` bytes.
        let res = unsafe {
            DeviceIoControl(
                HANDLE(file.as_raw_handle()),
                IOCTL_VOLUME_GET_VOLUME_DISK_EXTENTS,
                None,
                0,
                Some(buf.as_mut_ptr() as *mut c_void),
                buf.len() as u32,
                Some(&mut returned),
                None,
            )
        };

        let count = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        match res {
            Ok(()) => {
                return Ok((0..count)
                    .map(|i| {
                        let off = EXTENTS_HEADER_LEN + i * EXTENT_LEN;
                        u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
                    })
                    .collect());
            }
            Err(e) if e.code() == ERROR_MORE_DATA.to_hresult() => {
                let needed = EXTENTS_HEADER_LEN + count * EXTENT_LEN;
                if needed <= buf.len() {
                    return Err(e).context("Volume disk extents");
                }
                buf.resize(needed, 0);
            }
            Err(e) => return Err(e).context("Volume disk extents"),
        }
    }
}

fn mount_points(volume: &str) -> Vec<String> {
    let path = wide(&format!("\\\\?\\{volume}\\"));
    let mut len = 0u32;
    // SAFETY: size query, no buffer.
    let _ = unsafe { GetVolumePathNamesForVolumeNameW(PCWSTR(path.as_ptr()), None, &mut len) };
    if len <= 1 {
        return Vec::new();
    }

    let mut buf = vec![0u16; len as usize];
    // SAFETY: `buf` holds `len` characters.
    match unsafe {
        GetVolumePathNamesForVolumeNameW(PCWSTR(path.as_ptr()), Some(&mut buf), &mut len)
    } {
        Ok(()) => names::split_multi_string(&buf),
        Err(e) => {
            tracing::debug!("No mount points for {volume}: {e}");
            Vec::new()
        }
    }
}

fn open_volume(volume: &str) -> anyhow::Result<VolumeInfo<SystemVolume>> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .share_mode((FILE_SHARE_READ | FILE_SHARE_WRITE).0)
        .open(format!("\\\\.\\{volume}"))
        .with_context(|| format!("Failed to open {volume}"))?;
    let extents = disk_extents(&file)?;

    Ok(VolumeInfo::new(
        SystemVolume { file },
        volume,
        mount_points(volume),
        extents,
    ))
}

/// Fixed volumes only. Volumes that cannot be opened or report no extents are skipped.
pub fn fixed_volumes() -> anyhow::Result<Vec<VolumeInfo<SystemVolume>>> {
    let devices = dos_devices()?;
    let mut volumes = Vec::new();

    for name in names::starting_with(&devices, VOLUME_PREFIX) {
        if !is_fixed(name) {
            continue;
        }
        match open_volume(name) {
            Ok(v) => volumes.push(v),
            Err(e) => tracing::warn!("Skipping {name}: {e:#}"),
        }
    }

    Ok(volumes)
}

#[derive(Debug)]
pub struct SystemVolume {
    file: File,
}

impl SystemVolume {
    fn control(&self, code: u32) -> io::Result<()> {
        let mut returned = 0u32;
        // SAFETY: control codes used here take no input or output buffer.
        unsafe {
            DeviceIoControl(
                HANDLE(self.file.as_raw_handle()),
                code,
                None,
                0,
                None,
                0,
                Some(&mut returned),
                None,
            )
        }
        .map_err(io::Error::from)
    }
}

impl Volume for SystemVolume {
    fn lock(&mut self) -> io::Result<()> {
        self.control(FSCTL_LOCK_VOLUME)
    }

    fn dismount(&mut self) -> io::Result<()> {
        self.control(FSCTL_DISMOUNT_VOLUME)
    }

    fn offline(&mut self) -> io::Result<()> {
        self.control(IOCTL_VOLUME_OFFLINE)
    }
}
