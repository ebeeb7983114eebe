use std::{
    ffi::c_void,
    fs::{File, OpenOptions},
    io,
    mem::{offset_of, size_of},
    os::windows::{fs::OpenOptionsExt, io::AsRawHandle},
    path::{Path, PathBuf},
};

use windows::Win32::{
    Foundation::HANDLE,
    Storage::FileSystem::{FILE_SHARE_READ, FILE_SHARE_WRITE},
    Storage::IscsiDisc::{IOCTL_SCSI_PASS_THROUGH_DIRECT, SCSI_PASS_THROUGH_DIRECT},
    System::IO::DeviceIoControl,
};

use crate::{
    COMMAND_TIMEOUT, Cdb, DataPhase, Error, Result,
    transport::{SENSE_LEN, STATUS_GOOD, sense_key},
};

const SCSI_IOCTL_DATA_OUT: u8 = 0;
const SCSI_IOCTL_DATA_IN: u8 = 1;
const SCSI_IOCTL_DATA_UNSPECIFIED: u8 = 2;

/// Pass-through request followed by the sense buffer the driver fills.
#[repr(C)]
struct PassThroughWithSense {
    sptd: SCSI_PASS_THROUGH_DIRECT,
    filler: u32,
    sense: [u8; SENSE_LEN],
}

pub(crate) fn disk_path(id: u32) -> PathBuf {
    PathBuf::from(format!("\\\\.\\PhysicalDrive{id}"))
}

pub(crate) fn open(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .share_mode((FILE_SHARE_READ | FILE_SHARE_WRITE).0)
        .open(path)
}

pub(crate) fn execute(file: &File, cdb: &Cdb, data: DataPhase<'_>) -> Result<usize> {
    let (direction, ptr, len): (u8, *mut c_void, usize) = match data {
        DataPhase::None => (SCSI_IOCTL_DATA_UNSPECIFIED, std::ptr::null_mut(), 0),
        DataPhase::In(buf) => (SCSI_IOCTL_DATA_IN, buf.as_mut_ptr().cast(), buf.len()),
        DataPhase::Out(buf) => (SCSI_IOCTL_DATA_OUT, buf.as_ptr().cast_mut().cast(), buf.len()),
    };

    let mut req = PassThroughWithSense {
        sptd: SCSI_PASS_THROUGH_DIRECT {
            Length: size_of::<SCSI_PASS_THROUGH_DIRECT>() as u16,
            CdbLength: cdb.len() as u8,
            SenseInfoLength: SENSE_LEN as u8,
            DataIn: direction,
            DataTransferLength: len as u32,
            TimeOutValue: COMMAND_TIMEOUT.as_secs() as u32,
            DataBuffer: ptr,
            SenseInfoOffset: offset_of!(PassThroughWithSense, sense) as u32,
            ..Default::default()
        },
        filler: 0,
        sense: [0; SENSE_LEN],
    };
    req.sptd.Cdb[..cdb.len()].copy_from_slice(cdb.as_bytes());

    let size = size_of::<PassThroughWithSense>() as u32;
    let req_ptr: *mut PassThroughWithSense = &mut req;
    let mut returned = 0u32;

    // SAFETY: `req` and the data buffer it points to stay alive for the whole synchronous call.
    unsafe {
        DeviceIoControl(
            HANDLE(file.as_raw_handle()),
            IOCTL_SCSI_PASS_THROUGH_DIRECT,
            Some(req_ptr as *const c_void),
            size,
            Some(req_ptr as *mut c_void),
            size,
            Some(&mut returned),
            None,
        )?;
    }

    if req.sptd.ScsiStatus != STATUS_GOOD {
        let written = usize::from(req.sptd.SenseInfoLength).min(SENSE_LEN);
        return Err(Error::Status {
            opcode: cdb.opcode(),
            status: req.sptd.ScsiStatus,
            sense_key: sense_key(&req.sense[..written]),
        });
    }

    // The driver updates the transfer length to what actually moved.
    Ok((req.sptd.DataTransferLength as usize).min(len))
}
