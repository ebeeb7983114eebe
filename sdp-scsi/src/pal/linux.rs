use std::{
    ffi::{c_int, c_uchar, c_uint, c_ushort, c_void},
    fs::{File, OpenOptions},
    io,
    os::{fd::AsRawFd, unix::fs::OpenOptionsExt},
    path::{Path, PathBuf},
};

use crate::{
    COMMAND_TIMEOUT, Cdb, DataPhase, Error, Result,
    transport::{SENSE_LEN, STATUS_GOOD, sense_key},
};

const SG_IO: u32 = 0x2285;

const SG_DXFER_NONE: c_int = -1;
const SG_DXFER_TO_DEV: c_int = -2;
const SG_DXFER_FROM_DEV: c_int = -3;

const SG_INFO_OK_MASK: c_uint = 0x1;

/// `struct sg_io_hdr` from `<scsi/sg.h>`.
#[repr(C)]
struct SgIoHdr {
    interface_id: c_int,
    dxfer_direction: c_int,
    cmd_len: c_uchar,
    mx_sb_len: c_uchar,
    iovec_count: c_ushort,
    dxfer_len: c_uint,
    dxferp: *mut c_void,
    cmdp: *const c_uchar,
    sbp: *mut c_uchar,
    timeout: c_uint,
    flags: c_uint,
    pack_id: c_int,
    usr_ptr: *mut c_void,
    status: c_uchar,
    masked_status: c_uchar,
    msg_status: c_uchar,
    sb_len_wr: c_uchar,
    host_status: c_ushort,
    driver_status: c_ushort,
    resid: c_int,
    duration: c_uint,
    info: c_uint,
}

pub(crate) fn disk_path(id: u32) -> PathBuf {
    // Bijective base 26: a..z, aa..zz, aaa..
    let mut n = u64::from(id) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();

    let mut path = String::from("/dev/sd");
    path.extend(letters.into_iter().map(char::from));
    PathBuf::from(path)
}

pub(crate) fn open(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

pub(crate) fn execute(file: &File, cdb: &Cdb, data: DataPhase<'_>) -> Result<usize> {
    let mut sense = [0u8; SENSE_LEN];
    let (direction, ptr, len) = match data {
        DataPhase::None => (SG_DXFER_NONE, std::ptr::null_mut(), 0),
        DataPhase::In(buf) => (SG_DXFER_FROM_DEV, buf.as_mut_ptr().cast(), buf.len()),
        DataPhase::Out(buf) => (SG_DXFER_TO_DEV, buf.as_ptr().cast_mut().cast(), buf.len()),
    };

    let mut hdr = SgIoHdr {
        interface_id: c_int::from(b'S'),
        dxfer_direction: direction,
        cmd_len: cdb.len() as c_uchar,
        mx_sb_len: SENSE_LEN as c_uchar,
        iovec_count: 0,
        dxfer_len: len as c_uint,
        dxferp: ptr,
        cmdp: cdb.as_bytes().as_ptr(),
        sbp: sense.as_mut_ptr(),
        timeout: COMMAND_TIMEOUT.as_millis() as c_uint,
        flags: 0,
        pack_id: 0,
        usr_ptr: std::ptr::null_mut(),
        status: 0,
        masked_status: 0,
        msg_status: 0,
        sb_len_wr: 0,
        host_status: 0,
        driver_status: 0,
        resid: 0,
        duration: 0,
        info: 0,
    };

    // SAFETY: every pointer in `hdr` refers to a buffer that outlives the call and matches the
    // length next to it.
    let ret = unsafe { libc::ioctl(file.as_raw_fd(), SG_IO as _, &mut hdr as *mut SgIoHdr) };
    if ret < 0 {
        return Err(io::Error::last_os_error().into());
    }

    if hdr.status != STATUS_GOOD {
        let written = usize::from(hdr.sb_len_wr).min(SENSE_LEN);
        return Err(Error::Status {
            opcode: cdb.opcode(),
            status: hdr.status,
            sense_key: sense_key(&sense[..written]),
        });
    }
    if hdr.info & SG_INFO_OK_MASK != 0 {
        return Err(io::Error::other(format!(
            "SG_IO transport error (host {:#x}, driver {:#x})",
            hdr.host_status, hdr.driver_status
        ))
        .into());
    }

    Ok(len.saturating_sub(usize::try_from(hdr.resid).unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::disk_path;

    #[test]
    fn sd_names() {
        assert_eq!(disk_path(0).to_str(), Some("/dev/sda"));
        assert_eq!(disk_path(25).to_str(), Some("/dev/sdz"));
        assert_eq!(disk_path(26).to_str(), Some("/dev/sdaa"));
        assert_eq!(disk_path(701).to_str(), Some("/dev/sdzz"));
        assert_eq!(disk_path(702).to_str(), Some("/dev/sdaaa"));
    }
}
