//! Per-disk command handlers. Disks are processed in order and a failure on one disk does not
//! stop the next.

use std::io::{self, Write};

use sdp_disklist::{DiskSet, Volume};
use sdp_scsi::{ScsiTransport, TimerRequest, timer, unit};

use crate::render::{self, INDENT, VOLUME_INDENT};

/// `ID: identity`, optionally the timer row, then the volumes on the disk.
fn show_disk<D: ScsiTransport, V>(
    set: &mut DiskSet<D, V>,
    index: usize,
    with_timers: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    let disk = &mut set.disks_mut()[index];
    write!(out, "{:2}: ", disk.id)?;

    let mut info = match unit::probe(&mut disk.handle) {
        Ok(info) => info,
        Err(e) => {
            tracing::debug!(disk = disk.id, "Probe failed: {e}");
            return writeln!(out, "No Info");
        }
    };
    writeln!(out, "{}", render::identity(&info))?;

    if with_timers {
        if let Err(e) = info.load_timers(&mut disk.handle) {
            tracing::info!(disk = disk.id, "No timers: {e}");
        }
        writeln!(out, "{INDENT}{}", render::timers(&info.timers))?;
    }

    for vol in set.volumes_on(index) {
        writeln!(out, "{VOLUME_INDENT}{}", render::volume(vol))?;
    }
    Ok(())
}

pub fn list<D: ScsiTransport, V>(
    set: &mut DiskSet<D, V>,
    with_timers: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    render::write_header(out, with_timers)?;
    for i in 0..set.disks().len() {
        show_disk(set, i, with_timers, out)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Returns whether every disk was stopped.
pub fn stop<D: ScsiTransport, V: Volume>(
    set: &mut DiskSet<D, V>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<bool> {
    render::write_header(out, false)?;

    let mut all_ok = true;
    for i in 0..set.disks().len() {
        show_disk(set, i, false, out)?;
        write!(out, "{INDENT}Stopping... ")?;
        out.flush()?;

        match set.stop(i) {
            Ok(()) => writeln!(out, "Done")?,
            Err(e) => {
                all_ok = false;
                writeln!(out, "Failed")?;
                out.flush()?;
                render::write_error(err, format_args!("{INDENT}{e}"))?;
            }
        }
        writeln!(out)?;
    }
    Ok(all_ok)
}

/// Returns whether the timers were written on every disk.
pub fn write_timers<D: ScsiTransport, V>(
    set: &mut DiskSet<D, V>,
    request: &TimerRequest,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<bool> {
    render::write_header(out, false)?;

    let mut all_ok = true;
    for i in 0..set.disks().len() {
        show_disk(set, i, false, out)?;
        write!(out, "{INDENT}Writing timers... ")?;
        out.flush()?;

        let disk = &mut set.disks_mut()[i];
        match timer::set_timers(&mut disk.handle, request) {
            Ok(()) => writeln!(out, "Done. Check with \"sdp timers {}\"", disk.id)?,
            Err(e) => {
                all_ok = false;
                writeln!(out, "Failed")?;
                out.flush()?;
                render::write_error(err, format_args!("{INDENT}{e}"))?;
            }
        }
        writeln!(out)?;
    }
    Ok(all_ok)
}
