//! Volumes and disks that record what was done to them.

#![allow(dead_code)]

use std::{cell::RefCell, io, rc::Rc};

use sdp_disklist::{Volume, VolumeInfo};
use sdp_scsi::{Cdb, DataPhase, ScsiTransport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Lock(String),
    Dismount(String),
    Offline(String),
    Stop(u32),
}

pub type Log = Rc<RefCell<Vec<Op>>>;

#[derive(Debug)]
pub struct FakeVolume {
    name: String,
    log: Log,
    pub fail_lock: bool,
    pub fail_dismount: bool,
}

impl Volume for FakeVolume {
    fn lock(&mut self) -> io::Result<()> {
        self.log.borrow_mut().push(Op::Lock(self.name.clone()));
        if self.fail_lock {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "in use"));
        }
        Ok(())
    }

    fn dismount(&mut self) -> io::Result<()> {
        self.log.borrow_mut().push(Op::Dismount(self.name.clone()));
        if self.fail_dismount {
            return Err(io::Error::other("dismount failed"));
        }
        Ok(())
    }

    fn offline(&mut self) -> io::Result<()> {
        self.log.borrow_mut().push(Op::Offline(self.name.clone()));
        Ok(())
    }
}

pub fn volume(log: &Log, name: &str, mounted: bool, disks: &[u32]) -> VolumeInfo<FakeVolume> {
    let mount_points = if mounted {
        vec![format!("/mnt/{name}")]
    } else {
        Vec::new()
    };
    VolumeInfo::new(
        FakeVolume {
            name: name.to_string(),
            log: log.clone(),
            fail_lock: false,
            fail_dismount: false,
        },
        name,
        mount_points,
        disks.iter().copied(),
    )
}

/// Accepts START STOP UNIT only.
#[derive(Debug)]
pub struct FakeUnit {
    pub id: u32,
    pub log: Log,
}

impl ScsiTransport for FakeUnit {
    fn execute(&mut self, cdb: &Cdb, _: DataPhase<'_>) -> sdp_scsi::Result<usize> {
        if cdb.opcode() == 0x1B {
            self.log.borrow_mut().push(Op::Stop(self.id));
            Ok(0)
        } else {
            Err(sdp_scsi::Error::Status {
                opcode: cdb.opcode(),
                status: 0x02,
                sense_key: Some(0x05),
            })
        }
    }
}

pub fn unit(log: &Log, id: u32) -> (u32, FakeUnit) {
    (
        id,
        FakeUnit {
            id,
            log: log.clone(),
        },
    )
}
