use std::io;

use sdp_scsi::ScsiTransport;

use crate::{Error, Result};

/// The three volume operations needed before a disk is spun down.
pub trait Volume {
    /// Exclusive lock. Fails when the volume is in use.
    fn lock(&mut self) -> io::Result<()>;
    fn dismount(&mut self) -> io::Result<()>;
    fn offline(&mut self) -> io::Result<()>;
}

impl<T: Volume + ?Sized> Volume for Box<T> {
    fn lock(&mut self) -> io::Result<()> {
        (**self).lock()
    }

    fn dismount(&mut self) -> io::Result<()> {
        (**self).dismount()
    }

    fn offline(&mut self) -> io::Result<()> {
        (**self).offline()
    }
}

/// A fixed volume and the physical disks backing it.
#[derive(Debug)]
pub struct VolumeInfo<V> {
    pub handle: V,
    pub name: String,
    /// Every mount point the OS reports. May be empty.
    pub mount_points: Vec<String>,
    pub locked: bool,
    /// Dismounted and taken offline after being locked.
    pub quiesced: bool,
    disks: Vec<u32>,
}

impl<V> VolumeInfo<V> {
    /// `extents` lists the disk number of every extent. Repeated disks are collapsed.
    pub fn new(
        handle: V,
        name: impl Into<String>,
        mount_points: Vec<String>,
        extents: impl IntoIterator<Item = u32>,
    ) -> Self {
        let mut disks = Vec::new();
        for id in extents {
            if !disks.contains(&id) {
                disks.push(id);
            }
        }

        Self {
            handle,
            name: name.into(),
            mount_points,
            locked: false,
            quiesced: false,
            disks,
        }
    }

    /// Disk ids in extent order.
    pub fn disks(&self) -> &[u32] {
        &self.disks
    }

    pub fn is_on(&self, disk: u32) -> bool {
        self.disks.contains(&disk)
    }

    /// Backed by more than one physical disk.
    pub fn is_spanned(&self) -> bool {
        self.disks.len() > 1
    }
}

/// One target disk. Volumes are indices into the owning [`DiskSet`].
#[derive(Debug)]
pub struct DiskInfo<D> {
    pub handle: D,
    pub id: u32,
    volumes: Vec<usize>,
}

impl<D> DiskInfo<D> {
    pub fn volume_indices(&self) -> &[usize] {
        &self.volumes
    }
}

/// Target disks of one invocation plus every fixed volume on the system.
#[derive(Debug)]
pub struct DiskSet<D, V> {
    volumes: Vec<VolumeInfo<V>>,
    disks: Vec<DiskInfo<D>>,
}

impl<D, V> DiskSet<D, V> {
    /// Disks keep the given order. Each one gets the volumes whose extents include its id.
    pub fn new(volumes: Vec<VolumeInfo<V>>, disks: impl IntoIterator<Item = (u32, D)>) -> Self {
        let disks = disks
            .into_iter()
            .map(|(id, handle)| {
                let count = volumes.iter().filter(|v| v.is_on(id)).count();
                let mut indices = Vec::with_capacity(count);
                indices.extend(
                    volumes
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| v.is_on(id))
                        .map(|(i, _)| i),
                );
                DiskInfo {
                    handle,
                    id,
                    volumes: indices,
                }
            })
            .collect();

        Self { volumes, disks }
    }

    pub fn disks(&self) -> &[DiskInfo<D>] {
        &self.disks
    }

    pub fn disks_mut(&mut self) -> &mut [DiskInfo<D>] {
        &mut self.disks
    }

    pub fn volumes(&self) -> &[VolumeInfo<V>] {
        &self.volumes
    }

    /// Volumes on the disk at `index`, in enumeration order.
    pub fn volumes_on(&self, index: usize) -> impl Iterator<Item = &VolumeInfo<V>> {
        self.disks[index]
            .volumes
            .iter()
            .map(|&i| &self.volumes[i])
    }
}

impl<D, V: Volume> DiskSet<D, V> {
    /// Quiesce every volume on the disk at `index`.
    ///
    /// All unlocked volumes are locked first. The first lock failure aborts with
    /// [`Error::DiskInUse`] before anything is dismounted; volumes locked so far stay locked.
    /// Then every volume on the disk that is not yet quiesced is dismounted (if it has mount
    /// points) and taken offline. That includes volumes left locked by an earlier aborted eject
    /// of another disk. Those two steps only log failures.
    pub fn eject(&mut self, index: usize) -> Result<()> {
        let disk = &self.disks[index];

        for &i in &disk.volumes {
            let vol = &mut self.volumes[i];
            if vol.locked {
                continue;
            }
            if let Err(e) = vol.handle.lock() {
                tracing::warn!("Failed to lock {}: {e}", vol.name);
                return Err(Error::DiskInUse {
                    disk: disk.id,
                    volume: vol.name.clone(),
                });
            }
            vol.locked = true;
        }

        let pending: Vec<usize> = disk
            .volumes
            .iter()
            .copied()
            .filter(|&i| !self.volumes[i].quiesced)
            .collect();

        for &i in &pending {
            let vol = &mut self.volumes[i];
            if vol.mount_points.is_empty() {
                continue;
            }
            if let Err(e) = vol.handle.dismount() {
                tracing::warn!("Failed to dismount {}: {e}", vol.name);
            }
        }

        for &i in &pending {
            let vol = &mut self.volumes[i];
            if let Err(e) = vol.handle.offline() {
                tracing::warn!("Failed to take {} offline: {e}", vol.name);
            }
            vol.quiesced = true;
        }

        tracing::info!(disk = disk.id, volumes = pending.len(), "Volumes ejected");
        Ok(())
    }
}

impl<D: ScsiTransport, V: Volume> DiskSet<D, V> {
    /// [`DiskSet::eject`] then STOP UNIT. The unit is not touched if any lock fails.
    pub fn stop(&mut self, index: usize) -> Result<()> {
        self.eject(index)?;
        sdp_scsi::unit::stop(&mut self.disks[index].handle)?;
        Ok(())
    }
}
