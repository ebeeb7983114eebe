use crate::Result;

/// Command Descriptor Block as handed to the pass-through layer.
///
/// Only 6, 10 and 16 byte CDBs are built by this crate.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Cdb {
    bytes: [u8; 16],
    len: u8,
}

impl Cdb {
    pub(crate) const fn new6(opcode: u8) -> Self {
        Self::with_len(opcode, 6)
    }

    pub(crate) const fn new10(opcode: u8) -> Self {
        Self::with_len(opcode, 10)
    }

    pub(crate) const fn new16(opcode: u8) -> Self {
        Self::with_len(opcode, 16)
    }

    const fn with_len(opcode: u8, len: u8) -> Self {
        let mut bytes = [0; 16];
        bytes[0] = opcode;
        Self { bytes, len }
    }

    /// Build a CDB from raw bytes. Returns `None` for lengths other than 6, 10, 12 or 16.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if !matches!(raw.len(), 6 | 10 | 12 | 16) {
            return None;
        }
        let mut bytes = [0; 16];
        bytes[..raw.len()].copy_from_slice(raw);
        Some(Self {
            bytes,
            len: raw.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..usize::from(self.len)]
    }

    pub const fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl std::fmt::Debug for Cdb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cdb(")?;
        for (i, b) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// Data transfer that accompanies a CDB.
#[derive(Debug)]
pub enum DataPhase<'a> {
    None,
    /// Device to host
    In(&'a mut [u8]),
    /// Host to device
    Out(&'a [u8]),
}

impl DataPhase<'_> {
    pub fn len(&self) -> usize {
        match self {
            DataPhase::None => 0,
            DataPhase::In(buf) => buf.len(),
            DataPhase::Out(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anything that can execute a SCSI command synchronously.
///
/// Implementations block until the command completes or [`crate::COMMAND_TIMEOUT`] expires.
/// A command that completes with a status other than GOOD must be reported as
/// [`crate::Error::Status`].
pub trait ScsiTransport {
    /// Execute `cdb`, returning the number of bytes actually transferred.
    fn execute(&mut self, cdb: &Cdb, data: DataPhase<'_>) -> Result<usize>;
}

impl<T: ScsiTransport + ?Sized> ScsiTransport for &mut T {
    fn execute(&mut self, cdb: &Cdb, data: DataPhase<'_>) -> Result<usize> {
        (**self).execute(cdb, data)
    }
}

/// SCSI status GOOD.
pub(crate) const STATUS_GOOD: u8 = 0x00;

/// Sense buffer size requested from the pass-through layer.
pub(crate) const SENSE_LEN: usize = 32;

/// Sense key from fixed or descriptor format sense data.
pub(crate) fn sense_key(sense: &[u8]) -> Option<u8> {
    match sense.first()? & 0x7F {
        0x70 | 0x71 => sense.get(2).map(|b| b & 0x0F),
        0x72 | 0x73 => sense.get(1).map(|b| b & 0x0F),
        _ => None,
    }
}

/// Run a command and log what happened.
pub(crate) fn run<T: ScsiTransport + ?Sized>(
    dev: &mut T,
    cdb: &Cdb,
    data: DataPhase<'_>,
) -> Result<usize> {
    let requested = data.len();
    let res = dev.execute(cdb, data);
    match &res {
        Ok(n) => tracing::debug!(?cdb, requested, transferred = n, "SCSI command done"),
        Err(e) => tracing::debug!(?cdb, requested, "SCSI command failed: {e}"),
    }
    res
}
