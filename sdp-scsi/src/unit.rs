//! Device identity and geometry.

use crate::{
    Result, ScsiTransport,
    codec::{
        BlockDeviceCharacteristics, ReadCapacity10, ReadCapacity16, SerialNumberPage,
        StandardInquiry, StartStopUnit, cdb,
        inquiry::{VPD_BLOCK_DEVICE_CHARACTERISTICS, VPD_BUFFER_LEN, VPD_UNIT_SERIAL_NUMBER},
        normalize_text,
    },
    timer::{self, PowerTimers},
    transport::{DataPhase, run},
};

/// Longest serial number kept.
pub const MAX_SERIAL_LEN: usize = 48;

/// Rotation rate reported by non-rotating media.
pub const RPM_NON_ROTATING: u16 = 1;

/// Nominal form factor from the block device characteristics page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FormFactor {
    #[default]
    NotReported,
    Inch5_25,
    Inch3_5,
    Inch2_5,
    Inch1_8,
    Below1_8,
    Other,
}

impl From<u8> for FormFactor {
    fn from(code: u8) -> Self {
        match code & 0x0F {
            0 => Self::NotReported,
            1 => Self::Inch5_25,
            2 => Self::Inch3_5,
            3 => Self::Inch2_5,
            4 => Self::Inch1_8,
            5 => Self::Below1_8,
            _ => Self::Other,
        }
    }
}

/// Snapshot of one device. Timers are only filled by [`UnitInfo::load_timers`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct UnitInfo {
    pub block_size: u32,
    pub block_count: u64,
    pub vendor: String,
    pub product: String,
    pub revision: String,
    pub serial: String,
    pub form_factor: FormFactor,
    /// 0: not reported, [`RPM_NON_ROTATING`]: solid state, otherwise RPM.
    pub rpm: u16,
    pub timers: PowerTimers,
}

impl UnitInfo {
    /// Capacity in bytes.
    pub const fn capacity(&self) -> u64 {
        self.block_count.saturating_mul(self.block_size as u64)
    }

    /// Refresh [`UnitInfo::timers`].
    ///
    /// Previous timer state is cleared first, so it reads as empty after a failure.
    pub fn load_timers<T: ScsiTransport + ?Sized>(&mut self, dev: &mut T) -> Result<()> {
        self.timers = PowerTimers::default();
        self.timers = timer::read_timers(dev)?;
        Ok(())
    }
}

fn inquiry<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<StandardInquiry> {
    let mut buf = [0; StandardInquiry::LEN];
    let n = run(
        dev,
        &cdb::inquiry(StandardInquiry::LEN as u16),
        DataPhase::In(&mut buf),
    )?;
    Ok(StandardInquiry::decode(&buf[..n.min(buf.len())])?)
}

fn vpd_page<T: ScsiTransport + ?Sized>(dev: &mut T, page: u8) -> Result<Vec<u8>> {
    let mut buf = vec![0; VPD_BUFFER_LEN];
    let n = run(
        dev,
        &cdb::inquiry_vpd(page, VPD_BUFFER_LEN as u16),
        DataPhase::In(&mut buf),
    )?;
    buf.truncate(n);
    Ok(buf)
}

fn serial_number<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<String> {
    let raw = vpd_page(dev, VPD_UNIT_SERIAL_NUMBER)?;
    let page = SerialNumberPage::decode(&raw)?;
    let len = page.serial.len().min(MAX_SERIAL_LEN);
    Ok(normalize_text(&page.serial[..len]))
}

fn characteristics<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<BlockDeviceCharacteristics> {
    let raw = vpd_page(dev, VPD_BLOCK_DEVICE_CHARACTERISTICS)?;
    Ok(BlockDeviceCharacteristics::decode(&raw)?)
}

fn capacity10<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<ReadCapacity10> {
    let mut buf = [0; ReadCapacity10::LEN];
    let n = run(dev, &cdb::read_capacity10(), DataPhase::In(&mut buf))?;
    Ok(ReadCapacity10::decode(&buf[..n.min(buf.len())])?)
}

fn capacity16<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<ReadCapacity16> {
    let mut buf = [0; ReadCapacity16::LEN];
    let n = run(
        dev,
        &cdb::read_capacity16(ReadCapacity16::LEN as u32),
        DataPhase::In(&mut buf),
    )?;
    Ok(ReadCapacity16::decode(&buf[..n.min(buf.len())])?)
}

/// Block size and block count. READ CAPACITY (16) is used when the 10 byte variant fails or
/// overflows.
fn geometry<T: ScsiTransport + ?Sized>(dev: &mut T) -> Option<(u32, u64)> {
    match capacity10(dev) {
        Ok(cap) => match cap.block_count() {
            Some(count) => return Some((cap.block_len, count)),
            None => tracing::debug!("READ CAPACITY (10) overflowed"),
        },
        Err(e) => tracing::warn!("READ CAPACITY (10) failed, trying READ CAPACITY (16): {e}"),
    }

    match capacity16(dev) {
        Ok(cap) => cap.block_count().map(|count| (cap.block_len, count)),
        Err(e) => {
            tracing::warn!("READ CAPACITY (16) failed: {e}");
            None
        }
    }
}

/// Identify a device.
///
/// Only a failing INQUIRY is an error. Unknown capacity reads as zero and missing VPD pages as
/// empty serial, no form factor and RPM 0.
pub fn probe<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<UnitInfo> {
    let inq = inquiry(dev)?;

    let (block_size, block_count) = geometry(dev).unwrap_or_default();

    let serial = serial_number(dev).unwrap_or_else(|e| {
        tracing::warn!("Serial number page unavailable: {e}");
        String::new()
    });
    let (form_factor, rpm) = match characteristics(dev) {
        Ok(p) => (FormFactor::from(p.form_factor), p.rotation_rate),
        Err(e) => {
            tracing::warn!("Block device characteristics page unavailable: {e}");
            (FormFactor::NotReported, 0)
        }
    };

    Ok(UnitInfo {
        block_size,
        block_count,
        vendor: normalize_text(&inq.vendor),
        product: normalize_text(&inq.product),
        revision: normalize_text(&inq.revision),
        serial,
        form_factor,
        rpm,
        timers: PowerTimers::default(),
    })
}

/// Spin the device down.
pub fn stop<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<()> {
    run(dev, &StartStopUnit::STOP.cdb(), DataPhase::None)?;
    tracing::info!("Unit stopped");
    Ok(())
}

/// Spin the device up.
pub fn start<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<()> {
    run(dev, &StartStopUnit::START.cdb(), DataPhase::None)?;
    Ok(())
}
