//! Mode parameter headers and the Power Condition mode page.

use super::{CommandLength, DecodeError, be_u16, be_u32, ensure_len, put_be_u16, put_be_u32};
use crate::timer::{PowerCondition, TimerMask};

pub const POWER_CONDITION_PAGE: u8 = 0x1A;
pub const POWER_CONDITION_SUBPAGE: u8 = 0x00;
/// PAGE LENGTH field value; the page is two bytes longer.
pub const POWER_CONDITION_PAGE_LEN: u8 = 0x26;

/// Timer field offsets inside the page.
///
/// The wire order is Idle_A, Standby_Z, Idle_B, Idle_C, Standby_Y. It does not follow
/// [`PowerCondition`] ordering and must stay exactly like this.
const TIMER_FIELDS: [(PowerCondition, usize); PowerCondition::COUNT] = [
    (PowerCondition::IdleA, 4),
    (PowerCondition::StandbyZ, 8),
    (PowerCondition::IdleB, 12),
    (PowerCondition::IdleC, 16),
    (PowerCondition::StandbyY, 20),
];

/// Timer enable bits: (condition, byte, bit mask).
const ENABLE_BITS: [(PowerCondition, usize, u8); PowerCondition::COUNT] = [
    (PowerCondition::StandbyY, 2, 0x01),
    (PowerCondition::StandbyZ, 3, 0x01),
    (PowerCondition::IdleA, 3, 0x02),
    (PowerCondition::IdleB, 3, 0x04),
    (PowerCondition::IdleC, 3, 0x08),
];

/// Room reserved for block descriptors a device may return despite DBD. One long LBA
/// descriptor, or two short ones.
pub const MAX_BLOCK_DESCRIPTORS_LEN: usize = 16;

const PS: u8 = 0x80;
const SPF: u8 = 0x40;

/// Mode parameter header, either generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ModeHeader {
    pub mode_data_length: u16,
    pub medium_type: u8,
    /// Device-specific parameter. Bit 7 is WP, bit 4 DPOFUA for direct-access devices.
    pub device_specific: u8,
    /// Only present in the 10 byte header.
    pub long_lba: bool,
    pub block_descriptor_length: u16,
}

impl ModeHeader {
    pub const fn len(length: CommandLength) -> usize {
        match length {
            CommandLength::C6 => 4,
            CommandLength::C10 => 8,
        }
    }

    pub fn decode(length: CommandLength, buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("mode parameter header", buf, Self::len(length))?;
        Ok(match length {
            CommandLength::C6 => Self {
                mode_data_length: u16::from(buf[0]),
                medium_type: buf[1],
                device_specific: buf[2],
                long_lba: false,
                block_descriptor_length: u16::from(buf[3]),
            },
            CommandLength::C10 => Self {
                mode_data_length: be_u16(buf, 0),
                medium_type: buf[2],
                device_specific: buf[3],
                long_lba: buf[4] & 0x01 != 0,
                block_descriptor_length: be_u16(buf, 6),
            },
        })
    }

    /// Writes `self` into the front of `buf`, which must hold at least [`ModeHeader::len`] bytes.
    pub fn encode(&self, length: CommandLength, buf: &mut [u8]) {
        match length {
            CommandLength::C6 => {
                buf[0] = self.mode_data_length.min(0xFF) as u8;
                buf[1] = self.medium_type;
                buf[2] = self.device_specific;
                buf[3] = self.block_descriptor_length.min(0xFF) as u8;
            }
            CommandLength::C10 => {
                put_be_u16(buf, 0, self.mode_data_length);
                buf[2] = self.medium_type;
                buf[3] = self.device_specific;
                buf[4] = u8::from(self.long_lba);
                buf[5] = 0;
                put_be_u16(buf, 6, self.block_descriptor_length);
            }
        }
    }
}

/// Power Condition mode page (0x1A).
///
/// `timers` is indexed by [`PowerCondition`] and holds raw values in 100 ms units, whatever the
/// enable bits say.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PowerConditionPage {
    pub parameters_saveable: bool,
    pub subpage_format: bool,
    pub pm_bg_precedence: u8,
    pub enabled: TimerMask,
    pub timers: [u32; PowerCondition::COUNT],
    pub ccf_idle: u8,
    pub ccf_standby: u8,
    pub ccf_stopped: u8,
}

impl PowerConditionPage {
    /// Page size including page code and length bytes.
    pub const LEN: usize = POWER_CONDITION_PAGE_LEN as usize + 2;

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        const WHAT: &str = "power condition mode page";

        ensure_len(WHAT, buf, 2)?;
        let page_code = buf[0] & 0x3F;
        if page_code != POWER_CONDITION_PAGE {
            return Err(DecodeError::UnexpectedPage {
                what: WHAT,
                expected: POWER_CONDITION_PAGE,
                got: page_code,
            });
        }
        if buf[1] < POWER_CONDITION_PAGE_LEN {
            return Err(DecodeError::ShortPage {
                what: WHAT,
                min: usize::from(POWER_CONDITION_PAGE_LEN),
                got: usize::from(buf[1]),
            });
        }
        ensure_len(WHAT, buf, Self::LEN)?;

        let mut enabled = TimerMask::EMPTY;
        for (cond, byte, bit) in ENABLE_BITS {
            if buf[byte] & bit != 0 {
                enabled.insert(cond);
            }
        }

        let mut timers = [0; PowerCondition::COUNT];
        for (cond, off) in TIMER_FIELDS {
            timers[cond.index()] = be_u32(buf, off);
        }

        Ok(Self {
            parameters_saveable: buf[0] & PS != 0,
            subpage_format: buf[0] & SPF != 0,
            pm_bg_precedence: buf[2] >> 6,
            enabled,
            timers,
            ccf_idle: buf[39] >> 6,
            ccf_standby: (buf[39] >> 4) & 0b11,
            ccf_stopped: (buf[39] >> 2) & 0b11,
        })
    }

    /// Writes the page into the front of `buf`, which must hold at least [`Self::LEN`] bytes.
    pub fn encode(&self, buf: &mut [u8]) {
        buf[..Self::LEN].fill(0);
        buf[0] = POWER_CONDITION_PAGE
            | if self.parameters_saveable { PS } else { 0 }
            | if self.subpage_format { SPF } else { 0 };
        buf[1] = POWER_CONDITION_PAGE_LEN;
        buf[2] = (self.pm_bg_precedence & 0b11) << 6;
        for (cond, byte, bit) in ENABLE_BITS {
            if self.enabled.contains(cond) {
                buf[byte] |= bit;
            }
        }
        for (cond, off) in TIMER_FIELDS {
            put_be_u32(buf, off, self.timers[cond.index()]);
        }
        buf[39] = ((self.ccf_idle & 0b11) << 6)
            | ((self.ccf_standby & 0b11) << 4)
            | ((self.ccf_stopped & 0b11) << 2);
    }

    /// Timer values with disabled conditions read as zero.
    pub fn enabled_timers(&self) -> [u32; PowerCondition::COUNT] {
        let mut out = [0; PowerCondition::COUNT];
        for cond in self.enabled.iter() {
            out[cond.index()] = self.timers[cond.index()];
        }
        out
    }
}

/// Mode parameter list carrying exactly one Power Condition page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PowerConditionData {
    pub header: ModeHeader,
    pub page: PowerConditionPage,
}

impl PowerConditionData {
    /// Bytes needed for header plus page, without block descriptors.
    pub const fn len(length: CommandLength) -> usize {
        ModeHeader::len(length) + PowerConditionPage::LEN
    }

    /// Allocation length for MODE SENSE: header, block descriptors and page.
    pub const fn sense_len(length: CommandLength) -> usize {
        Self::len(length) + MAX_BLOCK_DESCRIPTORS_LEN
    }

    /// Build MODE SENSE response data with a consistent MODE DATA LENGTH.
    pub fn sense_response(length: CommandLength, page: PowerConditionPage) -> Self {
        let len_field_size = match length {
            CommandLength::C6 => 1,
            CommandLength::C10 => 2,
        };
        Self {
            header: ModeHeader {
                mode_data_length: (Self::len(length) - len_field_size) as u16,
                ..Default::default()
            },
            page,
        }
    }

    /// Block descriptors, if the device sent any despite DBD, are skipped.
    pub fn decode(length: CommandLength, buf: &[u8]) -> Result<Self, DecodeError> {
        let header = ModeHeader::decode(length, buf)?;
        let offset = ModeHeader::len(length) + usize::from(header.block_descriptor_length);
        ensure_len("mode parameter list", buf, offset)?;
        let page = PowerConditionPage::decode(&buf[offset..])?;
        Ok(Self { header, page })
    }

    /// Encode header and page. Block descriptors are never emitted, so the header's BLOCK
    /// DESCRIPTOR LENGTH is written as zero.
    pub fn encode(&self, length: CommandLength) -> Vec<u8> {
        let mut buf = vec![0; Self::len(length)];
        let header = ModeHeader {
            block_descriptor_length: 0,
            ..self.header
        };
        header.encode(length, &mut buf);
        self.page.encode(&mut buf[ModeHeader::len(length)..]);
        buf
    }

    /// Clear the fields that are reserved in a MODE SELECT parameter list: MODE DATA LENGTH,
    /// the device-specific parameter and the PS bit.
    pub fn prepare_for_select(&mut self) {
        self.header.mode_data_length = 0;
        self.header.device_specific = 0;
        self.header.block_descriptor_length = 0;
        self.page.parameters_saveable = false;
    }
}
