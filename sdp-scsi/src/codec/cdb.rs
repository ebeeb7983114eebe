//! CDB builders.

use super::{put_be_u16, put_be_u32};
use crate::transport::Cdb;

pub mod opcode {
    pub const INQUIRY: u8 = 0x12;
    pub const MODE_SELECT6: u8 = 0x15;
    pub const MODE_SENSE6: u8 = 0x1A;
    pub const START_STOP_UNIT: u8 = 0x1B;
    pub const READ_CAPACITY10: u8 = 0x25;
    pub const MODE_SELECT10: u8 = 0x55;
    pub const MODE_SENSE10: u8 = 0x5A;
    pub const SERVICE_ACTION_IN16: u8 = 0x9E;
}

/// SERVICE ACTION IN (16) service action selecting READ CAPACITY (16).
pub const READ_CAPACITY16_SERVICE_ACTION: u8 = 0x10;

const EVPD: u8 = 0x01;
const DBD: u8 = 0x08;
const PF: u8 = 0x10;
const SP: u8 = 0x01;

/// Which of the two MODE SENSE/SELECT generations to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandLength {
    C6,
    C10,
}

/// MODE SENSE page control field (byte 2, bits 7..6).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PageControl {
    #[default]
    Current = 0b00,
    Changeable = 0b01,
    Default = 0b10,
    Saved = 0b11,
}

impl PageControl {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Current,
            0b01 => Self::Changeable,
            0b10 => Self::Default,
            _ => Self::Saved,
        }
    }
}

/// Standard INQUIRY.
pub fn inquiry(alloc_len: u16) -> Cdb {
    let mut cdb = Cdb::new6(opcode::INQUIRY);
    put_be_u16(cdb.as_bytes_mut(), 3, alloc_len);
    cdb
}

/// INQUIRY for a vital product data page.
pub fn inquiry_vpd(page_code: u8, alloc_len: u16) -> Cdb {
    let mut cdb = inquiry(alloc_len);
    let b = cdb.as_bytes_mut();
    b[1] = EVPD;
    b[2] = page_code;
    cdb
}

pub fn read_capacity10() -> Cdb {
    Cdb::new10(opcode::READ_CAPACITY10)
}

pub fn read_capacity16(alloc_len: u32) -> Cdb {
    let mut cdb = Cdb::new16(opcode::SERVICE_ACTION_IN16);
    let b = cdb.as_bytes_mut();
    b[1] = READ_CAPACITY16_SERVICE_ACTION;
    put_be_u32(b, 10, alloc_len);
    cdb
}

/// MODE SENSE with block descriptors disabled.
pub fn mode_sense(
    length: CommandLength,
    pc: PageControl,
    page_code: u8,
    subpage_code: u8,
    alloc_len: u16,
) -> Cdb {
    let mut cdb = match length {
        CommandLength::C6 => Cdb::new6(opcode::MODE_SENSE6),
        CommandLength::C10 => Cdb::new10(opcode::MODE_SENSE10),
    };
    let b = cdb.as_bytes_mut();
    b[1] = DBD;
    b[2] = ((pc as u8) << 6) | (page_code & 0x3F);
    b[3] = subpage_code;
    match length {
        CommandLength::C6 => b[4] = alloc_len.min(0xFF) as u8,
        CommandLength::C10 => put_be_u16(b, 7, alloc_len),
    }
    cdb
}

/// MODE SELECT with the page format bit set.
pub fn mode_select(length: CommandLength, param_len: u16, save_pages: bool) -> Cdb {
    let mut cdb = match length {
        CommandLength::C6 => Cdb::new6(opcode::MODE_SELECT6),
        CommandLength::C10 => Cdb::new10(opcode::MODE_SELECT10),
    };
    let b = cdb.as_bytes_mut();
    b[1] = PF | if save_pages { SP } else { 0 };
    match length {
        CommandLength::C6 => b[4] = param_len.min(0xFF) as u8,
        CommandLength::C10 => put_be_u16(b, 7, param_len),
    }
    cdb
}

/// START STOP UNIT fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StartStopUnit {
    pub immediate: bool,
    pub power_condition_modifier: u8,
    pub power_condition: u8,
    pub no_flush: bool,
    pub load_eject: bool,
    pub start: bool,
}

impl StartStopUnit {
    /// Spin down, wait for completion, keep the medium loaded.
    pub const STOP: Self = Self {
        immediate: false,
        power_condition_modifier: 0,
        power_condition: 0,
        no_flush: false,
        load_eject: false,
        start: false,
    };

    pub const START: Self = Self {
        start: true,
        ..Self::STOP
    };

    pub fn cdb(&self) -> Cdb {
        let mut cdb = Cdb::new6(opcode::START_STOP_UNIT);
        let b = cdb.as_bytes_mut();
        b[1] = u8::from(self.immediate);
        b[3] = self.power_condition_modifier & 0x0F;
        b[4] = ((self.power_condition & 0x0F) << 4)
            | (u8::from(self.no_flush) << 2)
            | (u8::from(self.load_eject) << 1)
            | u8::from(self.start);
        cdb
    }
}
