//! In-memory disk that answers the commands the library issues.

#![allow(dead_code)]

use sdp_scsi::{
    Cdb, DataPhase, Error, PowerCondition, ScsiTransport, TimerMask,
    codec::{
        BlockDeviceCharacteristics, CommandLength, ModeHeader, PageControl, PowerConditionData,
        PowerConditionPage, ReadCapacity10, ReadCapacity16, SerialNumberPage, StandardInquiry,
        cdb::{READ_CAPACITY16_SERVICE_ACTION, opcode},
        inquiry::{VPD_BLOCK_DEVICE_CHARACTERISTICS, VPD_UNIT_SERIAL_NUMBER},
        mode::POWER_CONDITION_PAGE,
    },
};

const CHECK_CONDITION: u8 = 0x02;
const ILLEGAL_REQUEST: u8 = 0x05;

/// Power Condition page in its three page-control flavours.
#[derive(Clone, Debug)]
pub struct PowerPages {
    pub current: PowerConditionPage,
    pub changeable: PowerConditionPage,
    pub default: PowerConditionPage,
}

#[derive(Debug)]
pub struct FakeDisk {
    pub inquiry: Option<StandardInquiry>,
    pub serial: Option<Vec<u8>>,
    pub characteristics: Option<BlockDeviceCharacteristics>,
    pub capacity10: Option<ReadCapacity10>,
    pub capacity16: Option<ReadCapacity16>,
    pub power: Option<PowerPages>,
    /// Reject MODE SENSE (10) and MODE SELECT (10).
    pub reject_10_byte: bool,
    /// Reject only MODE SELECT (10).
    pub reject_select_10: bool,
    pub failing_page_controls: Vec<PageControl>,
    /// Length of zeroed block descriptors put before the page in MODE SENSE data, ignoring DBD.
    pub block_descriptors: u8,
    pub stopped: bool,
    /// Every CDB received, in order.
    pub log: Vec<Cdb>,
    /// Raw MODE SELECT parameter lists.
    pub selected: Vec<Vec<u8>>,
}

pub fn mask(conds: &[PowerCondition]) -> TimerMask {
    conds.iter().copied().collect()
}

fn fixed_text<const N: usize>(s: &str) -> [u8; N] {
    let mut out = [b' '; N];
    out[..s.len()].copy_from_slice(s.as_bytes());
    out
}

impl FakeDisk {
    /// A 4 TB 3.5" 7200 RPM disk with Idle_A and Standby_Z timers.
    pub fn hdd() -> Self {
        let enabled = mask(&[PowerCondition::IdleA, PowerCondition::StandbyZ]);
        let current = PowerConditionPage {
            parameters_saveable: true,
            enabled,
            timers: [1000, 0, 0, 0, 36000],
            ..Default::default()
        };
        let changeable = PowerConditionPage {
            enabled,
            timers: [u32::MAX, 0, 0, 0, u32::MAX],
            ..Default::default()
        };
        let default = PowerConditionPage {
            parameters_saveable: true,
            enabled,
            timers: [1000, 0, 0, 0, 0],
            ..Default::default()
        };

        Self {
            inquiry: Some(StandardInquiry {
                version: 6,
                response_data_format: 2,
                additional_length: 31,
                vendor: fixed_text("ATA"),
                product: fixed_text("WDC WD40EFRX-68N"),
                revision: fixed_text("0A82"),
                ..Default::default()
            }),
            serial: Some(b"     WD-WCC4E1234567\0\0".to_vec()),
            characteristics: Some(BlockDeviceCharacteristics {
                rotation_rate: 7200,
                form_factor: 2,
                ..Default::default()
            }),
            capacity10: Some(ReadCapacity10 {
                last_lba: 0xD1C0_BEAF,
                block_len: 512,
            }),
            capacity16: Some(ReadCapacity16 {
                last_lba: 0xD1C0_BEAF,
                block_len: 512,
                ..Default::default()
            }),
            power: Some(PowerPages {
                current,
                changeable,
                default,
            }),
            reject_10_byte: false,
            reject_select_10: false,
            failing_page_controls: Vec::new(),
            block_descriptors: 0,
            stopped: false,
            log: Vec::new(),
            selected: Vec::new(),
        }
    }

    pub fn opcodes(&self) -> Vec<u8> {
        self.log.iter().map(Cdb::opcode).collect()
    }

    pub fn current_timers(&self) -> [u32; PowerCondition::COUNT] {
        self.power.as_ref().map(|p| p.current.timers).unwrap_or_default()
    }

    fn reject(cdb: &Cdb) -> sdp_scsi::Result<usize> {
        Err(Error::Status {
            opcode: cdb.opcode(),
            status: CHECK_CONDITION,
            sense_key: Some(ILLEGAL_REQUEST),
        })
    }

    fn mode_sense(&self, length: CommandLength, cdb: &Cdb) -> Option<Vec<u8>> {
        let b = cdb.as_bytes();
        if b[2] & 0x3F != POWER_CONDITION_PAGE {
            return None;
        }
        let pc = PageControl::from_bits(b[2] >> 6);
        if self.failing_page_controls.contains(&pc) {
            return None;
        }
        let pages = self.power.as_ref()?;
        let page = match pc {
            PageControl::Current | PageControl::Saved => pages.current,
            PageControl::Changeable => pages.changeable,
            PageControl::Default => pages.default,
        };
        let mut data = PowerConditionData::sense_response(length, page);
        // DPOFUA
        data.header.device_specific = 0x10;
        let mut raw = data.encode(length);

        let descriptors = usize::from(self.block_descriptors);
        if descriptors > 0 {
            let header = ModeHeader {
                mode_data_length: data.header.mode_data_length + u16::from(self.block_descriptors),
                block_descriptor_length: u16::from(self.block_descriptors),
                ..data.header
            };
            let at = ModeHeader::len(length);
            header.encode(length, &mut raw[..at]);
            raw.splice(at..at, std::iter::repeat_n(0, descriptors));
        }
        Some(raw)
    }

    fn mode_select(&mut self, length: CommandLength, cdb: &Cdb, out: &[u8]) -> bool {
        let Some(pages) = self.power.as_mut() else {
            return false;
        };
        let Ok(data) = PowerConditionData::decode(length, out) else {
            return false;
        };
        // PS is reserved in MODE SELECT and SP must be set.
        if data.page.parameters_saveable || cdb.as_bytes()[1] & 0x01 == 0 {
            return false;
        }
        pages.current.timers = data.page.timers;
        self.selected.push(out.to_vec());
        true
    }
}

fn respond(data: DataPhase<'_>, payload: &[u8]) -> usize {
    match data {
        DataPhase::In(buf) => {
            let n = buf.len().min(payload.len());
            buf[..n].copy_from_slice(&payload[..n]);
            n
        }
        _ => 0,
    }
}

impl ScsiTransport for FakeDisk {
    fn execute(&mut self, cdb: &Cdb, data: DataPhase<'_>) -> sdp_scsi::Result<usize> {
        self.log.push(*cdb);
        let b = cdb.as_bytes();

        match cdb.opcode() {
            opcode::INQUIRY if b[1] & 0x01 != 0 => {
                let payload = match b[2] {
                    VPD_UNIT_SERIAL_NUMBER => self.serial.as_ref().map(|s| {
                        SerialNumberPage {
                            serial: s.clone(),
                            ..Default::default()
                        }
                        .encode()
                    }),
                    VPD_BLOCK_DEVICE_CHARACTERISTICS => {
                        self.characteristics.as_ref().map(|c| c.encode().to_vec())
                    }
                    _ => None,
                };
                match payload {
                    Some(p) => Ok(respond(data, &p)),
                    None => Self::reject(cdb),
                }
            }
            opcode::INQUIRY => match &self.inquiry {
                Some(inq) => Ok(respond(data, &inq.encode())),
                None => Err(std::io::Error::other("device gone").into()),
            },
            opcode::READ_CAPACITY10 => match self.capacity10 {
                Some(cap) => Ok(respond(data, &cap.encode())),
                None => Self::reject(cdb),
            },
            opcode::SERVICE_ACTION_IN16 if b[1] & 0x1F == READ_CAPACITY16_SERVICE_ACTION => {
                match self.capacity16 {
                    Some(cap) => Ok(respond(data, &cap.encode())),
                    None => Self::reject(cdb),
                }
            }
            opcode::MODE_SENSE6 | opcode::MODE_SENSE10 => {
                let length = if cdb.opcode() == opcode::MODE_SENSE10 {
                    CommandLength::C10
                } else {
                    CommandLength::C6
                };
                if length == CommandLength::C10 && self.reject_10_byte {
                    return Self::reject(cdb);
                }
                match self.mode_sense(length, cdb) {
                    Some(p) => Ok(respond(data, &p)),
                    None => Self::reject(cdb),
                }
            }
            opcode::MODE_SELECT6 | opcode::MODE_SELECT10 => {
                let length = if cdb.opcode() == opcode::MODE_SELECT10 {
                    CommandLength::C10
                } else {
                    CommandLength::C6
                };
                if length == CommandLength::C10 && (self.reject_10_byte || self.reject_select_10) {
                    return Self::reject(cdb);
                }
                let DataPhase::Out(out) = data else {
                    return Self::reject(cdb);
                };
                if self.mode_select(length, cdb, out) {
                    Ok(out.len())
                } else {
                    Self::reject(cdb)
                }
            }
            opcode::START_STOP_UNIT => {
                self.stopped = b[4] & 0x01 == 0;
                Ok(0)
            }
            _ => Self::reject(cdb),
        }
    }
}
