//! READ CAPACITY parameter data.

use super::{DecodeError, be_u16, be_u32, be_u64, ensure_len, put_be_u16, put_be_u32, put_be_u64};

/// READ CAPACITY (10) parameter data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ReadCapacity10 {
    pub last_lba: u32,
    pub block_len: u32,
}

impl ReadCapacity10 {
    pub const LEN: usize = 8;
    /// Last LBA value telling the client to use READ CAPACITY (16).
    pub const OVERFLOW: u32 = u32::MAX;

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("READ CAPACITY (10) data", buf, Self::LEN)?;
        Ok(Self {
            last_lba: be_u32(buf, 0),
            block_len: be_u32(buf, 4),
        })
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0; Self::LEN];
        put_be_u32(&mut buf, 0, self.last_lba);
        put_be_u32(&mut buf, 4, self.block_len);
        buf
    }

    /// `None` when the capacity does not fit and the 16 byte variant is needed.
    pub const fn block_count(&self) -> Option<u64> {
        if self.last_lba == Self::OVERFLOW {
            None
        } else {
            Some(self.last_lba as u64 + 1)
        }
    }
}

/// READ CAPACITY (16) parameter data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ReadCapacity16 {
    pub last_lba: u64,
    pub block_len: u32,
    pub rc_basis: u8,
    pub p_type: u8,
    pub prot_en: bool,
    pub p_i_exponent: u8,
    /// Logical blocks per physical block exponent
    pub lbppbe: u8,
    pub lbpme: bool,
    pub lbprz: bool,
    pub lowest_aligned_lba: u16,
}

impl ReadCapacity16 {
    pub const LEN: usize = 32;

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("READ CAPACITY (16) data", buf, Self::LEN)?;
        Ok(Self {
            last_lba: be_u64(buf, 0),
            block_len: be_u32(buf, 8),
            rc_basis: (buf[12] >> 4) & 0b11,
            p_type: (buf[12] >> 1) & 0b111,
            prot_en: buf[12] & 0x01 != 0,
            p_i_exponent: buf[13] >> 4,
            lbppbe: buf[13] & 0x0F,
            lbpme: buf[14] & 0x80 != 0,
            lbprz: buf[14] & 0x40 != 0,
            lowest_aligned_lba: be_u16(buf, 14) & 0x3FFF,
        })
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0; Self::LEN];
        put_be_u64(&mut buf, 0, self.last_lba);
        put_be_u32(&mut buf, 8, self.block_len);
        buf[12] = ((self.rc_basis & 0b11) << 4) | ((self.p_type & 0b111) << 1) | u8::from(self.prot_en);
        buf[13] = (self.p_i_exponent << 4) | (self.lbppbe & 0x0F);
        put_be_u16(&mut buf, 14, self.lowest_aligned_lba & 0x3FFF);
        buf[14] |= (u8::from(self.lbpme) << 7) | (u8::from(self.lbprz) << 6);
        buf
    }

    pub const fn block_count(&self) -> Option<u64> {
        if self.last_lba == u64::MAX {
            None
        } else {
            Some(self.last_lba + 1)
        }
    }
}
