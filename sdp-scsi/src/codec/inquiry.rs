//! Standard INQUIRY data and the two VPD pages used for identification.

use super::{DecodeError, be_u16, be_u32, ensure_len, put_be_u16, put_be_u32};

pub const VPD_UNIT_SERIAL_NUMBER: u8 = 0x80;
pub const VPD_BLOCK_DEVICE_CHARACTERISTICS: u8 = 0xB1;

/// Allocation length used for every VPD request.
pub const VPD_BUFFER_LEN: usize = 128;

/// Standard INQUIRY data, first 36 bytes.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct StandardInquiry {
    pub qualifier: u8,
    pub device_type: u8,
    pub removable: bool,
    pub version: u8,
    pub response_data_format: u8,
    pub additional_length: u8,
    pub vendor: [u8; 8],
    pub product: [u8; 16],
    pub revision: [u8; 4],
}

impl StandardInquiry {
    pub const LEN: usize = 36;

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("standard INQUIRY data", buf, Self::LEN)?;

        let mut vendor = [0; 8];
        let mut product = [0; 16];
        let mut revision = [0; 4];
        vendor.copy_from_slice(&buf[8..16]);
        product.copy_from_slice(&buf[16..32]);
        revision.copy_from_slice(&buf[32..36]);

        Ok(Self {
            qualifier: buf[0] >> 5,
            device_type: buf[0] & 0x1F,
            removable: buf[1] & 0x80 != 0,
            version: buf[2],
            response_data_format: buf[3] & 0x0F,
            additional_length: buf[4],
            vendor,
            product,
            revision,
        })
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0; Self::LEN];
        buf[0] = (self.qualifier << 5) | (self.device_type & 0x1F);
        buf[1] = if self.removable { 0x80 } else { 0 };
        buf[2] = self.version;
        buf[3] = self.response_data_format & 0x0F;
        buf[4] = self.additional_length;
        buf[8..16].copy_from_slice(&self.vendor);
        buf[16..32].copy_from_slice(&self.product);
        buf[32..36].copy_from_slice(&self.revision);
        buf
    }
}

/// Unit Serial Number VPD page (0x80).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SerialNumberPage {
    pub qualifier: u8,
    pub device_type: u8,
    /// Raw serial bytes as reported, untrimmed.
    pub serial: Vec<u8>,
}

impl SerialNumberPage {
    const HEADER_LEN: usize = 4;

    /// The serial is clamped to whatever the buffer actually holds.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        const WHAT: &str = "unit serial number page";

        ensure_len(WHAT, buf, Self::HEADER_LEN)?;
        if buf[1] != VPD_UNIT_SERIAL_NUMBER {
            return Err(DecodeError::UnexpectedPage {
                what: WHAT,
                expected: VPD_UNIT_SERIAL_NUMBER,
                got: buf[1],
            });
        }

        let page_len = usize::from(be_u16(buf, 2));
        let end = Self::HEADER_LEN + page_len.min(buf.len() - Self::HEADER_LEN);

        Ok(Self {
            qualifier: buf[0] >> 5,
            device_type: buf[0] & 0x1F,
            serial: buf[Self::HEADER_LEN..end].to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0; Self::HEADER_LEN + self.serial.len()];
        buf[0] = (self.qualifier << 5) | (self.device_type & 0x1F);
        buf[1] = VPD_UNIT_SERIAL_NUMBER;
        put_be_u16(&mut buf, 2, self.serial.len() as u16);
        buf[Self::HEADER_LEN..].copy_from_slice(&self.serial);
        buf
    }
}

/// Block Device Characteristics VPD page (0xB1).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockDeviceCharacteristics {
    pub qualifier: u8,
    pub device_type: u8,
    /// 0: not reported, 1: non-rotating medium, otherwise RPM.
    pub rotation_rate: u16,
    pub product_type: u8,
    pub wabereq: u8,
    pub wacereq: u8,
    /// Nominal form factor code, low nibble of byte 7.
    pub form_factor: u8,
    pub zoned: u8,
    pub rbwz: bool,
    pub bocs: bool,
    pub fuab: bool,
    pub vbuls: bool,
    pub depopulation_time: u32,
}

impl BlockDeviceCharacteristics {
    /// Full page size, header included.
    pub const LEN: usize = 64;
    const PAGE_LEN: u16 = 0x3C;
    /// Bytes that must be present to report rotation rate and form factor.
    const MIN_LEN: usize = 8;

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        const WHAT: &str = "block device characteristics page";

        ensure_len(WHAT, buf, Self::MIN_LEN)?;
        if buf[1] != VPD_BLOCK_DEVICE_CHARACTERISTICS {
            return Err(DecodeError::UnexpectedPage {
                what: WHAT,
                expected: VPD_BLOCK_DEVICE_CHARACTERISTICS,
                got: buf[1],
            });
        }

        let (flags, depopulation_time) = if buf.len() >= 16 {
            (buf[8], be_u32(buf, 12))
        } else {
            (0, 0)
        };

        Ok(Self {
            qualifier: buf[0] >> 5,
            device_type: buf[0] & 0x1F,
            rotation_rate: be_u16(buf, 4),
            product_type: buf[6],
            wabereq: buf[7] >> 6,
            wacereq: (buf[7] >> 4) & 0b11,
            form_factor: buf[7] & 0x0F,
            zoned: (flags >> 4) & 0b11,
            rbwz: flags & 0x08 != 0,
            bocs: flags & 0x04 != 0,
            fuab: flags & 0x02 != 0,
            vbuls: flags & 0x01 != 0,
            depopulation_time,
        })
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0; Self::LEN];
        buf[0] = (self.qualifier << 5) | (self.device_type & 0x1F);
        buf[1] = VPD_BLOCK_DEVICE_CHARACTERISTICS;
        put_be_u16(&mut buf, 2, Self::PAGE_LEN);
        put_be_u16(&mut buf, 4, self.rotation_rate);
        buf[6] = self.product_type;
        buf[7] = (self.wabereq << 6) | ((self.wacereq & 0b11) << 4) | (self.form_factor & 0x0F);
        buf[8] = ((self.zoned & 0b11) << 4)
            | (u8::from(self.rbwz) << 3)
            | (u8::from(self.bocs) << 2)
            | (u8::from(self.fuab) << 1)
            | u8::from(self.vbuls);
        put_be_u32(&mut buf, 12, self.depopulation_time);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inquiry_fields() {
        let mut raw = [0u8; 36];
        raw[0] = 0x00;
        raw[1] = 0x80;
        raw[2] = 0x06;
        raw[3] = 0x02;
        raw[8..16].copy_from_slice(b"ATA     ");
        raw[16..32].copy_from_slice(b"WDC WD40EFRX-68N");
        raw[32..36].copy_from_slice(b"0A82");

        let inq = StandardInquiry::decode(&raw).unwrap();
        assert!(inq.removable);
        assert_eq!(inq.version, 6);
        assert_eq!(&inq.vendor, b"ATA     ");
        assert_eq!(&inq.revision, b"0A82");
        assert_eq!(inq.encode(), raw);
    }

    #[test]
    fn inquiry_truncated() {
        assert!(StandardInquiry::decode(&[0; 35]).is_err());
    }

    #[test]
    fn serial_clamped_to_buffer() {
        // Page claims 20 bytes but only 6 arrived.
        let raw = [0, 0x80, 0, 20, b'W', b'D', b'-', b'1', b' ', b' '];
        let page = SerialNumberPage::decode(&raw).unwrap();
        assert_eq!(page.serial, b"WD-1  ");
    }

    #[test]
    fn serial_wrong_page() {
        let raw = [0, 0x83, 0, 0];
        assert!(matches!(
            SerialNumberPage::decode(&raw),
            Err(DecodeError::UnexpectedPage { got: 0x83, .. })
        ));
    }

    #[test]
    fn characteristics_layout() {
        let page = BlockDeviceCharacteristics {
            rotation_rate: 7200,
            form_factor: 2,
            wabereq: 1,
            zoned: 1,
            bocs: true,
            depopulation_time: 5,
            ..Default::default()
        };
        let raw = page.encode();
        assert_eq!(raw[1], 0xB1);
        assert_eq!(raw[2..4], [0x00, 0x3C]);
        assert_eq!(raw[4..6], 7200u16.to_be_bytes());
        assert_eq!(raw[7], 0x42);
        assert_eq!(raw[8], 0x14);
        assert_eq!(BlockDeviceCharacteristics::decode(&raw).unwrap(), page);
    }
}
