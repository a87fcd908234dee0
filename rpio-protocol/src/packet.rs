//! Packet layout and integrity check for the co-processor bus.
//!
//! Packet format (little-endian, fixed 72 bytes):
//! - COUNT_CODE (2 bytes): byte count in the low 14 bits, opcode in the top 2
//! - PAGE (2 bytes): register bank the packet addresses
//! - OFFSET (2 bytes): register offset, or valid byte count for UART traffic
//! - REGS (64 bytes): 32 sixteen-bit registers of payload
//! - CRC (2 bytes): CRC-8 of the whole packet with this field zeroed

/// Number of 16-bit registers carried by every packet
pub const PKT_MAX_REGS: usize = 32;

/// Payload capacity of a packet in bytes
pub const PACKET_PAYLOAD_BYTES: usize = PKT_MAX_REGS * 2;

/// Size of a packet on the wire (COUNT_CODE + PAGE + OFFSET + REGS + CRC)
pub const PACKET_SIZE: usize = 2 + 2 + 2 + PACKET_PAYLOAD_BYTES + 2;

/// Bits of `count_code` holding the byte count
pub const PKT_COUNT_MASK: u16 = 0x3FFF;

/// Bits of `count_code` holding the opcode
pub const PKT_CODE_MASK: u16 = 0xC000;

/// Page exposing the co-processor's UART byte streams
pub const PAGE_UART_BUFFER: u16 = 8;

const REGS_START: usize = 6;
const CRC_START: usize = REGS_START + PACKET_PAYLOAD_BYTES;

/// Errors that can occur while building or checking a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Payload exceeds the register array
    PayloadTooLarge,
    /// CRC mismatch
    InvalidChecksum,
    /// Opcode bits hold a value with no meaning
    InvalidCode,
}

/// Operation selected by the top bits of `count_code`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum PacketCode {
    /// Read registers from a page
    Read = 0x0000,
    /// Write registers to a page
    Write = 0x4000,
    /// Exchange UART bytes: outbound data in, pending inbound data out
    BulkUart = 0x8000,
}

impl PacketCode {
    /// Decode the opcode bits of a `count_code` field
    pub fn from_count_code(count_code: u16) -> Result<Self, PacketError> {
        match count_code & PKT_CODE_MASK {
            0x0000 => Ok(PacketCode::Read),
            0x4000 => Ok(PacketCode::Write),
            0x8000 => Ok(PacketCode::BulkUart),
            _ => Err(PacketError::InvalidCode),
        }
    }
}

/// CRC-8 over `data`
///
/// Polynomial 0x07 (x^8 + x^2 + x + 1), initial value 0, MSB first.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ 0x07;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// One bus transaction's worth of data, in either direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IoPacket {
    /// Byte count and opcode
    pub count_code: u16,
    /// Register bank
    pub page: u16,
    /// Register offset or byte count, depending on the opcode
    pub offset: u16,
    /// Payload registers
    pub regs: [u16; PKT_MAX_REGS],
    /// Integrity tag
    pub crc: u16,
}

impl Default for IoPacket {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl IoPacket {
    /// A packet with every field zero
    pub const fn zeroed() -> Self {
        Self {
            count_code: 0,
            page: 0,
            offset: 0,
            regs: [0; PKT_MAX_REGS],
            crc: 0,
        }
    }

    /// Opcode carried by this packet
    pub fn code(&self) -> Result<PacketCode, PacketError> {
        PacketCode::from_count_code(self.count_code)
    }

    /// Byte count carried by this packet
    pub fn count(&self) -> u16 {
        self.count_code & PKT_COUNT_MASK
    }

    /// Registers viewed as raw bytes, low byte first
    pub fn payload(&self) -> [u8; PACKET_PAYLOAD_BYTES] {
        let mut bytes = [0u8; PACKET_PAYLOAD_BYTES];
        for (chunk, reg) in bytes.chunks_exact_mut(2).zip(self.regs.iter()) {
            chunk.copy_from_slice(&reg.to_le_bytes());
        }
        bytes
    }

    /// Copy raw bytes into the registers, zeroing whatever is left over
    pub fn set_payload(&mut self, data: &[u8]) -> Result<(), PacketError> {
        if data.len() > PACKET_PAYLOAD_BYTES {
            return Err(PacketError::PayloadTooLarge);
        }

        let mut bytes = [0u8; PACKET_PAYLOAD_BYTES];
        bytes[..data.len()].copy_from_slice(data);
        for (reg, chunk) in self.regs.iter_mut().zip(bytes.chunks_exact(2)) {
            *reg = u16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Ok(())
    }

    /// Serialize to the wire layout
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut buffer = [0u8; PACKET_SIZE];
        buffer[0..2].copy_from_slice(&self.count_code.to_le_bytes());
        buffer[2..4].copy_from_slice(&self.page.to_le_bytes());
        buffer[4..6].copy_from_slice(&self.offset.to_le_bytes());
        buffer[REGS_START..CRC_START].copy_from_slice(&self.payload());
        buffer[CRC_START..].copy_from_slice(&self.crc.to_le_bytes());
        buffer
    }

    /// Deserialize from the wire layout
    ///
    /// No validation happens here; see [`IoPacket::verify`].
    pub fn from_bytes(buffer: &[u8; PACKET_SIZE]) -> Self {
        let field = |at: usize| u16::from_le_bytes([buffer[at], buffer[at + 1]]);

        let mut regs = [0u16; PKT_MAX_REGS];
        for (i, reg) in regs.iter_mut().enumerate() {
            *reg = field(REGS_START + i * 2);
        }

        Self {
            count_code: field(0),
            page: field(2),
            offset: field(4),
            regs,
            crc: field(CRC_START),
        }
    }

    /// CRC of this packet as it would be sealed
    pub fn compute_crc(&self) -> u16 {
        let mut unsealed = *self;
        unsealed.crc = 0;
        crc8(&unsealed.to_bytes()) as u16
    }

    /// Store the integrity tag
    pub fn seal(&mut self) {
        self.crc = 0;
        self.crc = self.compute_crc();
    }

    /// Check the integrity tag against a recomputation
    pub fn verify(&self) -> Result<(), PacketError> {
        if self.crc != self.compute_crc() {
            return Err(PacketError::InvalidChecksum);
        }
        Ok(())
    }
}
