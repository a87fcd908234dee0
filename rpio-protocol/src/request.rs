//! Requests sent to the co-processor
//!
//! Each variant knows its own opcode, so the `count_code` field can never
//! disagree with what the packet carries.

use crate::packet::{IoPacket, PacketCode, PacketError, PACKET_PAYLOAD_BYTES, PKT_MAX_REGS};

/// A request, before it is laid out as an [`IoPacket`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request<'a> {
    /// Ask for the contents of a page; carries no payload
    Read { page: u16 },
    /// Write registers starting at `offset`
    Write {
        page: u16,
        offset: u16,
        regs: &'a [u16],
    },
    /// Push UART bytes; the register array is exchanged whole and the
    /// offset says how many leading bytes are valid
    BulkUart { page: u16, data: &'a [u8] },
}

impl<'a> Request<'a> {
    /// Opcode for this request
    pub fn code(&self) -> PacketCode {
        match self {
            Request::Read { .. } => PacketCode::Read,
            Request::Write { .. } => PacketCode::Write,
            Request::BulkUart { .. } => PacketCode::BulkUart,
        }
    }

    /// Lay out and seal this request
    pub fn encode(&self) -> Result<IoPacket, PacketError> {
        let mut packet = IoPacket::zeroed();

        let count = match *self {
            Request::Read { page } => {
                packet.page = page;
                0
            }
            Request::Write { page, offset, regs } => {
                if regs.len() > PKT_MAX_REGS {
                    return Err(PacketError::PayloadTooLarge);
                }
                packet.page = page;
                packet.offset = offset;
                packet.regs[..regs.len()].copy_from_slice(regs);
                regs.len() * 2
            }
            Request::BulkUart { page, data } => {
                packet.set_payload(data)?;
                packet.page = page;
                packet.offset = data.len() as u16;
                PACKET_PAYLOAD_BYTES
            }
        };

        packet.count_code = count as u16 | self.code() as u16;
        packet.seal();
        Ok(packet)
    }
}

/// Register pair announcing a baud rate: low half first
pub fn baudrate_regs(baudrate: u32) -> [u16; 2] {
    [(baudrate & 0xFFFF) as u16, (baudrate >> 16) as u16]
}
