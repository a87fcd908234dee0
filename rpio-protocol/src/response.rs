//! Responses clocked back from the co-processor

use heapless::Vec;

use crate::packet::{IoPacket, PACKET_PAYLOAD_BYTES};

/// UART data extracted from a response packet
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    /// Page the co-processor answered for
    pub page: u16,
    /// Reported byte count (may exceed what a packet can carry)
    pub offset: u16,
    /// Valid payload bytes: the first `min(offset, capacity)` bytes
    pub data: Vec<u8, PACKET_PAYLOAD_BYTES>,
}

impl Response {
    /// Extract the fields of a response
    ///
    /// The integrity tag is not looked at; call [`IoPacket::verify`] first
    /// when responses should be checked.
    pub fn from_packet(packet: &IoPacket) -> Self {
        let len = (packet.offset as usize).min(PACKET_PAYLOAD_BYTES);
        let payload = packet.payload();

        let mut data = Vec::new();
        // Cannot fail: len is clamped to capacity
        let _ = data.extend_from_slice(&payload[..len]);

        Self {
            page: packet.page,
            offset: packet.offset,
            data,
        }
    }

    /// Whether this response is for `page`
    pub fn is_for(&self, page: u16) -> bool {
        self.page == page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PAGE_UART_BUFFER;

    #[test]
    fn test_data_limited_by_offset() {
        let mut packet = IoPacket::zeroed();
        packet.page = PAGE_UART_BUFFER;
        packet.offset = 2;
        packet.set_payload(&[9, 8, 7, 6]).unwrap();

        let response = Response::from_packet(&packet);
        assert!(response.is_for(PAGE_UART_BUFFER));
        assert_eq!(response.data.as_slice(), &[9, 8]);
    }

    #[test]
    fn test_data_limited_by_capacity() {
        let mut packet = IoPacket::zeroed();
        packet.page = PAGE_UART_BUFFER;
        packet.offset = 500;

        let response = Response::from_packet(&packet);
        assert_eq!(response.offset, 500);
        assert_eq!(response.data.len(), PACKET_PAYLOAD_BYTES);
    }

    #[test]
    fn test_foreign_page() {
        let mut packet = IoPacket::zeroed();
        packet.page = 0;
        packet.offset = 4;

        let response = Response::from_packet(&packet);
        assert!(!response.is_for(PAGE_UART_BUFFER));
    }
}
