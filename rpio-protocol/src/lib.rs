//! RPIO Co-processor Packet Protocol
//!
//! This crate defines the register/packet protocol spoken between the
//! flight controller and the I/O co-processor over SPI. Every transaction
//! is a full-duplex exchange of one fixed-size packet in each direction.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌────────────┬──────┬────────┬──────────────────┬─────┐
//! │ COUNT_CODE │ PAGE │ OFFSET │ REGS             │ CRC │
//! │ 2B         │ 2B   │ 2B     │ 32 x u16 = 64B   │ 2B  │
//! └────────────┴──────┴────────┴──────────────────┴─────┘
//! ```
//!
//! The UART byte streams live on a single page, [`PAGE_UART_BUFFER`]. A
//! `Write` to offset 0 of that page sets the co-processor's baud rate, a
//! `BulkUart` pushes outbound bytes, and a `Read` fetches inbound bytes.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod packet;
pub mod request;
pub mod response;

pub use packet::{
    crc8, IoPacket, PacketCode, PacketError, PACKET_PAYLOAD_BYTES, PACKET_SIZE, PAGE_UART_BUFFER,
    PKT_MAX_REGS,
};
pub use request::{baudrate_regs, Request};
pub use response::Response;
