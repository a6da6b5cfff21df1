//! mcrpc wire protocol
//!
//! This crate defines how a master and a slave microcontroller exchange
//! remote procedure calls over a byte link: the frame layout, the CRC-16
//! that guards it, and the codec that moves frames through a [`Transport`].
//!
//! # Protocol Overview
//!
//! Every packet uses the same binary frame:
//! ```text
//! ┌─────────┬──────────┬───────────────┬──────────┐
//! │ MAGIC   │ LENGTH   │ PAYLOAD       │ CRC-16   │
//! │ 2B (LE) │ 4B (LE)  │ LENGTH bytes  │ 2B (LE)  │
//! └─────────┴──────────┴───────────────┴──────────┘
//! ```
//!
//! The CRC covers LENGTH and PAYLOAD. MAGIC tells the receiver which step
//! of an exchange the frame belongs to:
//!
//! ```text
//! master                                   slave
//!   │── command header (rpc id, length) ──▶ │
//!   │── command data (if length > 0) ─────▶ │
//!   │                                       │ callback
//!   │◀── result header (length) ─────────── │
//!   │◀── result data (if length > 0) ────── │
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod checksum;
pub mod error;
pub mod frame;
pub mod header;
#[cfg(any(test, feature = "std"))]
pub mod mock;
pub mod transport;

pub use checksum::{crc16, Crc16};
pub use error::{Error, FrameError, TransportError};
pub use frame::{
    decode_frame, encode_frame, receive_frame, send_frame, FrameReader, Magic,
    FRAME_HEADER_SIZE, MAX_FRAME_SIZE, MAX_LOCAL_BUFFER, MIN_PACKET_SIZE,
};
pub use header::{CommandHeader, ResultHeader};
pub use transport::{deadline_after, remaining, Transport};
