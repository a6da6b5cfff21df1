//! Frame encoding and decoding
//!
//! Frame format:
//! - MAGIC (2 bytes, LE): packet kind, see [`Magic`]
//! - LENGTH (4 bytes, LE): payload length
//! - PAYLOAD (LENGTH bytes): opaque
//! - CRC (2 bytes, LE): CRC-16 of LENGTH and PAYLOAD
//!
//! [`send_frame`] writes a frame in three segments (header, payload, CRC)
//! and [`receive_frame`] reads it back in the same three segments. Buses
//! that move data in discrete transfers (I2C, SPI) rely on both sides
//! agreeing on those sizes. The timeout covers the whole frame: each
//! segment only gets what the earlier ones left over.
//!
//! [`FrameReader`] is the resumable form of [`receive_frame`]. After a
//! timeout it remembers which segment it was waiting for, so a retry picks
//! up mid-frame instead of reading the payload as a new header.

use heapless::Vec;

use crate::checksum::Crc16;
use crate::error::{Error, FrameError};
use crate::transport::{deadline_after, remaining, Transport};

/// Largest payload a node accepts (receive buffer size)
#[cfg(not(feature = "compact"))]
pub const MAX_LOCAL_BUFFER: usize = 256;

/// Largest payload a node accepts (receive buffer size)
#[cfg(feature = "compact")]
pub const MAX_LOCAL_BUFFER: usize = 32;

/// MAGIC + LENGTH
pub const FRAME_HEADER_SIZE: usize = 6;

/// CRC trailer size
pub const CHECKSUM_SIZE: usize = 2;

/// Smallest legal frame (empty payload)
pub const MIN_PACKET_SIZE: usize = FRAME_HEADER_SIZE + CHECKSUM_SIZE;

/// Largest frame carrying a full local buffer
pub const MAX_FRAME_SIZE: usize = MIN_PACKET_SIZE + MAX_LOCAL_BUFFER;

/// Packet kind marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Magic {
    /// Master → slave: rpc id and command payload length
    CommandHeader = 0x1209,
    /// Master → slave: command payload
    CommandData = 0xABD1,
    /// Slave → master: result payload length
    ResultHeader = 0x9021,
    /// Slave → master: result payload
    ResultData = 0x1DBA,
}

impl Magic {
    /// Get the wire value
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Parse a wire value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x1209 => Some(Magic::CommandHeader),
            0xABD1 => Some(Magic::CommandData),
            0x9021 => Some(Magic::ResultHeader),
            0x1DBA => Some(Magic::ResultData),
            _ => None,
        }
    }
}

fn length_field(payload: &[u8]) -> Result<[u8; 4], Error> {
    let len = u32::try_from(payload.len()).map_err(|_| Error::Capacity {
        len: u32::MAX,
        capacity: u32::MAX,
    })?;
    Ok(len.to_le_bytes())
}

fn frame_checksum(length: &[u8], payload: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(length);
    crc.update(payload);
    crc.finish()
}

fn header_bytes(magic: Magic, length: [u8; 4]) -> [u8; FRAME_HEADER_SIZE] {
    let magic = magic.as_u16().to_le_bytes();
    [magic[0], magic[1], length[0], length[1], length[2], length[3]]
}

fn check_magic(expected: Magic, header: &[u8]) -> Result<(), FrameError> {
    let found = u16::from_le_bytes([header[0], header[1]]);
    if found != expected.as_u16() {
        return Err(FrameError::MagicMismatch {
            expected: expected.as_u16(),
            found,
        });
    }
    Ok(())
}

fn declared_length(header: &[u8]) -> u32 {
    u32::from_le_bytes([header[2], header[3], header[4], header[5]])
}

fn verify(length: &[u8], payload: &[u8], trailer: [u8; 2]) -> Result<(), FrameError> {
    let received = u16::from_le_bytes(trailer);
    let computed = frame_checksum(length, payload);
    if received != computed {
        return Err(FrameError::ChecksumMismatch { received, computed });
    }
    Ok(())
}

/// Encode a frame into a byte buffer
///
/// Returns the number of bytes written
pub fn encode_frame(magic: Magic, payload: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let frame_len = MIN_PACKET_SIZE + payload.len();
    if out.len() < frame_len {
        return Err(Error::Capacity {
            len: frame_len as u32,
            capacity: out.len() as u32,
        });
    }

    let length = length_field(payload)?;
    let crc = frame_checksum(&length, payload);

    out[..FRAME_HEADER_SIZE].copy_from_slice(&header_bytes(magic, length));
    out[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + payload.len()].copy_from_slice(payload);
    out[FRAME_HEADER_SIZE + payload.len()..frame_len].copy_from_slice(&crc.to_le_bytes());

    Ok(frame_len)
}

/// Encode a frame into a heapless Vec
pub fn encode_frame_to_vec(magic: Magic, payload: &[u8]) -> Result<Vec<u8, MAX_FRAME_SIZE>, Error> {
    let mut buffer = [0u8; MAX_FRAME_SIZE];
    let len = encode_frame(magic, payload, &mut buffer)?;
    let mut vec = Vec::new();
    vec.extend_from_slice(&buffer[..len])
        .map_err(|_| Error::Capacity {
            len: len as u32,
            capacity: MAX_FRAME_SIZE as u32,
        })?;
    Ok(vec)
}

/// Decode a complete frame held in memory
///
/// Returns the payload slice. Trailing bytes after the CRC are ignored.
pub fn decode_frame(expected: Magic, raw: &[u8]) -> Result<&[u8], Error> {
    if raw.len() < MIN_PACKET_SIZE {
        return Err(FrameError::Truncated.into());
    }
    check_magic(expected, raw)?;

    let len = declared_length(raw) as usize;
    if len > raw.len() - MIN_PACKET_SIZE {
        return Err(FrameError::Truncated.into());
    }
    let end = FRAME_HEADER_SIZE + len;

    let payload = &raw[FRAME_HEADER_SIZE..end];
    verify(&raw[2..FRAME_HEADER_SIZE], payload, [raw[end], raw[end + 1]])?;
    Ok(payload)
}

/// Write one frame to the transport
///
/// All three segments share one `timeout_ms` budget. No retries.
pub fn send_frame<T: Transport + ?Sized>(
    transport: &mut T,
    magic: Magic,
    payload: &[u8],
    timeout_ms: u32,
) -> Result<(), Error> {
    let length = length_field(payload)?;
    let crc = frame_checksum(&length, payload);
    let deadline = deadline_after(transport, timeout_ms);

    let budget = remaining(transport, deadline);
    transport.write(&header_bytes(magic, length), budget)?;
    if !payload.is_empty() {
        let budget = remaining(transport, deadline);
        transport.write(payload, budget)?;
    }
    let budget = remaining(transport, deadline);
    transport.write(&crc.to_le_bytes(), budget)?;
    Ok(())
}

/// Read one frame from the transport into `buf`
///
/// Returns the payload length. A declared length larger than `buf` is
/// rejected before any payload byte is read, leaving `buf` untouched.
pub fn receive_frame<T: Transport + ?Sized>(
    transport: &mut T,
    expected: Magic,
    buf: &mut [u8],
    timeout_ms: u32,
) -> Result<usize, Error> {
    FrameReader::new(expected).resume(transport, buf, timeout_ms)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Waiting for MAGIC and LENGTH
    WaitingForHeader,
    /// Got a header that fits, reading payload bytes
    ReadingPayload,
    /// Waiting for the CRC
    WaitingForChecksum,
}

/// Frame reception that survives timeouts
///
/// Keep the reader and the buffer alive between calls to
/// [`resume`](Self::resume). Any outcome other than a timeout (success,
/// bad magic, bad CRC, capacity) returns the reader to its initial state.
#[derive(Debug, Clone)]
pub struct FrameReader {
    expected: Magic,
    header: [u8; FRAME_HEADER_SIZE],
    state: ReadState,
}

impl FrameReader {
    pub fn new(expected: Magic) -> Self {
        Self {
            expected,
            header: [0; FRAME_HEADER_SIZE],
            state: ReadState::WaitingForHeader,
        }
    }

    /// Forget any partly read frame
    pub fn reset(&mut self) {
        self.state = ReadState::WaitingForHeader;
    }

    /// Check if the frame header has been read
    pub fn started(&self) -> bool {
        self.state != ReadState::WaitingForHeader
    }

    /// Continue reading the frame for at most `timeout_ms`
    ///
    /// Returns the payload length once the whole frame is in and verified.
    pub fn resume<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, Error> {
        let deadline = deadline_after(transport, timeout_ms);
        let result = self.advance(transport, buf, deadline);
        if result != Err(Error::Timeout) {
            self.reset();
        }
        result
    }

    fn advance<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        buf: &mut [u8],
        deadline: u64,
    ) -> Result<usize, Error> {
        if self.state == ReadState::WaitingForHeader {
            let budget = remaining(transport, deadline);
            transport.read(&mut self.header, budget)?;
            check_magic(self.expected, &self.header)?;
            self.fit(buf)?;
            self.state = ReadState::ReadingPayload;
        }

        let len = self.fit(buf)?;
        if self.state == ReadState::ReadingPayload {
            if len > 0 {
                let budget = remaining(transport, deadline);
                transport.read(&mut buf[..len], budget)?;
            }
            self.state = ReadState::WaitingForChecksum;
        }

        let mut trailer = [0u8; CHECKSUM_SIZE];
        let budget = remaining(transport, deadline);
        transport.read(&mut trailer, budget)?;
        verify(&self.header[2..], &buf[..len], trailer)?;
        Ok(len)
    }

    /// Declared payload length, if `buf` can hold it
    fn fit(&self, buf: &[u8]) -> Result<usize, Error> {
        let declared = declared_length(&self.header);
        if declared as usize > buf.len() {
            return Err(Error::Capacity {
                len: declared,
                capacity: buf.len() as u32,
            });
        }
        Ok(declared as usize)
    }
}
