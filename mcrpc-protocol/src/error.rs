//! Protocol errors
//!
//! Every failure here is recoverable. A noisy or half-synchronised link is
//! a normal operating condition, so the codec reports and never panics.

use core::fmt;

/// Failure reported by a byte transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The requested bytes did not move within the timeout
    Timeout,
    /// The bus itself failed (NACK storm, overrun, disconnected line)
    Bus,
}

/// A frame arrived but cannot be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame belongs to a different protocol step, or the stream is misaligned
    MagicMismatch { expected: u16, found: u16 },
    /// CRC over length and payload does not match the trailer
    ChecksumMismatch { received: u16, computed: u16 },
    /// Fewer bytes than the header declares
    Truncated,
    /// Header payload has the wrong size for its packet kind
    Malformed,
}

/// Error from a protocol operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Physical read/write failed
    Transport,
    /// Expected bytes did not arrive (or leave) in time
    Timeout,
    /// Corrupted or misaligned frame
    Frame(FrameError),
    /// Payload length exceeds the buffer that must hold it
    Capacity { len: u32, capacity: u32 },
}

impl Error {
    /// Check if the failure is a soft one
    ///
    /// Soft failures (timeouts, magic and checksum mismatches) are what a
    /// noisy link produces; retrying the whole exchange is the normal
    /// response.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Error::Timeout
                | Error::Frame(FrameError::MagicMismatch { .. })
                | Error::Frame(FrameError::ChecksumMismatch { .. })
        )
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => Error::Timeout,
            TransportError::Bus => Error::Transport,
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Error::Frame(e)
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::MagicMismatch { expected, found } => {
                write!(f, "magic mismatch: expected {expected:#06x}, found {found:#06x}")
            }
            FrameError::ChecksumMismatch { received, computed } => {
                write!(f, "checksum mismatch: received {received:#06x}, computed {computed:#06x}")
            }
            FrameError::Truncated => f.write_str("frame truncated"),
            FrameError::Malformed => f.write_str("malformed header payload"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport => f.write_str("transport failure"),
            Error::Timeout => f.write_str("timed out"),
            Error::Frame(e) => write!(f, "framing failure: {e}"),
            Error::Capacity { len, capacity } => {
                write!(f, "payload of {len} bytes exceeds capacity of {capacity}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_classification() {
        assert!(Error::Timeout.is_soft());
        assert!(Error::Frame(FrameError::MagicMismatch {
            expected: 0x1209,
            found: 0x0000
        })
        .is_soft());
        assert!(Error::Frame(FrameError::ChecksumMismatch {
            received: 1,
            computed: 2
        })
        .is_soft());
        assert!(!Error::Transport.is_soft());
        assert!(!Error::Capacity { len: 300, capacity: 256 }.is_soft());
        assert!(!Error::Frame(FrameError::Malformed).is_soft());
    }

    #[test]
    fn test_transport_error_conversion() {
        assert_eq!(Error::from(TransportError::Timeout), Error::Timeout);
        assert_eq!(Error::from(TransportError::Bus), Error::Transport);
    }
}
