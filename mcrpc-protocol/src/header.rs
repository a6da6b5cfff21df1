//! Header packet payloads
//!
//! Header frames announce what follows:
//! - Command header: `[rpc_id: u32 LE][payload_len: u32 LE]`
//! - Result header: `[payload_len: u32 LE]`

use crate::error::FrameError;

/// Payload of a command-header frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandHeader {
    /// Which registered callback to run
    pub rpc_id: u32,
    /// Length of the command-data frame that follows (0 = none)
    pub payload_len: u32,
}

impl CommandHeader {
    /// Encoded size in bytes
    pub const SIZE: usize = 8;

    /// Encode into wire bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let id = self.rpc_id.to_le_bytes();
        let len = self.payload_len.to_le_bytes();
        [id[0], id[1], id[2], id[3], len[0], len[1], len[2], len[3]]
    }

    /// Parse from a received header payload
    pub fn from_bytes(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() != Self::SIZE {
            return Err(FrameError::Malformed);
        }
        Ok(Self {
            rpc_id: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
            payload_len: u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]),
        })
    }
}

/// Payload of a result-header frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResultHeader {
    /// Length of the result-data frame that follows (0 = none)
    pub payload_len: u32,
}

impl ResultHeader {
    /// Encoded size in bytes
    pub const SIZE: usize = 4;

    /// Encode into wire bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.payload_len.to_le_bytes()
    }

    /// Parse from a received header payload
    pub fn from_bytes(payload: &[u8]) -> Result<Self, FrameError> {
        let bytes: [u8; Self::SIZE] = payload.try_into().map_err(|_| FrameError::Malformed)?;
        Ok(Self {
            payload_len: u32::from_le_bytes(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_header_layout() {
        let header = CommandHeader {
            rpc_id: 7,
            payload_len: 2,
        };
        assert_eq!(header.to_bytes(), [7, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(CommandHeader::from_bytes(&header.to_bytes()), Ok(header));
    }

    #[test]
    fn test_command_header_wrong_size() {
        assert_eq!(
            CommandHeader::from_bytes(&[0u8; 7]),
            Err(FrameError::Malformed)
        );
    }

    #[test]
    fn test_result_header() {
        let header = ResultHeader { payload_len: 0x0102 };
        assert_eq!(header.to_bytes(), [0x02, 0x01, 0, 0]);
        assert_eq!(ResultHeader::from_bytes(&[0x02, 0x01, 0, 0]), Ok(header));
        assert_eq!(ResultHeader::from_bytes(&[0; 5]), Err(FrameError::Malformed));
    }
}
