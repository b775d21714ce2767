use crate::error::ProtoError;

/// The ten wire opcodes, one byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    PubReg = 1,
    SubReg = 2,
    BoxCreat = 3,
    ResBoxCreat = 4,
    BoxRemove = 5,
    ResBoxRemove = 6,
    BoxList = 7,
    ResBoxList = 8,
    PubMsg = 9,
    SubMsg = 10,
}

impl Opcode {
    /// Decodes a raw byte read off the wire into a known opcode.
    ///
    /// Any other value is an invariant violation in the peer, and the
    /// caller should treat it as fatal, not recoverable.
    pub fn from_byte(byte: u8) -> Result<Self, ProtoError> {
        match byte {
            1 => Ok(Self::PubReg),
            2 => Ok(Self::SubReg),
            3 => Ok(Self::BoxCreat),
            4 => Ok(Self::ResBoxCreat),
            5 => Ok(Self::BoxRemove),
            6 => Ok(Self::ResBoxRemove),
            7 => Ok(Self::BoxList),
            8 => Ok(Self::ResBoxList),
            9 => Ok(Self::PubMsg),
            10 => Ok(Self::SubMsg),
            other => Err(ProtoError::UnknownOpcode(other)),
        }
    }

    #[inline]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_opcode() {
        for byte in 1..=10u8 {
            let op = Opcode::from_byte(byte).unwrap();
            assert_eq!(op.as_byte(), byte);
        }
    }

    #[test]
    fn rejects_unknown_opcode() {
        assert!(matches!(
            Opcode::from_byte(0),
            Err(ProtoError::UnknownOpcode(0))
        ));
        assert!(matches!(
            Opcode::from_byte(11),
            Err(ProtoError::UnknownOpcode(11))
        ));
    }
}
