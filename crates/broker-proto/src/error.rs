use thiserror::Error;

/// Errors produced while decoding or constructing wire frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtoError {
    /// A byte on the wire did not match any known opcode: an invariant
    /// violation in the peer, not a recoverable condition.
    #[error("unknown opcode byte: {0}")]
    UnknownOpcode(u8),
    /// A path or name exceeded its fixed wire width.
    #[error("field too long: {field} exceeds {max} bytes")]
    FieldTooLong { field: &'static str, max: usize },
    /// A fixed-size buffer read off the wire was short.
    #[error("short frame: expected {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },
}
