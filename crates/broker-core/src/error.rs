use thiserror::Error;

use mbroker_proto::ProtoError;
use mbroker_store::StoreError;

/// Errors that can end a session.
///
/// Most client-facing failures (box missing, publisher already taken) are
/// not modeled here: they're valid outcomes sent back over the wire or
/// silently dropped, mirroring the original broker's fire-and-forget
/// registration handling. This type covers conditions where the broker
/// itself cannot continue safely.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The client's named pipe could not be opened for I/O.
    #[error("failed to open client pipe {path}: {source}")]
    ClientPipeOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A read or write against the client pipe failed outright (not a
    /// clean close).
    #[error("I/O error on client pipe {path}: {source}")]
    ClientPipeIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A frame read off a client pipe didn't decode.
    #[error("malformed frame from client: {0}")]
    Protocol(#[from] ProtoError),
    /// The store rejected an operation the session state machine assumed
    /// would succeed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// True for errors that represent a protocol invariant violated by a
    /// peer (an unrecognized opcode), which the broker treats as fatal
    /// rather than a session-local failure: `ENOENT`/`EPIPE` end just the
    /// one session, but a peer sending a byte that isn't a known opcode
    /// means the wire contract itself is broken.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Protocol(ProtoError::UnknownOpcode(_)))
    }

    /// True for the "client gone" conditions spec.md §7 classifies as
    /// ending a session cleanly rather than as a broker-level failure:
    /// `ENOENT` opening the client's pipe, or a broken-pipe write once
    /// it's open. Callers downgrade these to `Ok(())` after running
    /// whatever cleanup (closing a store handle) the session still owes.
    pub fn is_client_gone(&self) -> bool {
        match self {
            Self::ClientPipeOpen { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::ClientPipeIo { source, .. } => source.kind() == std::io::ErrorKind::BrokenPipe,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_err(kind: std::io::ErrorKind) -> std::io::Error {
        std::io::Error::from(kind)
    }

    #[test]
    fn only_unknown_opcode_is_fatal() {
        assert!(SessionError::Protocol(ProtoError::UnknownOpcode(99)).is_fatal());
        assert!(!SessionError::Store(StoreError::NotFound).is_fatal());
        assert!(!SessionError::Protocol(ProtoError::ShortFrame { expected: 4, actual: 1 })
            .is_fatal());
    }

    #[test]
    fn client_gone_covers_enoent_open_and_broken_pipe_write() {
        assert!(SessionError::ClientPipeOpen {
            path: "/tmp/x".to_string(),
            source: io_err(std::io::ErrorKind::NotFound),
        }
        .is_client_gone());
        assert!(SessionError::ClientPipeIo {
            path: "/tmp/x".to_string(),
            source: io_err(std::io::ErrorKind::BrokenPipe),
        }
        .is_client_gone());
        assert!(!SessionError::ClientPipeOpen {
            path: "/tmp/x".to_string(),
            source: io_err(std::io::ErrorKind::PermissionDenied),
        }
        .is_client_gone());
        assert!(!SessionError::Store(StoreError::NotFound).is_client_gone());
    }
}

/// Errors from the bounded registration queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// `try_enqueue` found the queue full.
    #[error("registration queue is full")]
    Full,
    /// The queue has been shut down; no more items will be produced.
    #[error("registration queue is shut down")]
    ShutDown,
}
