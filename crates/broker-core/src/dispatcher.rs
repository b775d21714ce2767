use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mbroker_proto::{
    Opcode, RegistrationFrame, BOXNAME_SIZE, LIST_REQUEST_SIZE, OPCODE_SIZE, PIPENAME_SIZE,
    REGISTRATION_SIZE,
};
use tracing::{error, info, warn};

use crate::error::SessionError;
use crate::queue::BoundedQueue;

/// Creates the rendezvous pipe at `path`, removing any stale one first.
///
/// Mirrors the original's `unlink` (ignoring `ENOENT`) then `mkfifo`
/// sequence: a leftover pipe from a previous crashed run must not make a
/// fresh start fail.
pub fn create_register_pipe(path: &str) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    let c_path = CString::new(path).map_err(|_| std::io::Error::from(ErrorKind::InvalidInput))?;
    // 0640: broker owner read/write, group read, matching the original's mode.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o640) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Reads registrations off the rendezvous pipe and pushes them onto the
/// work queue until told to stop.
///
/// Keeps its own write end open for the pipe's whole lifetime so a read
/// never observes EOF from "zero active writers": there is always at
/// least one, the broker itself.
pub struct Dispatcher {
    reader: File,
    _self_writer: File,
    shutdown: Arc<AtomicBool>,
}

impl Dispatcher {
    pub fn open(path: &str, shutdown: Arc<AtomicBool>) -> std::io::Result<Self> {
        let reader = OpenOptions::new().read(true).open(path)?;
        let self_writer = OpenOptions::new().write(true).open(path)?;
        Ok(Self {
            reader,
            _self_writer: self_writer,
            shutdown,
        })
    }

    /// Runs the read-decode-enqueue loop until shutdown is requested.
    /// Registration bodies that fail to decode (a short or oversized
    /// field) are logged and dropped, so one malformed client can't wedge
    /// the whole dispatcher. A byte that isn't a known opcode at all is a
    /// broken wire contract, not a malformed field, and is fatal: it stops
    /// the dispatcher and shuts the whole broker down, matching the
    /// invariant-violation policy for the rendezvous pipe.
    pub fn run(&mut self, queue: &BoundedQueue<RegistrationFrame>) {
        let mut opcode_buf = [0u8; OPCODE_SIZE];
        while !self.shutdown.load(Ordering::Relaxed) {
            match self.reader.read_exact(&mut opcode_buf) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => continue,
                Err(err) => {
                    error!(%err, "registration pipe read failed");
                    continue;
                }
            }

            match self.read_registration(opcode_buf[0]) {
                Ok(Some(registration)) => {
                    if !queue.enqueue(registration) {
                        info!("registration queue shut down, dropping registration");
                        break;
                    }
                }
                Ok(None) => continue,
                Err(err) if err.is_fatal() => {
                    warn!(%err, "unknown opcode on rendezvous pipe, shutting broker down");
                    self.shutdown.store(true, Ordering::Relaxed);
                    queue.shut_down();
                    break;
                }
                Err(err) => error!(%err, "failed to decode registration"),
            }
        }
    }

    fn read_registration(&mut self, opcode_byte: u8) -> Result<Option<RegistrationFrame>, SessionError> {
        let opcode = Opcode::from_byte(opcode_byte)?;
        let body_len = match opcode {
            Opcode::PubReg | Opcode::SubReg | Opcode::BoxCreat | Opcode::BoxRemove => {
                REGISTRATION_SIZE - OPCODE_SIZE
            }
            Opcode::BoxList => LIST_REQUEST_SIZE - OPCODE_SIZE,
            _ => return Ok(None),
        };
        debug_assert!(body_len == PIPENAME_SIZE || body_len == PIPENAME_SIZE + BOXNAME_SIZE);

        let mut body = vec![0u8; body_len];
        self.reader
            .read_exact(&mut body)
            .map_err(|source| SessionError::ClientPipeIo {
                path: "<register_pipe>".to_string(),
                source,
            })?;

        Ok(Some(RegistrationFrame::decode(opcode, &body)?))
    }
}
