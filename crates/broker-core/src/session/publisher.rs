use std::fs::OpenOptions;
use std::io::{ErrorKind, Read};

use mbroker_proto::{decode_msg_payload, Opcode, MSG_FRAME_SIZE};
use mbroker_store::{OpenMode, PublisherHandle};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::registry::BoxRegistry;
use crate::session::clean_outcome;

/// Runs a publisher's session end to end: attaches to the box, relays
/// every `PUB_MSG` frame until the client closes its pipe, then detaches.
///
/// Returns `Ok(())` for every outcome that isn't a broker-side I/O
/// failure, including "box doesn't exist" and "box already has a
/// publisher" -- those are valid session outcomes, not broker errors.
///
/// `registry.close_publisher(handle)` always runs once a handle has been
/// attached, no matter how `stream_publish` below ends, so a fatal
/// mid-stream error (an unrecognized opcode) still releases the
/// publisher count instead of leaking it.
pub fn run(registry: &BoxRegistry, client_pipe: &str, box_name: &str) -> Result<(), SessionError> {
    let mut reader = match OpenOptions::new().read(true).open(client_pipe) {
        Ok(reader) => reader,
        Err(source) => {
            return clean_outcome(Err(SessionError::ClientPipeOpen {
                path: client_pipe.to_string(),
                source,
            }));
        }
    };

    let handle = match registry.open_publisher(box_name, OpenMode::Append) {
        Ok(handle) => handle,
        Err(err) => {
            info!(box_name, %err, "publisher registration rejected");
            return Ok(());
        }
    };

    let result = stream_publish(registry, &handle, &mut reader, client_pipe, box_name);
    registry.close_publisher(handle);
    clean_outcome(result)
}

fn stream_publish(
    registry: &BoxRegistry,
    handle: &PublisherHandle,
    reader: &mut impl Read,
    client_pipe: &str,
    box_name: &str,
) -> Result<(), SessionError> {
    let mut frame = [0u8; MSG_FRAME_SIZE];
    loop {
        match reader.read_exact(&mut frame) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(source) => {
                return Err(SessionError::ClientPipeIo {
                    path: client_pipe.to_string(),
                    source,
                });
            }
        }

        let opcode = Opcode::from_byte(frame[0])?;
        if opcode != Opcode::PubMsg {
            return Err(SessionError::Protocol(mbroker_proto::ProtoError::UnknownOpcode(
                frame[0],
            )));
        }

        let mut framed = decode_msg_payload(&frame).to_vec();
        framed.push(0);
        let written = registry.write(handle, &framed)?;
        if written < framed.len() {
            debug!(box_name, "box is full, ending publisher session");
            break;
        }
    }
    Ok(())
}
