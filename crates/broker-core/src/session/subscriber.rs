use std::fs::OpenOptions;
use std::io::Write;

use mbroker_proto::{encode_msg_frame, Opcode, MSG_MAX_SIZE};
use mbroker_store::SubscriberHandle;
use tracing::info;

use crate::error::SessionError;
use crate::registry::BoxRegistry;
use crate::session::clean_outcome;

/// Runs a subscriber's session: attaches to the box, forwards every
/// complete (NUL-terminated) message a publisher has appended since
/// attach time, and stops once the box goes away.
///
/// A final partial message with no terminator (the box filled up
/// mid-write) is still forwarded, matching the boundary the store
/// actually captured rather than waiting forever for a byte that will
/// never arrive.
///
/// `registry.close_subscriber(handle)` always runs once a handle has
/// been attached, no matter how `stream_messages` below ends -- a
/// disconnected client (`EPIPE` on write) must still release its
/// subscriber count, or that count leaks and corrupts every later
/// `BOX_LIST` for this box.
pub fn run(registry: &BoxRegistry, client_pipe: &str, box_name: &str) -> Result<(), SessionError> {
    let mut writer = match OpenOptions::new().write(true).open(client_pipe) {
        Ok(writer) => writer,
        Err(source) => {
            return clean_outcome(Err(SessionError::ClientPipeOpen {
                path: client_pipe.to_string(),
                source,
            }));
        }
    };

    let mut handle = match registry.open_subscriber(box_name) {
        Ok(handle) => handle,
        Err(err) => {
            info!(box_name, %err, "subscriber registration rejected");
            return Ok(());
        }
    };

    let result = stream_messages(registry, &mut handle, &mut writer, client_pipe);
    registry.close_subscriber(handle);
    clean_outcome(result)
}

fn stream_messages(
    registry: &BoxRegistry,
    handle: &mut SubscriberHandle,
    writer: &mut impl Write,
    client_pipe: &str,
) -> Result<(), SessionError> {
    let mut pending = Vec::new();
    let mut read_buf = [0u8; MSG_MAX_SIZE];

    loop {
        let n = registry.read_blocking(handle, &mut read_buf)?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&read_buf[..n]);
        flush_complete_messages(&mut pending, writer, client_pipe)?;
    }

    if !pending.is_empty() {
        send_message(&pending, writer, client_pipe)?;
    }

    Ok(())
}

fn flush_complete_messages(
    pending: &mut Vec<u8>,
    writer: &mut impl Write,
    client_pipe: &str,
) -> Result<(), SessionError> {
    while let Some(pos) = pending.iter().position(|&b| b == 0) {
        let message: Vec<u8> = pending.drain(..=pos).collect();
        send_message(&message[..message.len() - 1], writer, client_pipe)?;
    }
    Ok(())
}

fn send_message(
    message: &[u8],
    writer: &mut impl Write,
    client_pipe: &str,
) -> Result<(), SessionError> {
    let frame = encode_msg_frame(Opcode::SubMsg, message);
    writer
        .write_all(&frame)
        .map_err(|source| SessionError::ClientPipeIo {
            path: client_pipe.to_string(),
            source,
        })
}
