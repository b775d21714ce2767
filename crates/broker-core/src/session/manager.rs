use std::fs::OpenOptions;
use std::io::Write;

use mbroker_proto::{BoxRecord, ListResponseFrame, ManagerResponseFrame, Opcode};
use mbroker_store::StoreError;

use crate::error::SessionError;
use crate::registry::BoxRegistry;
use crate::session::clean_outcome;

fn open_manager_pipe(client_pipe: &str) -> Result<std::fs::File, SessionError> {
    OpenOptions::new()
        .write(true)
        .open(client_pipe)
        .map_err(|source| SessionError::ClientPipeOpen {
            path: client_pipe.to_string(),
            source,
        })
}

fn write_all(writer: &mut impl Write, bytes: &[u8], client_pipe: &str) -> Result<(), SessionError> {
    writer
        .write_all(bytes)
        .map_err(|source| SessionError::ClientPipeIo {
            path: client_pipe.to_string(),
            source,
        })
}

/// Handles `BOX_CREAT`: create the box, then report success or a
/// human-readable failure reason the manager CLI prints verbatim.
///
/// `ENOENT` opening the manager's pipe and `EPIPE` on the response write
/// are both tolerated per spec.md §4.4.3/§7: `clean_outcome` downgrades
/// them to `Ok(())` rather than letting them surface as session failures.
pub fn run_create(
    registry: &BoxRegistry,
    client_pipe: &str,
    box_name: &str,
) -> Result<(), SessionError> {
    clean_outcome(run_create_inner(registry, client_pipe, box_name))
}

fn run_create_inner(
    registry: &BoxRegistry,
    client_pipe: &str,
    box_name: &str,
) -> Result<(), SessionError> {
    let mut writer = open_manager_pipe(client_pipe)?;
    let response = match registry.create(box_name) {
        Ok(()) => ManagerResponseFrame::ok(Opcode::ResBoxCreat),
        Err(StoreError::AlreadyExists) => {
            ManagerResponseFrame::err(Opcode::ResBoxCreat, "Box already exists.")
        }
        Err(_) => ManagerResponseFrame::err(Opcode::ResBoxCreat, "Couldn't create box."),
    };
    write_all(&mut writer, &response.encode()?, client_pipe)
}

/// Handles `BOX_REMOVE`: remove the box, then report success or a
/// human-readable failure reason. Same tolerance for a gone manager pipe
/// as `run_create`.
pub fn run_remove(
    registry: &BoxRegistry,
    client_pipe: &str,
    box_name: &str,
) -> Result<(), SessionError> {
    clean_outcome(run_remove_inner(registry, client_pipe, box_name))
}

fn run_remove_inner(
    registry: &BoxRegistry,
    client_pipe: &str,
    box_name: &str,
) -> Result<(), SessionError> {
    let mut writer = open_manager_pipe(client_pipe)?;
    let response = match registry.remove(box_name) {
        Ok(()) => ManagerResponseFrame::ok(Opcode::ResBoxRemove),
        Err(StoreError::NotFound) => {
            ManagerResponseFrame::err(Opcode::ResBoxRemove, "Box doesn't exist.")
        }
        Err(_) => ManagerResponseFrame::err(Opcode::ResBoxRemove, "Couldn't remove box."),
    };
    write_all(&mut writer, &response.encode()?, client_pipe)
}

/// Handles `BOX_LIST`: streams one frame per live box with the `last`
/// flag set on the final one. Sends nothing at all if no boxes exist,
/// matching the original's silent, frame-less response to an empty
/// registry -- the manager CLI infers "no boxes" from reaching EOF
/// without having received any frame. A manager pipe that vanishes or
/// breaks mid-listing (spec.md §4.4.5: "Broken-pipe is tolerated") ends
/// the session cleanly via `clean_outcome` rather than as a failure.
pub fn run_list(registry: &BoxRegistry, client_pipe: &str) -> Result<(), SessionError> {
    clean_outcome(run_list_inner(registry, client_pipe))
}

fn run_list_inner(registry: &BoxRegistry, client_pipe: &str) -> Result<(), SessionError> {
    let mut writer = open_manager_pipe(client_pipe)?;
    let mut boxes = registry.list();
    let Some(last) = boxes.len().checked_sub(1) else {
        return Ok(());
    };

    for (i, snapshot) in boxes.drain(..).enumerate() {
        let frame = ListResponseFrame {
            last: i == last,
            record: BoxRecord {
                name: snapshot.name,
                size: snapshot.size,
                n_publishers: snapshot.n_publishers,
                n_subscribers: snapshot.n_subscribers,
            },
        };
        write_all(&mut writer, &frame.encode()?, client_pipe)?;
    }
    Ok(())
}
