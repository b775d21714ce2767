//! End-to-end scenarios driving the session state machines over real
//! named pipes, the way a publisher/subscriber/manager client would.

use std::ffi::CString;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use mbroker_core::{handle_registration, BoxRegistry};
use mbroker_proto::{
    decode_msg_payload, encode_msg_frame, ManagerResponseFrame, Opcode, RegistrationFrame,
    MSG_FRAME_SIZE,
};

fn mkfifo(path: &std::path::Path) {
    let c_path = CString::new(path.to_str().unwrap()).unwrap();
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    assert_eq!(rc, 0, "mkfifo failed for {path:?}");
}

fn registry() -> Arc<BoxRegistry> {
    Arc::new(BoxRegistry::new(Duration::from_millis(20)))
}

#[test]
fn publisher_then_subscriber_see_messages_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    registry.create("/weather").unwrap();

    let pub_pipe = dir.path().join("pub.pipe");
    let sub_pipe = dir.path().join("sub.pipe");
    mkfifo(&pub_pipe);
    mkfifo(&sub_pipe);

    let worker_registry = Arc::clone(&registry);
    let pub_pipe_session = pub_pipe.clone();
    let pub_session = std::thread::spawn(move || {
        handle_registration(
            &worker_registry,
            RegistrationFrame::Publisher {
                client_pipe: pub_pipe_session.to_str().unwrap().to_string(),
                box_name: "/weather".to_string(),
            },
        )
        .unwrap();
    });

    let mut pub_writer = OpenOptions::new().write(true).open(&pub_pipe).unwrap();
    for msg in ["sunny", "cloudy"] {
        pub_writer
            .write_all(&encode_msg_frame(Opcode::PubMsg, msg.as_bytes()))
            .unwrap();
    }
    drop(pub_writer);
    pub_session.join().unwrap();

    let worker_registry = Arc::clone(&registry);
    let sub_pipe_session = sub_pipe.clone();
    let sub_session = std::thread::spawn(move || {
        handle_registration(
            &worker_registry,
            RegistrationFrame::Subscriber {
                client_pipe: sub_pipe_session.to_str().unwrap().to_string(),
                box_name: "/weather".to_string(),
            },
        )
        .unwrap();
    });

    let mut sub_reader = OpenOptions::new().read(true).open(&sub_pipe).unwrap();
    let mut received = Vec::new();
    let mut frame = [0u8; MSG_FRAME_SIZE];
    for _ in 0..2 {
        sub_reader.read_exact(&mut frame).unwrap();
        received.push(decode_msg_payload(&frame).to_vec());
    }

    registry.remove("/weather").unwrap();
    sub_session.join().unwrap();

    assert_eq!(received, vec![b"sunny".to_vec(), b"cloudy".to_vec()]);
}

#[test]
fn second_publisher_is_rejected_while_first_is_attached() {
    let registry = registry();
    registry.create("/one-writer").unwrap();

    let first = registry
        .open_publisher("/one-writer", mbroker_store::OpenMode::Append)
        .unwrap();
    let second = registry.open_publisher("/one-writer", mbroker_store::OpenMode::Append);
    assert!(second.is_err());

    registry.close_publisher(first);
    let retried = registry.open_publisher("/one-writer", mbroker_store::OpenMode::Append);
    assert!(retried.is_ok());
}

#[test]
fn box_create_response_reports_already_exists() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    registry.create("/dup").unwrap();

    let man_pipe = dir.path().join("manager.pipe");
    mkfifo(&man_pipe);

    let worker_registry = Arc::clone(&registry);
    let man_pipe_session = man_pipe.clone();
    let session = std::thread::spawn(move || {
        handle_registration(
            &worker_registry,
            RegistrationFrame::BoxCreate {
                client_pipe: man_pipe_session.to_str().unwrap().to_string(),
                box_name: "/dup".to_string(),
            },
        )
        .unwrap();
    });

    let mut reader = OpenOptions::new().read(true).open(&man_pipe).unwrap();
    let mut opcode = [0u8; 1];
    reader.read_exact(&mut opcode).unwrap();
    let mut return_code = [0u8; 4];
    reader.read_exact(&mut return_code).unwrap();
    let mut error_msg = [0u8; mbroker_proto::ERROR_MSG_SIZE];
    reader.read_exact(&mut error_msg).unwrap();
    session.join().unwrap();

    assert_eq!(opcode[0], Opcode::ResBoxCreat.as_byte());
    assert_eq!(i32::from_ne_bytes(return_code), -1);
    let end = error_msg.iter().position(|&b| b == 0).unwrap();
    assert_eq!(&error_msg[..end], b"Box already exists.");

    let _ = ManagerResponseFrame::ok(Opcode::ResBoxCreat);
}

#[test]
fn publisher_sending_an_unknown_opcode_is_a_fatal_session_error() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    registry.create("/bad").unwrap();

    let pub_pipe = dir.path().join("bad.pipe");
    mkfifo(&pub_pipe);

    let worker_registry = Arc::clone(&registry);
    let pub_pipe_session = pub_pipe.clone();
    let session = std::thread::spawn(move || {
        handle_registration(
            &worker_registry,
            RegistrationFrame::Publisher {
                client_pipe: pub_pipe_session.to_str().unwrap().to_string(),
                box_name: "/bad".to_string(),
            },
        )
    });

    let mut writer = OpenOptions::new().write(true).open(&pub_pipe).unwrap();
    let mut bogus_frame = [0u8; MSG_FRAME_SIZE];
    bogus_frame[0] = Opcode::SubMsg.as_byte();
    writer.write_all(&bogus_frame).unwrap();
    drop(writer);

    let result = session.join().unwrap();
    let err = result.expect_err("an unrecognized opcode must end the session with an error");
    assert!(err.is_fatal(), "unknown opcode on a session pipe must be fatal: {err}");
}

#[test]
fn listing_an_empty_registry_sends_no_frames() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();

    let man_pipe = dir.path().join("manager.pipe");
    mkfifo(&man_pipe);

    let worker_registry = Arc::clone(&registry);
    let man_pipe_session = man_pipe.clone();
    let session = std::thread::spawn(move || {
        handle_registration(
            &worker_registry,
            RegistrationFrame::BoxList {
                client_pipe: man_pipe_session.to_str().unwrap().to_string(),
            },
        )
        .unwrap();
    });

    let mut reader = OpenOptions::new().read(true).open(&man_pipe).unwrap();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).unwrap();
    session.join().unwrap();

    assert!(buf.is_empty());
}
