//! Subscriber client: prints every message received from a box, then the
//! total count once the broker ends the session.

use std::ffi::CString;
use std::fs::OpenOptions;
use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use mbroker_proto::{decode_msg_payload, Opcode, RegistrationFrame, MSG_FRAME_SIZE};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 2 && args[1] == "--help" {
        println!("usage: sub <register_pipe> <pipe_name> <box_name>");
        return Ok(());
    }
    if args.len() != 4 {
        bail!("sub: invalid arguments.\nTry 'sub --help' for more information.");
    }
    let (register_pipe, pipe_name, box_name) = (&args[1], &args[2], &args[3]);

    create_client_pipe(pipe_name)?;

    let registration = RegistrationFrame::Subscriber {
        client_pipe: pipe_name.clone(),
        box_name: box_name.clone(),
    };
    let mut register_writer = OpenOptions::new()
        .write(true)
        .open(register_pipe)
        .with_context(|| format!("failed to open register pipe {register_pipe}"))?;
    let mut bytes = vec![registration.opcode().as_byte()];
    bytes.extend_from_slice(&registration.encode_body()?);
    register_writer.write_all(&bytes)?;
    drop(register_writer);

    let mut sub_pipe = OpenOptions::new()
        .read(true)
        .open(pipe_name)
        .with_context(|| format!("failed to open {pipe_name}"))?;

    let mut frame = [0u8; MSG_FRAME_SIZE];
    let mut msg_count = 0u32;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    loop {
        match sub_pipe.read_exact(&mut frame) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err).context("read from broker failed"),
        }
        if frame[0] != Opcode::SubMsg.as_byte() {
            bail!("internal error: invalid opcode from broker");
        }
        msg_count += 1;
        let payload = decode_msg_payload(&frame);
        out.write_all(payload)?;
        out.write_all(b"\n")?;
    }

    println!("{msg_count}");
    Ok(())
}

fn create_client_pipe(path: &str) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err).context("failed to remove stale pipe"),
    }
    let c_path = CString::new(path)?;
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o640) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error()).context("mkfifo failed");
    }
    Ok(())
}
