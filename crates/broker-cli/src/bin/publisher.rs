//! Publisher client: reads lines from stdin and forwards each as a
//! message to a box, truncating any line that doesn't fit.

use std::ffi::CString;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use mbroker_proto::{encode_msg_frame, Opcode, RegistrationFrame};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 2 && args[1] == "--help" {
        println!("usage: pub <register_pipe> <pipe_name> <box_name>");
        return Ok(());
    }
    if args.len() != 4 {
        bail!("pub: invalid arguments.\nTry 'pub --help' for more information.");
    }
    let (register_pipe, pipe_name, box_name) = (&args[1], &args[2], &args[3]);

    create_client_pipe(pipe_name)?;

    let registration = RegistrationFrame::Publisher {
        client_pipe: pipe_name.clone(),
        box_name: box_name.clone(),
    };
    let mut register_writer = OpenOptions::new()
        .write(true)
        .open(register_pipe)
        .with_context(|| format!("failed to open register pipe {register_pipe}"))?;
    send_registration(&mut register_writer, &registration)?;
    drop(register_writer);

    let mut pub_pipe = OpenOptions::new()
        .write(true)
        .open(pipe_name)
        .with_context(|| format!("failed to open {pipe_name}"))?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        // Truncation happens on raw bytes inside `encode_msg_frame`, not
        // here: cutting the `String` itself at a byte offset would panic
        // if that offset landed mid multi-byte character, which a long
        // line full of non-ASCII text can easily hit.
        let frame = encode_msg_frame(Opcode::PubMsg, line.as_bytes());
        pub_pipe.write_all(&frame).context("write to broker failed")?;
    }

    Ok(())
}

fn send_registration(writer: &mut impl Write, registration: &RegistrationFrame) -> Result<()> {
    let mut bytes = vec![registration.opcode().as_byte()];
    bytes.extend_from_slice(&registration.encode_body()?);
    writer.write_all(&bytes)?;
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
