//! Manager client: creates/removes boxes and lists the registry.

use std::ffi::CString;
use std::fs::OpenOptions;
use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use mbroker_proto::{BoxRecord, Opcode, RegistrationFrame, ERROR_MSG_SIZE, LAST_SIZE};

fn print_usage() {
    eprintln!("usage:");
    eprintln!("  manager <register_pipe> <pipe_name> create <box_name>");
    eprintln!("  manager <register_pipe> <pipe_name> remove <box_name>");
    eprintln!("  manager <register_pipe> <pipe_name> list");
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 2 && args[1] == "--help" {
        print_usage();
        return Ok(());
    }

    let valid = match args.len() {
        4 => args[3] == "list",
        5 => args[3] == "create" || args[3] == "remove",
        _ => false,
    };
    if !valid {
        print_usage();
        bail!("manager: invalid arguments.");
    }

    let register_pipe = &args[1];
    let pipe_name = &args[2];

    let registration = if args.len() == 4 {
        RegistrationFrame::BoxList { client_pipe: pipe_name.clone() }
    } else if args[3] == "create" {
        RegistrationFrame::BoxCreate { client_pipe: pipe_name.clone(), box_name: args[4].clone() }
    } else {
        RegistrationFrame::BoxRemove { client_pipe: pipe_name.clone(), box_name: args[4].clone() }
    };

    create_client_pipe(pipe_name)?;

    let mut register_writer = OpenOptions::new()
        .write(true)
        .open(register_pipe)
        .with_context(|| format!("failed to open register pipe {register_pipe}"))?;
    let mut bytes = vec![registration.opcode().as_byte()];
    bytes.extend_from_slice(&registration.encode_body()?);
    register_writer.write_all(&bytes)?;
    drop(register_writer);

    let mut reader = OpenOptions::new()
        .read(true)
        .open(pipe_name)
        .with_context(|| format!("failed to open {pipe_name}"))?;

    let mut opcode_buf = [0u8; 1];
    match reader.read_exact(&mut opcode_buf) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
            println!("NO BOXES FOUND");
            return Ok(());
        }
        Err(err) => return Err(err).context("read from broker failed"),
    }

    let opcode = Opcode::from_byte(opcode_buf[0]).context("invalid opcode from broker")?;
    match opcode {
        Opcode::ResBoxCreat | Opcode::ResBoxRemove => print_manager_response(&mut reader),
        Opcode::ResBoxList => print_box_listing(&mut reader, opcode_buf[0]),
        _ => bail!("internal error: invalid opcode from broker"),
    }
}

fn print_manager_response(reader: &mut impl Read) -> Result<()> {
    let mut return_code = [0u8; 4];
    reader.read_exact(&mut return_code)?;
    if i32::from_ne_bytes(return_code) == -1 {
        let mut error_msg = [0u8; ERROR_MSG_SIZE];
        reader.read_exact(&mut error_msg)?;
        let end = error_msg.iter().position(|&b| b == 0).unwrap_or(ERROR_MSG_SIZE);
        println!("ERROR: {}", String::from_utf8_lossy(&error_msg[..end]));
    } else {
        println!("OK");
    }
    Ok(())
}

fn print_box_listing(reader: &mut impl Read, first_opcode: u8) -> Result<()> {
    let mut boxes = Vec::new();
    let mut opcode = first_opcode;
    loop {
        if Opcode::from_byte(opcode)? != Opcode::ResBoxList {
            bail!("internal error: invalid opcode from broker");
        }
        let mut last_buf = [0u8; LAST_SIZE];
        reader.read_exact(&mut last_buf)?;
        let mut record_buf = [0u8; BoxRecord::ENCODED_SIZE];
        reader.read_exact(&mut record_buf)?;
        boxes.push(BoxRecord::decode(&record_buf));

        if last_buf[0] != 0 {
            break;
        }
        let mut next_opcode = [0u8; 1];
        reader.read_exact(&mut next_opcode)?;
        opcode = next_opcode[0];
    }

    boxes.sort_by(|a, b| a.name.cmp(&b.name));
    for b in &boxes {
        println!("{} {} {} {}", b.name, b.size, b.n_publishers, b.n_subscribers);
    }
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
