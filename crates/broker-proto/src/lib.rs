//! Wire protocol for the mbroker publish/subscribe broker.
//!
//! Every frame exchanged between clients and the broker over named-pipe IPC
//! is a fixed-size, bit-exact layout. This crate owns that layout and
//! nothing else: no I/O, no locking, no session logic.

mod error;
mod frame;
mod opcode;
mod sizes;

pub use error::ProtoError;
pub use frame::{BoxRecord, ListResponseFrame, ManagerResponseFrame, RegistrationFrame};
pub use opcode::Opcode;
pub use sizes::{
    BOXNAME_SIZE, BOX_SIZE, ERROR_MSG_SIZE, LAST_SIZE, LIST_REQUEST_SIZE, MAX_N_BOXES,
    MSG_FRAME_SIZE, MSG_MAX_SIZE, OPCODE_SIZE, PIPENAME_SIZE, REGISTRATION_SIZE,
    RETURN_CODE_SIZE,
};
