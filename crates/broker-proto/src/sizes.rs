//! Fixed sizes shared by every frame on the wire.

/// Size of a single opcode byte.
pub const OPCODE_SIZE: usize = 1;
/// Maximum length of a client pipe path, NUL-padded.
pub const PIPENAME_SIZE: usize = 256;
/// Maximum length of a box name, NUL-padded.
pub const BOXNAME_SIZE: usize = 32;
/// Maximum payload length of a pub/sub message, NUL-terminated within.
pub const MSG_MAX_SIZE: usize = 1024;
/// Length of a manager error message buffer.
pub const ERROR_MSG_SIZE: usize = 1024;
/// Hard capacity of a box's backing byte-log.
pub const BOX_SIZE: usize = 1024;
/// Maximum number of live boxes the registry can hold.
pub const MAX_N_BOXES: usize = 23;
/// Size of a manager return code (signed, wire-stable width).
pub const RETURN_CODE_SIZE: usize = 4;
/// Size of the "last" flag in a box-list response frame.
pub const LAST_SIZE: usize = 1;

/// `[opcode][pipe_path][box_name]` registration frame size.
pub const REGISTRATION_SIZE: usize = OPCODE_SIZE + PIPENAME_SIZE + BOXNAME_SIZE;
/// `[opcode][pipe_path]` list-request frame size (no box name).
pub const LIST_REQUEST_SIZE: usize = OPCODE_SIZE + PIPENAME_SIZE;
/// `[opcode][payload]` pub/sub message frame size.
pub const MSG_FRAME_SIZE: usize = OPCODE_SIZE + MSG_MAX_SIZE;
