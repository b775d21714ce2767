use crate::error::ProtoError;
use crate::opcode::Opcode;
use crate::sizes::{
    BOXNAME_SIZE, ERROR_MSG_SIZE, MSG_MAX_SIZE, PIPENAME_SIZE, RETURN_CODE_SIZE,
};

/// Copies `s` into a fixed-size NUL-padded buffer, erroring if it doesn't fit.
///
/// `N` includes the terminating NUL, matching the C layout's `strcpy` into a
/// buffer of that width.
fn pack_fixed<const N: usize>(s: &str, field: &'static str) -> Result<[u8; N], ProtoError> {
    let bytes = s.as_bytes();
    if bytes.len() >= N {
        return Err(ProtoError::FieldTooLong { field, max: N - 1 });
    }
    let mut buf = [0u8; N];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(buf)
}

/// Reads a NUL-terminated (or fully-occupied) string out of a fixed buffer.
fn unpack_fixed<const N: usize>(buf: &[u8; N]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(N);
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// A registration sent by a client over the rendezvous pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationFrame {
    Publisher { client_pipe: String, box_name: String },
    Subscriber { client_pipe: String, box_name: String },
    BoxCreate { client_pipe: String, box_name: String },
    BoxRemove { client_pipe: String, box_name: String },
    BoxList { client_pipe: String },
}

impl RegistrationFrame {
    /// Encodes everything after the opcode byte, i.e. the body the
    /// dispatcher still has to read once it knows the opcode.
    pub fn encode_body(&self) -> Result<Vec<u8>, ProtoError> {
        match self {
            Self::Publisher { client_pipe, box_name }
            | Self::Subscriber { client_pipe, box_name }
            | Self::BoxCreate { client_pipe, box_name }
            | Self::BoxRemove { client_pipe, box_name } => {
                let pipe: [u8; PIPENAME_SIZE] = pack_fixed(client_pipe, "client_pipe")?;
                let name: [u8; BOXNAME_SIZE] = pack_fixed(box_name, "box_name")?;
                let mut out = Vec::with_capacity(PIPENAME_SIZE + BOXNAME_SIZE);
                out.extend_from_slice(&pipe);
                out.extend_from_slice(&name);
                Ok(out)
            }
            Self::BoxList { client_pipe } => {
                let pipe: [u8; PIPENAME_SIZE] = pack_fixed(client_pipe, "client_pipe")?;
                Ok(pipe.to_vec())
            }
        }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Publisher { .. } => Opcode::PubReg,
            Self::Subscriber { .. } => Opcode::SubReg,
            Self::BoxCreate { .. } => Opcode::BoxCreat,
            Self::BoxRemove { .. } => Opcode::BoxRemove,
            Self::BoxList { .. } => Opcode::BoxList,
        }
    }

    /// Decodes a registration body given its already-read opcode.
    ///
    /// `body` must be exactly `PIPENAME_SIZE + BOXNAME_SIZE` bytes for the
    /// pub/sub/create/remove opcodes, or `PIPENAME_SIZE` for list.
    pub fn decode(opcode: Opcode, body: &[u8]) -> Result<Self, ProtoError> {
        match opcode {
            Opcode::PubReg | Opcode::SubReg | Opcode::BoxCreat | Opcode::BoxRemove => {
                let expected = PIPENAME_SIZE + BOXNAME_SIZE;
                if body.len() != expected {
                    return Err(ProtoError::ShortFrame { expected, actual: body.len() });
                }
                let mut pipe = [0u8; PIPENAME_SIZE];
                pipe.copy_from_slice(&body[..PIPENAME_SIZE]);
                let mut name = [0u8; BOXNAME_SIZE];
                name.copy_from_slice(&body[PIPENAME_SIZE..expected]);
                let client_pipe = unpack_fixed(&pipe);
                let box_name = unpack_fixed(&name);
                Ok(match opcode {
                    Opcode::PubReg => Self::Publisher { client_pipe, box_name },
                    Opcode::SubReg => Self::Subscriber { client_pipe, box_name },
                    Opcode::BoxCreat => Self::BoxCreate { client_pipe, box_name },
                    Opcode::BoxRemove => Self::BoxRemove { client_pipe, box_name },
                    _ => unreachable!(),
                })
            }
            Opcode::BoxList => {
                if body.len() != PIPENAME_SIZE {
                    return Err(ProtoError::ShortFrame {
                        expected: PIPENAME_SIZE,
                        actual: body.len(),
                    });
                }
                let mut pipe = [0u8; PIPENAME_SIZE];
                pipe.copy_from_slice(body);
                Ok(Self::BoxList { client_pipe: unpack_fixed(&pipe) })
            }
            other => Err(ProtoError::UnknownOpcode(other.as_byte())),
        }
    }
}

/// Encodes a pub/sub message payload into the fixed `[opcode][payload]`
/// frame shared by `PUB_MSG` and `SUB_MSG`.
///
/// `msg` is truncated to `MSG_MAX_SIZE - 1` bytes so the terminating NUL
/// always fits, matching the publisher CLI's line-truncation behavior.
pub fn encode_msg_frame(opcode: Opcode, msg: &[u8]) -> [u8; crate::sizes::MSG_FRAME_SIZE] {
    let mut out = [0u8; crate::sizes::MSG_FRAME_SIZE];
    out[0] = opcode.as_byte();
    let n = msg.len().min(MSG_MAX_SIZE - 1);
    out[1..1 + n].copy_from_slice(&msg[..n]);
    out
}

/// Decodes a `[opcode][payload]` message frame's zero-terminated payload.
pub fn decode_msg_payload(frame: &[u8; crate::sizes::MSG_FRAME_SIZE]) -> &[u8] {
    let payload = &frame[1..];
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    &payload[..end]
}

/// A `RES_BOX_CREAT` / `RES_BOX_REMOVE` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerResponseFrame {
    pub opcode: Opcode,
    pub return_code: i32,
    pub error_msg: Option<String>,
}

impl ManagerResponseFrame {
    pub fn ok(opcode: Opcode) -> Self {
        Self { opcode, return_code: 0, error_msg: None }
    }

    pub fn err(opcode: Opcode, message: impl Into<String>) -> Self {
        Self { opcode, return_code: -1, error_msg: Some(message.into()) }
    }

    /// Encodes `[opcode][return_code][error_msg]`, `error_msg` all-zero on
    /// success.
    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut out = Vec::with_capacity(1 + RETURN_CODE_SIZE + ERROR_MSG_SIZE);
        out.push(self.opcode.as_byte());
        out.extend_from_slice(&self.return_code.to_ne_bytes());
        let msg_buf: [u8; ERROR_MSG_SIZE] = match &self.error_msg {
            Some(msg) => pack_fixed(msg, "error_msg")?,
            None => [0u8; ERROR_MSG_SIZE],
        };
        out.extend_from_slice(&msg_buf);
        Ok(out)
    }
}

/// A box's listed attributes, exactly `[name:32][size:8][n_pub:8][n_sub:8]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxRecord {
    pub name: String,
    pub size: u64,
    pub n_publishers: u64,
    pub n_subscribers: u64,
}

impl BoxRecord {
    pub const ENCODED_SIZE: usize = BOXNAME_SIZE + 8 * 3;

    pub fn encode(&self) -> Result<[u8; Self::ENCODED_SIZE], ProtoError> {
        let name: [u8; BOXNAME_SIZE] = pack_fixed(&self.name, "name")?;
        let mut out = [0u8; Self::ENCODED_SIZE];
        out[..BOXNAME_SIZE].copy_from_slice(&name);
        out[BOXNAME_SIZE..BOXNAME_SIZE + 8].copy_from_slice(&self.size.to_ne_bytes());
        out[BOXNAME_SIZE + 8..BOXNAME_SIZE + 16]
            .copy_from_slice(&self.n_publishers.to_ne_bytes());
        out[BOXNAME_SIZE + 16..BOXNAME_SIZE + 24]
            .copy_from_slice(&self.n_subscribers.to_ne_bytes());
        Ok(out)
    }

    pub fn decode(buf: &[u8; Self::ENCODED_SIZE]) -> Self {
        let mut name_buf = [0u8; BOXNAME_SIZE];
        name_buf.copy_from_slice(&buf[..BOXNAME_SIZE]);
        let take_u64 = |start: usize| -> u64 {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[start..start + 8]);
            u64::from_ne_bytes(b)
        };
        Self {
            name: unpack_fixed(&name_buf),
            size: take_u64(BOXNAME_SIZE),
            n_publishers: take_u64(BOXNAME_SIZE + 8),
            n_subscribers: take_u64(BOXNAME_SIZE + 16),
        }
    }
}

/// A single `RES_BOX_LIST` frame: `[opcode][last][box_record]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponseFrame {
    pub last: bool,
    pub record: BoxRecord,
}

impl ListResponseFrame {
    pub const ENCODED_SIZE: usize = 1 + 1 + BoxRecord::ENCODED_SIZE;

    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut out = Vec::with_capacity(Self::ENCODED_SIZE);
        out.push(Opcode::ResBoxList.as_byte());
        out.push(u8::from(self.last));
        out.extend_from_slice(&self.record.encode()?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_round_trips() {
        let frame = RegistrationFrame::Publisher {
            client_pipe: "/tmp/pub1".to_string(),
            box_name: "/a".to_string(),
        };
        let body = frame.encode_body().unwrap();
        let decoded = RegistrationFrame::decode(Opcode::PubReg, &body).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn list_registration_round_trips() {
        let frame = RegistrationFrame::BoxList { client_pipe: "/tmp/man1".to_string() };
        let body = frame.encode_body().unwrap();
        let decoded = RegistrationFrame::decode(Opcode::BoxList, &body).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn oversized_box_name_is_rejected() {
        let frame = RegistrationFrame::Publisher {
            client_pipe: "/tmp/p".to_string(),
            box_name: "x".repeat(BOXNAME_SIZE),
        };
        assert!(matches!(
            frame.encode_body(),
            Err(ProtoError::FieldTooLong { field: "box_name", .. })
        ));
    }

    #[test]
    fn msg_frame_round_trips_and_truncates() {
        let frame = encode_msg_frame(Opcode::PubMsg, b"hello");
        assert_eq!(decode_msg_payload(&frame), b"hello");

        let long = vec![b'x'; MSG_MAX_SIZE + 10];
        let frame = encode_msg_frame(Opcode::SubMsg, &long);
        assert_eq!(decode_msg_payload(&frame).len(), MSG_MAX_SIZE - 1);
    }

    #[test]
    fn manager_response_encodes_success_as_all_zero_error() {
        let resp = ManagerResponseFrame::ok(Opcode::ResBoxCreat);
        let bytes = resp.encode().unwrap();
        assert_eq!(bytes[0], Opcode::ResBoxCreat.as_byte());
        assert_eq!(i32::from_ne_bytes(bytes[1..5].try_into().unwrap()), 0);
        assert!(bytes[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn box_record_round_trips() {
        let record = BoxRecord {
            name: "/a".to_string(),
            size: 1024,
            n_publishers: 1,
            n_subscribers: 3,
        };
        let encoded = record.encode().unwrap();
        assert_eq!(BoxRecord::decode(&encoded), record);
    }
}
