//! WebSocket handshake and framing (RFC 6455 subset)
//!
//! Enough of the protocol for a text chat channel: client frames are
//! masked and unmasked in place, server frames go out unmasked. Payloads
//! use the 7 or 16 bit length forms only.

use core::ops::Range;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use heapless::String;
use sha1::{Digest as _, Sha1};

const HANDSHAKE_GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Length of a `Sec-WebSocket-Accept` value
pub const ACCEPT_KEY_LENGTH: usize = 28;

/// Accept key header value
pub type AcceptKey = String<ACCEPT_KEY_LENGTH>;

const FIN_BIT: u8 = 0x80;
const RESERVED_BITS: u8 = 0x70;
const MASK_BIT: u8 = 0x80;
const LENGTH_16: u8 = 126;
const LENGTH_64: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsError {
    /// Payload length needs the 64 bit form or exceeds the buffer
    TooLarge,
    /// Client frame without the mask bit
    Unmasked,
    /// Reserved opcode or reserved bits set
    Protocol,
    /// Output buffer cannot hold the encoded frame
    BufferTooSmall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0x0 => Opcode::Continuation,
            0x1 => Opcode::Text,
            0x2 => Opcode::Binary,
            0x8 => Opcode::Close,
            0x9 => Opcode::Ping,
            0xA => Opcode::Pong,
            _ => return None,
        })
    }

    fn bits(self) -> u8 {
        match self {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
        }
    }
}

/// Decoded frame header. The payload stays in the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    /// Unmasked payload position inside the decoded buffer
    pub payload: Range<usize>,
    /// Bytes taken by the whole frame
    pub consumed: usize,
}

/// Compute the `Sec-WebSocket-Accept` value for a client key
pub fn accept_key(client_key: &str) -> AcceptKey {
    let mut hasher = Sha1::new();
    hasher.update(client_key.trim().as_bytes());
    hasher.update(HANDSHAKE_GUID);
    let digest = hasher.finalize();

    let mut encoded = [0u8; ACCEPT_KEY_LENGTH];
    let mut key = AcceptKey::new();
    if let Ok(n) = STANDARD.encode_slice(digest, &mut encoded) {
        for &byte in &encoded[..n] {
            // base64 output is ASCII and exactly fills the key
            let _ = key.push(char::from(byte));
        }
    }
    key
}

/// Decode one client frame from the start of `buf`.
///
/// Returns `Ok(None)` while the frame is incomplete. On success the
/// payload is unmasked in place.
pub fn decode_frame(buf: &mut [u8]) -> Result<Option<Frame>, WsError> {
    if buf.len() < 2 {
        return Ok(None);
    }
    let first = buf[0];
    let second = buf[1];

    if first & RESERVED_BITS != 0 {
        return Err(WsError::Protocol);
    }
    let opcode = Opcode::from_bits(first & 0x0F).ok_or(WsError::Protocol)?;
    if second & MASK_BIT == 0 {
        return Err(WsError::Unmasked);
    }

    let (length, mut offset) = match second & 0x7F {
        LENGTH_64 => return Err(WsError::TooLarge),
        LENGTH_16 => {
            if buf.len() < 4 {
                return Ok(None);
            }
            (usize::from(u16::from_be_bytes([buf[2], buf[3]])), 4)
        }
        short => (usize::from(short), 2),
    };

    if buf.len() < offset + 4 {
        return Ok(None);
    }
    let mut mask = [0u8; 4];
    mask.copy_from_slice(&buf[offset..offset + 4]);
    offset += 4;

    let end = offset + length;
    if end > buf.len() {
        return Ok(None);
    }
    for (i, byte) in buf[offset..end].iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }

    Ok(Some(Frame {
        fin: first & FIN_BIT != 0,
        opcode,
        payload: offset..end,
        consumed: end,
    }))
}

/// Encode a final, unmasked server frame into `out`.
///
/// Returns the number of bytes written.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_frame(opcode: Opcode, payload: &[u8], out: &mut [u8]) -> Result<usize, WsError> {
    let header_len = if payload.len() < usize::from(LENGTH_16) {
        2
    } else if u16::try_from(payload.len()).is_ok() {
        4
    } else {
        return Err(WsError::TooLarge);
    };
    let total = header_len + payload.len();
    if out.len() < total {
        return Err(WsError::BufferTooSmall);
    }

    out[0] = FIN_BIT | opcode.bits();
    if header_len == 2 {
        out[1] = payload.len() as u8;
    } else {
        out[1] = LENGTH_16;
        out[2..4].copy_from_slice(&(payload.len() as u16).to_be_bytes());
    }
    out[header_len..total].copy_from_slice(payload);
    Ok(total)
}

/// Encode a text frame
pub fn encode_text(text: &str, out: &mut [u8]) -> Result<usize, WsError> {
    encode_frame(Opcode::Text, text.as_bytes(), out)
}
