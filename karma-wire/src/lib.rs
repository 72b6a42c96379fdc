//! Length-prefixed framing and a small message set over blocking TCP.
//!
//! The wire format is deliberately plain:
//!
//! ```text
//! +----------------+------+- - - - - - -+
//! | length: u32 BE | kind |   payload   |     length = 1 + payload bytes
//! +----------------+------+- - - - - - -+
//! ```
//!
//! Six message kinds cover the bridge's needs: a handshake ([`Message::Hello`]),
//! liveness ([`Message::Ping`]/[`Message::Pong`]), pub/sub
//! ([`Message::Subscribe`]/[`Message::Publish`]), and an orderly goodbye
//! ([`Message::Close`]).
//!
//! Decoding is incremental: [`Message::decode`] reports `Ok(None)` while a
//! frame is still incomplete, so a caller can accumulate socket reads of any
//! shape. [`Connection`] does exactly that over a `TcpStream`.
//!
//! # Example
//!
//! ```
//! use karma_wire::Message;
//!
//! let mut buf = Vec::new();
//! Message::Ping { nonce: 7 }.encode(&mut buf).unwrap();
//!
//! // Nothing decodes from a half-delivered frame.
//! assert!(Message::decode(&buf[..3]).unwrap().is_none());
//!
//! let (msg, used) = Message::decode(&buf).unwrap().unwrap();
//! assert_eq!(used, buf.len());
//! assert_eq!(msg, Message::Ping { nonce: 7 });
//! ```
//!
//! There is no backpressure, reconnection, or ordering beyond what TCP
//! provides.

#![warn(missing_docs)]

pub mod conn;
pub mod frame;
pub mod message;

pub use conn::{Connection, Endpoint};
pub use frame::MAX_PAYLOAD;
pub use message::Message;

use thiserror::Error;

/// Errors from encoding, decoding, and socket transport.
#[derive(Debug, Error)]
pub enum WireError {
    /// Underlying socket failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// A frame declared a payload larger than [`MAX_PAYLOAD`].
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Declared payload length.
        len: usize,
        /// The enforced limit.
        max: usize,
    },
    /// The frame's kind byte is not a known message kind.
    #[error("unknown message kind {0:#04x}")]
    UnknownKind(u8),
    /// A payload ended before its fields did.
    #[error("truncated payload")]
    Truncated,
    /// A payload had bytes left over after its last field.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
    /// A string field held invalid UTF-8.
    #[error("invalid utf-8 in string field")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The peer closed the connection in the middle of a frame.
    #[error("connection closed mid-frame")]
    Disconnected,
}
