//! The closed set of bridge messages and their payload codecs.

use crate::frame;
use crate::WireError;

/// Kind byte for [`Message::Hello`].
pub const KIND_HELLO: u8 = 0x01;
/// Kind byte for [`Message::Ping`].
pub const KIND_PING: u8 = 0x02;
/// Kind byte for [`Message::Pong`].
pub const KIND_PONG: u8 = 0x03;
/// Kind byte for [`Message::Subscribe`].
pub const KIND_SUBSCRIBE: u8 = 0x04;
/// Kind byte for [`Message::Publish`].
pub const KIND_PUBLISH: u8 = 0x05;
/// Kind byte for [`Message::Close`].
pub const KIND_CLOSE: u8 = 0x06;

/// A bridge message.
///
/// Strings travel as `u16`-BE-length-prefixed UTF-8, byte payloads as
/// `u32`-BE-length-prefixed blocks. Every variant maps to exactly one kind
/// byte, and a payload must be consumed exactly: leftover bytes are a
/// [`WireError::TrailingBytes`] error, not ignored slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Handshake: announces the sending node's name.
    Hello {
        /// Node name, unique per bridge.
        node: String,
    },
    /// Liveness probe; the peer answers with [`Message::Pong`].
    Ping {
        /// Echoed back verbatim in the pong.
        nonce: u64,
    },
    /// Liveness answer.
    Pong {
        /// The nonce from the ping being answered.
        nonce: u64,
    },
    /// Asks to receive future publishes on a channel.
    Subscribe {
        /// Channel name.
        channel: String,
    },
    /// Carries an opaque payload to a channel's subscribers.
    Publish {
        /// Channel name.
        channel: String,
        /// Opaque application bytes.
        payload: Vec<u8>,
    },
    /// Orderly shutdown notice.
    Close {
        /// Human-readable reason.
        reason: String,
    },
}

impl Message {
    /// Returns this message's kind byte.
    pub fn kind(&self) -> u8 {
        match self {
            Message::Hello { .. } => KIND_HELLO,
            Message::Ping { .. } => KIND_PING,
            Message::Pong { .. } => KIND_PONG,
            Message::Subscribe { .. } => KIND_SUBSCRIBE,
            Message::Publish { .. } => KIND_PUBLISH,
            Message::Close { .. } => KIND_CLOSE,
        }
    }

    /// Appends this message as one complete frame to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::FrameTooLarge`] when the encoded payload exceeds
    /// [`MAX_PAYLOAD`](crate::MAX_PAYLOAD).
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        let mut payload = Vec::new();
        match self {
            Message::Hello { node } => frame::write_str(node, &mut payload),
            Message::Ping { nonce } | Message::Pong { nonce } => {
                payload.extend_from_slice(&nonce.to_be_bytes());
            }
            Message::Subscribe { channel } => frame::write_str(channel, &mut payload),
            Message::Publish { channel, payload: bytes } => {
                frame::write_str(channel, &mut payload);
                frame::write_bytes(bytes, &mut payload);
            }
            Message::Close { reason } => frame::write_str(reason, &mut payload),
        }
        frame::encode(self.kind(), &payload, out)
    }

    /// Attempts to decode one message from the front of `buf`.
    ///
    /// Returns `Ok(None)` while the buffer holds an incomplete frame, or the
    /// message plus the byte count to drain.
    ///
    /// # Errors
    ///
    /// Fails on oversize frames, unknown kind bytes, truncated or
    /// over-long payloads, and invalid UTF-8 in string fields.
    pub fn decode(buf: &[u8]) -> Result<Option<(Message, usize)>, WireError> {
        let Some((kind, payload, used)) = frame::decode(buf)? else {
            return Ok(None);
        };

        let (message, rest) = match kind {
            KIND_HELLO => {
                let (node, rest) = frame::read_str(payload)?;
                (Message::Hello { node }, rest)
            }
            KIND_PING => {
                let (nonce, rest) = frame::read_u64(payload)?;
                (Message::Ping { nonce }, rest)
            }
            KIND_PONG => {
                let (nonce, rest) = frame::read_u64(payload)?;
                (Message::Pong { nonce }, rest)
            }
            KIND_SUBSCRIBE => {
                let (channel, rest) = frame::read_str(payload)?;
                (Message::Subscribe { channel }, rest)
            }
            KIND_PUBLISH => {
                let (channel, rest) = frame::read_str(payload)?;
                let (bytes, rest) = frame::read_bytes(rest)?;
                (
                    Message::Publish {
                        channel,
                        payload: bytes,
                    },
                    rest,
                )
            }
            KIND_CLOSE => {
                let (reason, rest) = frame::read_str(payload)?;
                (Message::Close { reason }, rest)
            }
            other => return Err(WireError::UnknownKind(other)),
        };

        if !rest.is_empty() {
            return Err(WireError::TrailingBytes(rest.len()));
        }
        Ok(Some((message, used)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_decode_across_split_reads() {
        let mut stream = Vec::new();
        Message::Hello {
            node: "proxy-1".to_string(),
        }
        .encode(&mut stream)
        .unwrap();
        Message::Publish {
            channel: "events".to_string(),
            payload: vec![9, 8, 7],
        }
        .encode(&mut stream)
        .unwrap();

        // Feed the stream one byte at a time, draining as messages complete.
        let mut buf = Vec::new();
        let mut got = Vec::new();
        for &b in &stream {
            buf.push(b);
            if let Some((msg, used)) = Message::decode(&buf).unwrap() {
                got.push(msg);
                buf.drain(..used);
            }
        }

        assert!(buf.is_empty());
        assert_eq!(got.len(), 2);
        assert!(matches!(&got[0], Message::Hello { node } if node == "proxy-1"));
        assert!(
            matches!(&got[1], Message::Publish { channel, payload }
                if channel == "events" && payload == &[9, 8, 7])
        );
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let mut buf = Vec::new();
        frame::encode(0x7F, b"", &mut buf).unwrap();
        assert!(matches!(
            Message::decode(&buf),
            Err(WireError::UnknownKind(0x7F))
        ));
    }

    #[test]
    fn trailing_payload_bytes_are_an_error() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&5u64.to_be_bytes());
        payload.push(0xEE); // one byte too many for a ping

        let mut buf = Vec::new();
        frame::encode(KIND_PING, &payload, &mut buf).unwrap();
        assert!(matches!(
            Message::decode(&buf),
            Err(WireError::TrailingBytes(1))
        ));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut buf = Vec::new();
        frame::encode(KIND_PING, &[0, 0, 0], &mut buf).unwrap();
        assert!(matches!(
            Message::decode(&buf),
            Err(WireError::Truncated)
        ));
    }

    #[test]
    fn empty_publish_payload_is_valid() {
        let mut buf = Vec::new();
        Message::Publish {
            channel: "c".to_string(),
            payload: Vec::new(),
        }
        .encode(&mut buf)
        .unwrap();

        let (msg, _) = Message::decode(&buf).unwrap().unwrap();
        assert!(matches!(msg, Message::Publish { payload, .. } if payload.is_empty()));
    }

    #[test]
    fn kinds_are_distinct() {
        let kinds = [
            KIND_HELLO,
            KIND_PING,
            KIND_PONG,
            KIND_SUBSCRIBE,
            KIND_PUBLISH,
            KIND_CLOSE,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
