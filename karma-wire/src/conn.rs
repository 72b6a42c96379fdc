//! Blocking transport: a framed connection and a listening endpoint.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use crate::{Message, WireError};

/// Read chunk size. One page per read keeps small messages cheap.
const READ_CHUNK: usize = 4096;

/// A framed, blocking connection over a `TcpStream`.
///
/// Reads accumulate in an internal buffer until a complete frame is
/// available, so [`recv`](Connection::recv) is safe against any read
/// splitting the peer's writes produce.
///
/// # Example
///
/// ```no_run
/// use karma_wire::{Connection, Message};
///
/// let mut conn = Connection::connect("127.0.0.1:7400")?;
/// conn.send(&Message::Hello { node: "worker-7".into() })?;
///
/// while let Some(msg) = conn.recv()? {
///     match msg {
///         Message::Ping { nonce } => conn.send(&Message::Pong { nonce })?,
///         Message::Close { .. } => break,
///         other => println!("<- {other:?}"),
///     }
/// }
/// # Ok::<(), karma_wire::WireError>(())
/// ```
pub struct Connection {
    stream: TcpStream,
    rx_buf: Vec<u8>,
}

impl Connection {
    /// Wraps an established stream.
    ///
    /// Disables Nagle's algorithm; bridge messages are small and latency
    /// matters more than packet count.
    pub fn new(stream: TcpStream) -> Result<Self, WireError> {
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            rx_buf: Vec::new(),
        })
    }

    /// Connects to a remote endpoint.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, WireError> {
        let stream = TcpStream::connect(addr)?;
        log::debug!("connected to {}", stream.peer_addr()?);
        Self::new(stream)
    }

    /// Returns the peer's address.
    pub fn peer_addr(&self) -> Result<SocketAddr, WireError> {
        Ok(self.stream.peer_addr()?)
    }

    /// Sends one message as a complete frame.
    pub fn send(&mut self, message: &Message) -> Result<(), WireError> {
        let mut out = Vec::new();
        message.encode(&mut out)?;
        self.stream.write_all(&out)?;
        self.stream.flush()?;
        log::trace!("-> kind {:#04x}, {} bytes", message.kind(), out.len());
        Ok(())
    }

    /// Receives the next message, blocking until one is complete.
    ///
    /// Returns `Ok(None)` when the peer closes the connection at a frame
    /// boundary.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Disconnected`] when the peer closes mid-frame,
    /// and codec errors for malformed frames. A codec error leaves the
    /// buffer as-is; the connection should be dropped.
    pub fn recv(&mut self) -> Result<Option<Message>, WireError> {
        loop {
            if let Some((message, used)) = Message::decode(&self.rx_buf)? {
                self.rx_buf.drain(..used);
                log::trace!("<- kind {:#04x}", message.kind());
                return Ok(Some(message));
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                if self.rx_buf.is_empty() {
                    return Ok(None);
                }
                return Err(WireError::Disconnected);
            }
            self.rx_buf.extend_from_slice(&chunk[..n]);
        }
    }
}

/// A listening endpoint accepting framed connections.
pub struct Endpoint {
    listener: TcpListener,
}

impl Endpoint {
    /// Binds to the given address.
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, WireError> {
        let listener = TcpListener::bind(addr)?;
        log::debug!("listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    /// Returns the bound address, useful with port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, WireError> {
        Ok(self.listener.local_addr()?)
    }

    /// Blocks until a peer connects.
    pub fn accept(&self) -> Result<(Connection, SocketAddr), WireError> {
        let (stream, addr) = self.listener.accept()?;
        log::debug!("accepted {addr}");
        Ok((Connection::new(stream)?, addr))
    }
}
