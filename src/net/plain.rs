//! Plaintext blocking client transport
use std::io::{Read, Write};
use std::net::{TcpStream, UdpSocket};
use std::time::Instant;

use crate::iobuf::IoBuf;

use super::config::{Protocol, Role, StreamConfig, TransportKind};
use super::stream::{IoHook, StreamTransport};
use super::Error;

const INITIAL_BUFFER_CAPACITY: usize = 4096;

enum Inner {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

/// Blocking plaintext stream over a connected TCP or UDP socket.
pub struct PlainStream {
    inner: Option<Inner>,
    buffer: IoBuf,
    read_hook: Option<IoHook>,
    write_hook: Option<IoHook>,
    connected_at: Instant,
}

impl PlainStream {
    /// Resolve and connect to the configured endpoint.
    ///
    /// Only the client role and the plaintext kind are accepted here; UDP
    /// sockets are bound to an ephemeral local port and then connected so
    /// read and write talk to a single peer.
    pub fn connect(config: &StreamConfig) -> Result<PlainStream, Error> {
        if config.role != Role::Client {
            return Err(Error::InvalidConfiguration(
                "only client streams can connect"));
        }
        if config.kind != TransportKind::SyncPlain {
            return Err(Error::InvalidConfiguration(
                "config does not describe a plaintext stream"));
        }
        let endpoint = (&config.host[..], config.port);
        let inner = match config.protocol {
            Protocol::Tcp => Inner::Tcp(TcpStream::connect(endpoint)?),
            Protocol::Udp => {
                let socket = UdpSocket::bind(("0.0.0.0", 0))?;
                socket.connect(endpoint)?;
                Inner::Udp(socket)
            }
        };
        debug!("connected to {}:{}", config.host, config.port);
        Ok(PlainStream::new(inner))
    }

    /// Wrap an already-connected TCP socket.
    pub fn from_tcp(stream: TcpStream) -> PlainStream {
        PlainStream::new(Inner::Tcp(stream))
    }

    fn new(inner: Inner) -> PlainStream {
        PlainStream {
            inner: Some(inner),
            buffer: IoBuf::with_capacity(INITIAL_BUFFER_CAPACITY),
            read_hook: None,
            write_hook: None,
            connected_at: Instant::now(),
        }
    }

    /// When the underlying socket was connected.
    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }
}

impl StreamTransport for PlainStream {
    fn read(&mut self, n: usize) -> Result<usize, Error> {
        let inner = match self.inner {
            Some(ref mut inner) => inner,
            None => return Err(Error::Closed),
        };
        if self.buffer.free_space() < n {
            self.buffer.reserve(n);
        }
        let count = match *inner {
            Inner::Tcp(ref mut stream) => {
                stream.read(&mut self.buffer.free_space_mut()[..n])?
            }
            Inner::Udp(ref socket) => {
                socket.recv(&mut self.buffer.free_space_mut()[..n])?
            }
        };
        self.buffer.advance_end(count);
        if let Some(ref hook) = self.read_hook {
            hook(&self.buffer);
        }
        Ok(count)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        let inner = match self.inner {
            Some(ref mut inner) => inner,
            None => return Err(Error::Closed),
        };
        match *inner {
            Inner::Tcp(ref mut stream) => stream.write_all(data)?,
            Inner::Udp(ref socket) => {
                socket.send(data)?;
            }
        }
        if let Some(ref hook) = self.write_hook {
            hook(&self.buffer);
        }
        Ok(data.len())
    }

    fn buffer(&self) -> &IoBuf {
        &self.buffer
    }

    fn take_buffer(&mut self) -> IoBuf {
        ::std::mem::replace(&mut self.buffer, IoBuf::default())
    }

    fn set_buffer(&mut self, buf: IoBuf) {
        self.buffer = buf;
    }

    fn flush_buffer(&mut self) {
        self.buffer.clear();
    }

    fn set_read_hook(&mut self, hook: IoHook) {
        self.read_hook = Some(hook);
    }

    fn set_write_hook(&mut self, hook: IoHook) {
        self.write_hook = Some(hook);
    }

    fn close(&mut self) -> Result<(), Error> {
        self.inner = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}
