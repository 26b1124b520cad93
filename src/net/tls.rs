//! TLS blocking client transport over native-tls
use std::fs;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Instant;

use native_tls::{Certificate, HandshakeError, Protocol as TlsProtocol,
    TlsConnector};

use crate::iobuf::IoBuf;

use super::config::{Protocol, Role, StreamConfig, TransportKind};
use super::stream::{IoHook, StreamTransport};
use super::Error;

const INITIAL_BUFFER_CAPACITY: usize = 4096;

/// Blocking TLS stream over a connected TCP socket.
///
/// The session is pinned to TLS 1.2 or newer. When `ca_cert_path` is set in
/// the config, the PEM bundle at that path is added to the trusted roots.
pub struct TlsStream {
    inner: Option<native_tls::TlsStream<TcpStream>>,
    buffer: IoBuf,
    read_hook: Option<IoHook>,
    write_hook: Option<IoHook>,
    connected_at: Instant,
}

impl TlsStream {
    /// Connect and run the TLS handshake against the configured endpoint,
    /// verifying the certificate against `config.host`.
    pub fn connect(config: &StreamConfig) -> Result<TlsStream, Error> {
        if config.role != Role::Client {
            return Err(Error::InvalidConfiguration(
                "only client streams can connect"));
        }
        if config.kind != TransportKind::SyncTls {
            return Err(Error::InvalidConfiguration(
                "config does not describe a TLS stream"));
        }
        if config.protocol != Protocol::Tcp {
            return Err(Error::InvalidConfiguration(
                "TLS streams require TCP"));
        }
        let mut builder = TlsConnector::builder();
        builder.min_protocol_version(Some(TlsProtocol::Tlsv12));
        if let Some(ref path) = config.ca_cert_path {
            let pem = fs::read(path)?;
            builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }
        let connector = builder.build()?;
        let tcp = TcpStream::connect((&config.host[..], config.port))?;
        let stream = connector.connect(&config.host, tcp)
            .map_err(|err| match err {
                HandshakeError::Failure(err) => Error::Tls(err),
                // the socket is blocking, an interrupted handshake is
                // still a failure here
                HandshakeError::WouldBlock(_) => Error::Io(
                    ::std::io::Error::new(::std::io::ErrorKind::WouldBlock,
                        "TLS handshake interrupted")),
            })?;
        debug!("TLS session established with {}:{}",
            config.host, config.port);
        Ok(TlsStream {
            inner: Some(stream),
            buffer: IoBuf::with_capacity(INITIAL_BUFFER_CAPACITY),
            read_hook: None,
            write_hook: None,
            connected_at: Instant::now(),
        })
    }

    /// When the TLS session was established.
    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }
}

impl StreamTransport for TlsStream {
    fn read(&mut self, n: usize) -> Result<usize, Error> {
        let inner = match self.inner {
            Some(ref mut inner) => inner,
            None => return Err(Error::Closed),
        };
        if self.buffer.free_space() < n {
            self.buffer.reserve(n);
        }
        let count = inner.read(&mut self.buffer.free_space_mut()[..n])?;
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
        inner.write_all(data)?;
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
        if let Some(mut stream) = self.inner.take() {
            // best-effort close_notify; the session is gone either way
            let _ = stream.shutdown();
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}
