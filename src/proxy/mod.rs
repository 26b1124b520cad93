//! HTTP CONNECT proxy client
//!
//! Composes a [`StreamTransport`](crate::net::StreamTransport) that is
//! already connected to the proxy, the request serializer and the response
//! parser to open a tunnel to an origin server. After a successful
//! `connect` the transport is an opaque byte pipe.
use std::cmp;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::enums::Method;
use crate::message::{Request, Response};
use crate::net::StreamTransport;
use crate::parser::response;
use crate::parser::ResponseState;

/// `User-Agent` sent with the CONNECT request.
pub const USER_AGENT: &str = "tunnel-http/http-client";

const READ_CHUNK: usize = 4096;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// The underlying transport failed
        Transport(err: crate::net::Error) {
            description("transport error")
            display("transport error: {}", err)
            from()
        }
        /// `read`/`write` was called before a successful `connect`
        NotConnected {
            description("no tunnel has been established")
        }
    }
}

/// How the proxy answered a CONNECT request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyResult {
    /// 2xx: the tunnel is ready
    ConnectionSuccess,
    /// The proxy demands credentials
    ProxyAuthRequired,
    /// The proxy answered with some other final status
    NoProxySupport,
    /// The proxy's answer was not a parseable HTTP/1.1 response
    InvalidResponse,
    /// The transport failed while talking to the proxy
    NetworkError,
}

/// Client side of an HTTP CONNECT tunnel.
pub struct ProxyClient {
    transport: Box<dyn StreamTransport>,
    connected: bool,
    origin: Option<(String, u16)>,
    username: Option<String>,
    password: Option<String>,
}

impl ProxyClient {
    /// Wrap a transport that already has an open connection to the proxy.
    /// Plaintext or TLS makes no difference here.
    pub fn new(transport: Box<dyn StreamTransport>) -> ProxyClient {
        ProxyClient {
            transport: transport,
            connected: false,
            origin: None,
            username: None,
            password: None,
        }
    }

    /// Ask the proxy for a tunnel to `origin_host:origin_port`.
    ///
    /// Sends `CONNECT` with `Host`, `User-Agent` and
    /// `Proxy-Connection: Keep-Alive` headers, plus
    /// `Proxy-Authorization: Basic <credentials>` when both username and
    /// password are given. The outcome classification is returned as a
    /// [`ProxyResult`]; transport failures during the handshake classify as
    /// [`NetworkError`](ProxyResult::NetworkError) rather than erroring.
    pub fn connect(&mut self, origin_host: &str, origin_port: u16,
        username: Option<&str>, password: Option<&str>)
        -> Result<ProxyResult, Error>
    {
        self.connected = false;
        self.origin = Some((origin_host.to_string(), origin_port));
        self.username = username.map(|user| user.to_string());
        self.password = password.map(|pass| pass.to_string());

        let target = format!("{}:{}", origin_host, origin_port);
        let mut request = Request::new();
        request.set_method(Method::Connect);
        request.set_target(&target[..]);
        request.add_header("Host", &target[..]);
        request.add_header("User-Agent", USER_AGENT);
        request.add_header("Proxy-Connection", "Keep-Alive");
        if let (Some(user), Some(pass)) = (username, password) {
            let credentials = BASE64.encode(format!("{}:{}", user, pass));
            request.add_header("Proxy-Authorization",
                format!("Basic {}", credentials));
        }

        self.transport.flush_buffer();
        if let Err(err) = self.transport.write(&request.to_bytes()) {
            debug!("CONNECT write to the proxy failed: {}", err);
            return Ok(ProxyResult::NetworkError);
        }

        let mut state = ResponseState::ResponseProtocolH;
        let mut message = Response::new();
        loop {
            match self.transport.read(READ_CHUNK) {
                Ok(0) => {
                    debug!("proxy closed the connection mid-handshake");
                    return Ok(ProxyResult::NetworkError);
                }
                Ok(_) => {}
                Err(err) => {
                    debug!("CONNECT read from the proxy failed: {}", err);
                    return Ok(ProxyResult::NetworkError);
                }
            }
            let mut buf = self.transport.take_buffer();
            state = response::parse(&mut buf, state, &mut message);
            self.transport.set_buffer(buf);
            if state.is_done() {
                break;
            }
            if state.is_error() {
                debug!("proxy answered CONNECT with a malformed response");
                return Ok(ProxyResult::InvalidResponse);
            }
        }

        let code = message.status_code();
        let result = match code {
            200..=299 => {
                self.connected = true;
                ProxyResult::ConnectionSuccess
            }
            401 => ProxyResult::ProxyAuthRequired,
            _ => ProxyResult::NoProxySupport,
        };
        debug!("CONNECT {} -> {} ({:?})", target, code, result);
        Ok(result)
    }

    /// Read up to `n` tunneled bytes from the origin server.
    ///
    /// Bytes the proxy sent right behind its CONNECT response are served
    /// first. Fails with [`Error::NotConnected`] until a `connect` has
    /// succeeded.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.transport.buffer().data_len() == 0 {
            self.transport.read(n)?;
        }
        let mut buf = self.transport.take_buffer();
        let take = cmp::min(n, buf.data_len());
        let bytes = buf.data()[..take].to_vec();
        buf.advance_start(take);
        self.transport.set_buffer(buf);
        Ok(bytes)
    }

    /// Write tunneled bytes to the origin server.
    ///
    /// Fails with [`Error::NotConnected`] until a `connect` has succeeded.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        Ok(self.transport.write(data)?)
    }

    /// The origin endpoint of the last `connect` attempt.
    pub fn origin(&self) -> Option<(&str, u16)> {
        self.origin.as_ref().map(|&(ref host, port)| (&host[..], port))
    }

    /// Username handed to the last `connect` attempt.
    pub fn username(&self) -> Option<&str> {
        self.username.as_ref().map(|user| &user[..])
    }

    /// Password handed to the last `connect` attempt.
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|pass| &pass[..])
    }
}
