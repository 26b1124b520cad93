//! Blocking stream transports carrying an [`IoBuf`](crate::IoBuf)
//!
//! Two concrete variants, a plaintext TCP/UDP socket and a TLS socket,
//! share the [`StreamTransport`] contract. Callers hold the trait object,
//! never the concrete type, so a CONNECT client works identically over
//! either.
mod config;
mod plain;
mod stream;
mod tls;

pub use self::config::{Protocol, Role, StreamConfig, TransportKind};
pub use self::plain::PlainStream;
pub use self::stream::{IoHook, StreamTransport};
pub use self::tls::TlsStream;

use std::io;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// I/O (basically networking) error on the wire
        Io(err: io::Error) {
            description("I/O error")
            display("I/O error: {}", err)
            from()
        }
        /// TLS handshake or session error
        Tls(err: ::native_tls::Error) {
            description("TLS error")
            display("TLS error: {}", err)
            from()
        }
        /// Construction-time arguments were rejected
        InvalidConfiguration(reason: &'static str) {
            description("invalid configuration")
            display("invalid configuration: {}", reason)
        }
        /// The transport was closed; reads and writes are refused
        Closed {
            description("transport is closed")
        }
    }
}
