//! Synchronous HTTP/1.1 toolkit built around four pieces: an offset-tracking
//! byte buffer ([`IoBuf`]), a level-triggered epoll reactor
//! ([`reactor::Reactor`]), resumable request/response parsers ([`parser`])
//! and an HTTP CONNECT proxy client ([`proxy::ProxyClient`]) over pluggable
//! plaintext or TLS stream transports ([`net`]).
//!
//! The reactor is Linux-only; the blocking client transports and the parsers
//! are portable.
#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate matches;
#[macro_use] extern crate log;

pub mod iobuf;
pub mod enums;
pub mod headers;
pub mod message;
pub mod parser;
pub mod reactor;
pub mod net;
pub mod proxy;

pub use crate::iobuf::IoBuf;
pub use crate::enums::{Method, Status, Version};
pub use crate::headers::Headers;
pub use crate::message::{Request, Response};
