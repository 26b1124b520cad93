use std::path::PathBuf;

/// Transport-layer protocol of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Which side of the connection the stream plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// Concrete transport variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    SyncPlain,
    SyncTls,
}

/// Stream transport construction parameters.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) protocol: Protocol,
    pub(crate) role: Role,
    pub(crate) kind: TransportKind,
    pub(crate) ca_cert_path: Option<PathBuf>,
}

impl StreamConfig {
    /// Create a config with defaults: TCP, client role, plaintext.
    pub fn new<T: Into<String>>(host: T, port: u16) -> StreamConfig {
        StreamConfig {
            host: host.into(),
            port: port,
            protocol: Protocol::Tcp,
            role: Role::Client,
            kind: TransportKind::SyncPlain,
            ca_cert_path: None,
        }
    }
    pub fn protocol(&mut self, value: Protocol) -> &mut Self {
        self.protocol = value;
        self
    }
    pub fn role(&mut self, value: Role) -> &mut Self {
        self.role = value;
        self
    }
    pub fn kind(&mut self, value: TransportKind) -> &mut Self {
        self.kind = value;
        self
    }
    /// PEM bundle with the roots to trust; TLS only
    pub fn ca_cert_path<T: Into<PathBuf>>(&mut self, value: T) -> &mut Self {
        self.ca_cert_path = Some(value.into());
        self
    }
}
