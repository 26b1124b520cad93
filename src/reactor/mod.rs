//! Level-triggered readiness reactor over epoll
//!
//! A single thread owns the notification facility, the listening socket and
//! every registered peer; user callbacks run inline on that thread and must
//! never block. Each callback reports back an [`FdIntent`] which is the sole
//! re-arming mechanism: the descriptor's interest is set to exactly what the
//! intent asks for, and `{false, false}` tears the peer down.
//!
//! ```no_run
//! use tunnel_http::IoBuf;
//! use tunnel_http::reactor::{Config, FdIntent, Reactor};
//!
//! struct Peer { buf: IoBuf }
//! impl Default for Peer {
//!     fn default() -> Peer { Peer { buf: IoBuf::with_capacity(4096) } }
//! }
//!
//! let mut config = Config::new();
//! config.port(9090).timeout_ms(5000);
//! let mut reactor: Reactor<Peer> = Reactor::bind(&config).unwrap();
//! reactor.on_accept(|_, _| FdIntent::WANT_READ);
//! reactor.on_read(|peer, handle| {
//!     let (fd, state) = peer.split();
//!     match handle.read_from_peer(&fd, &mut state.buf) {
//!         Ok(_) => FdIntent::WANT_WRITE,
//!         Err(_) => FdIntent::WANT_NONE,
//!     }
//! });
//! reactor.on_write(|peer, handle| {
//!     let (fd, state) = peer.split();
//!     match handle.write_to_peer(&fd, &mut state.buf) {
//!         Ok(_) if state.buf.is_empty() => FdIntent::WANT_READ,
//!         Ok(_) => FdIntent::WANT_WRITE,
//!         Err(_) => FdIntent::WANT_NONE,
//!     }
//! });
//! reactor.run().unwrap();
//! ```
mod config;

pub use self::config::Config;

use std::cell::Cell;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::rc::Rc;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags,
    EpollTimeout};
use nix::sys::socket::{accept, bind, getsockname, listen, recv, send,
    setsockopt, socket, sockopt, AddressFamily, Backlog, MsgFlags, SockFlag,
    SockType, SockaddrIn};

use crate::iobuf::IoBuf;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// I/O (networking or notification facility) error
        Io(err: io::Error) {
            description("I/O error")
            display("I/O error: {}", err)
            from()
        }
        /// Construction-time arguments were rejected
        InvalidConfiguration(reason: &'static str) {
            description("invalid configuration")
            display("invalid configuration: {}", reason)
        }
        /// The peer shut its side of the connection down
        ConnectionClosed {
            description("peer closed the connection")
        }
    }
}

fn sys(err: Errno) -> Error {
    Error::Io(io::Error::from_raw_os_error(err as i32))
}

/// Interest a callback reports back to the reactor.
///
/// `{false, false}` means "close the descriptor and release the peer".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdIntent {
    pub want_read: bool,
    pub want_write: bool,
}

impl FdIntent {
    pub const WANT_READ: FdIntent =
        FdIntent { want_read: true, want_write: false };
    pub const WANT_WRITE: FdIntent =
        FdIntent { want_read: false, want_write: true };
    pub const WANT_READ_WRITE: FdIntent =
        FdIntent { want_read: true, want_write: true };
    pub const WANT_NONE: FdIntent =
        FdIntent { want_read: false, want_write: false };

    pub fn is_close(&self) -> bool {
        !self.want_read && !self.want_write
    }

    fn flags(&self) -> EpollFlags {
        let mut flags = EpollFlags::empty();
        if self.want_read {
            flags |= EpollFlags::EPOLLIN;
        }
        if self.want_write {
            flags |= EpollFlags::EPOLLOUT;
        }
        flags
    }
}

/// Binding of a connected descriptor to its application state.
///
/// The holder owns the descriptor for as long as the peer is registered;
/// dropping the holder closes the socket. The state is whatever the
/// application attaches, typically a buffer plus a parser state.
#[derive(Debug)]
pub struct PeerStateHolder<S> {
    fd: OwnedFd,
    state: S,
}

impl<S> PeerStateHolder<S> {
    fn new(fd: OwnedFd, state: S) -> PeerStateHolder<S> {
        PeerStateHolder { fd: fd, state: state }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// The raw descriptor and the state, borrowed apart so the state's
    /// buffer can be handed to the reactor's read/write helpers.
    pub fn split(&mut self) -> (RawFd, &mut S) {
        (self.fd.as_raw_fd(), &mut self.state)
    }
}

impl<S> AsRawFd for PeerStateHolder<S> {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// Callback signature for the accept, read and write slots.
pub type PeerCallback<S> =
    Box<dyn FnMut(&mut PeerStateHolder<S>, &ReactorHandle) -> FdIntent>;

/// Handle passed to every callback.
///
/// Carries the non-blocking read/write helpers and the shutdown signal;
/// callbacks get it as an explicit parameter instead of a back-reference
/// into the reactor.
pub struct ReactorHandle {
    stop: Rc<Cell<bool>>,
}

const READ_CHUNK: usize = 4096;

impl ReactorHandle {
    /// Ask the reactor to leave its loop once the current wakeup's batch of
    /// events has been dispatched.
    pub fn shutdown(&self) {
        self.stop.set(true);
    }

    /// `recv` into the buffer's free region and advance its end offset.
    ///
    /// Returns `Ok(0)` when the socket has nothing more right now
    /// (would-block), `Err(ConnectionClosed)` when the peer shut down
    /// cleanly, and the transport error otherwise.
    pub fn read_from_peer<F: AsRawFd>(&self, peer: &F, buf: &mut IoBuf)
        -> Result<usize, Error>
    {
        if buf.free_space() == 0 {
            buf.reserve(READ_CHUNK);
        }
        match recv(peer.as_raw_fd(), buf.free_space_mut(), MsgFlags::empty()) {
            Ok(0) => Err(Error::ConnectionClosed),
            Ok(count) => {
                buf.advance_end(count);
                Ok(count)
            }
            Err(Errno::EAGAIN) => Ok(0),
            Err(err) => Err(sys(err)),
        }
    }

    /// `send` from the buffer's data region and advance its start offset.
    ///
    /// Returns `Ok(0)` when the socket cannot take more right now.
    pub fn write_to_peer<F: AsRawFd>(&self, peer: &F, buf: &mut IoBuf)
        -> Result<usize, Error>
    {
        if buf.data_len() == 0 {
            return Ok(0);
        }
        match send(peer.as_raw_fd(), buf.data(), MsgFlags::MSG_NOSIGNAL) {
            Ok(count) => {
                buf.advance_start(count);
                Ok(count)
            }
            Err(Errno::EAGAIN) => Ok(0),
            Err(err) => Err(sys(err)),
        }
    }
}

/// The event loop: a non-blocking listener plus a registry of peers,
/// multiplexed over one epoll instance.
pub struct Reactor<S> {
    epoll: Epoll,
    listener: OwnedFd,
    peers: HashMap<RawFd, PeerStateHolder<S>>,
    on_accept: Option<PeerCallback<S>>,
    on_read: Option<PeerCallback<S>>,
    on_write: Option<PeerCallback<S>>,
    max_events: usize,
    timeout_ms: i32,
    stop: Rc<Cell<bool>>,
}

impl<S: Default> Reactor<S> {
    /// Open, bind and listen the accept socket, set it non-blocking and
    /// register it with a fresh epoll instance.
    pub fn bind(config: &Config) -> Result<Reactor<S>, Error> {
        let address: Ipv4Addr = config.bind_address.parse().map_err(|_| {
            Error::InvalidConfiguration("bind_address is not an IPv4 address")
        })?;
        if config.max_events == 0 {
            return Err(Error::InvalidConfiguration(
                "max_events must be positive"));
        }
        let backlog = Backlog::new(config.backlog).map_err(|_| {
            Error::InvalidConfiguration("backlog out of range")
        })?;
        if config.timeout_ms >= 0 {
            // reject unrepresentable timeouts before the loop ever waits
            EpollTimeout::try_from(config.timeout_ms).map_err(|_| {
                Error::InvalidConfiguration("timeout_ms out of range")
            })?;
        }

        let listener = socket(AddressFamily::Inet, SockType::Stream,
            SockFlag::empty(), None).map_err(sys)?;
        setsockopt(&listener, sockopt::ReuseAddr, &true).map_err(sys)?;
        setsockopt(&listener, sockopt::ReusePort, &true).map_err(sys)?;
        let sockaddr = SockaddrIn::from(SocketAddrV4::new(address, config.port));
        bind(listener.as_raw_fd(), &sockaddr).map_err(sys)?;
        listen(&listener, backlog).map_err(sys)?;
        set_nonblocking(listener.as_raw_fd())?;

        let epoll = Epoll::new(EpollCreateFlags::empty()).map_err(sys)?;
        let listener_fd = listener.as_raw_fd();
        epoll.add(&listener,
            EpollEvent::new(EpollFlags::EPOLLIN, listener_fd as u64))
            .map_err(sys)?;
        debug!("listening on {}:{} (fd {})",
            address, config.port, listener_fd);

        Ok(Reactor {
            epoll: epoll,
            listener: listener,
            peers: HashMap::new(),
            on_accept: None,
            on_read: None,
            on_write: None,
            max_events: config.max_events,
            timeout_ms: config.timeout_ms,
            stop: Rc::new(Cell::new(false)),
        })
    }

    /// The address the listener actually bound to; useful with port zero.
    pub fn local_addr(&self) -> Result<(Ipv4Addr, u16), Error> {
        let addr = getsockname::<SockaddrIn>(self.listener.as_raw_fd())
            .map_err(sys)?;
        Ok((addr.ip(), addr.port()))
    }

    /// Callback run for every newly accepted connection.
    pub fn on_accept<F>(&mut self, callback: F)
        where F: FnMut(&mut PeerStateHolder<S>, &ReactorHandle) -> FdIntent
                 + 'static
    {
        self.on_accept = Some(Box::new(callback));
    }

    /// Callback run when a peer becomes read-ready.
    pub fn on_read<F>(&mut self, callback: F)
        where F: FnMut(&mut PeerStateHolder<S>, &ReactorHandle) -> FdIntent
                 + 'static
    {
        self.on_read = Some(Box::new(callback));
    }

    /// Callback run when a peer becomes write-ready.
    pub fn on_write<F>(&mut self, callback: F)
        where F: FnMut(&mut PeerStateHolder<S>, &ReactorHandle) -> FdIntent
                 + 'static
    {
        self.on_write = Some(Box::new(callback));
    }

    /// Run the event loop.
    ///
    /// The loop ends cleanly when a finite-timeout wait reports zero ready
    /// descriptors or when a callback called
    /// [`shutdown`](ReactorHandle::shutdown); it ends with an error when the
    /// notification facility itself fails. Transport errors on single peers
    /// never end the loop; callbacks translate them into `WANT_NONE`.
    pub fn run(&mut self) -> Result<(), Error> {
        if self.on_accept.is_none() || self.on_read.is_none()
            || self.on_write.is_none()
        {
            return Err(Error::InvalidConfiguration(
                "accept, read and write callbacks must be registered \
                 before running the loop"));
        }
        let mut events = vec![EpollEvent::empty(); self.max_events];
        loop {
            if self.stop.get() {
                debug!("shutdown requested, leaving the loop");
                return Ok(());
            }
            let timeout = if self.timeout_ms < 0 {
                EpollTimeout::NONE
            } else {
                EpollTimeout::try_from(self.timeout_ms)
                    .unwrap_or(EpollTimeout::NONE)
            };
            let ready = match self.epoll.wait(&mut events, timeout) {
                Ok(count) => count,
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    error!("epoll wait failed: {}", err);
                    return Err(sys(err));
                }
            };
            if ready == 0 {
                debug!("wait elapsed with no ready descriptor, \
                        leaving the loop");
                return Ok(());
            }
            trace!("{} descriptors ready", ready);

            let Reactor {
                ref epoll,
                ref listener,
                ref mut peers,
                ref mut on_accept,
                ref mut on_read,
                ref mut on_write,
                ref stop,
                ..
            } = *self;
            let handle = ReactorHandle { stop: stop.clone() };
            let listener_fd = listener.as_raw_fd();

            for event in &events[..ready] {
                let fd = event.data() as RawFd;
                if fd == listener_fd {
                    if let Some(ref mut callback) = *on_accept {
                        accept_ready(epoll, listener, peers, callback,
                            &handle)?;
                    }
                } else {
                    dispatch_peer(epoll, peers, on_read, on_write, &handle,
                        fd, event.events())?;
                }
            }
        }
    }
}

fn set_nonblocking(fd: RawFd) -> Result<(), Error> {
    let bits = fcntl(fd, FcntlArg::F_GETFL).map_err(sys)?;
    let flags = OFlag::from_bits_truncate(bits) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(sys)?;
    Ok(())
}

/// Accept until the listener would block, running the accept callback for
/// each new connection and registering it with the interest the callback
/// asked for.
fn accept_ready<S: Default>(
    epoll: &Epoll,
    listener: &OwnedFd,
    peers: &mut HashMap<RawFd, PeerStateHolder<S>>,
    on_accept: &mut PeerCallback<S>,
    handle: &ReactorHandle,
) -> Result<(), Error> {
    loop {
        let raw = match accept(listener.as_raw_fd()) {
            Ok(fd) => fd,
            Err(Errno::EAGAIN) => return Ok(()),
            Err(err) => return Err(sys(err)),
        };
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        set_nonblocking(raw)?;
        if let Err(err) = setsockopt(&fd, sockopt::TcpNoDelay, &true) {
            debug!("TCP_NODELAY on peer {}: {}", raw, err);
        }
        let mut holder = PeerStateHolder::new(fd, S::default());
        let intent = on_accept(&mut holder, handle);
        if intent.is_close() {
            debug!("accept callback dropped peer {}", raw);
            continue;
        }
        epoll.add(&holder.fd, EpollEvent::new(intent.flags(), raw as u64))
            .map_err(sys)?;
        trace!("registered peer {} with {:?}", raw, intent);
        peers.insert(raw, holder);
    }
}

/// Dispatch one readiness event for a connected peer and re-arm or tear
/// down according to the returned intent.
///
/// The holder is taken out of the registry while its callback runs; an
/// event for a peer that an earlier callback in the same wakeup already
/// closed therefore finds no holder and is skipped.
fn dispatch_peer<S>(
    epoll: &Epoll,
    peers: &mut HashMap<RawFd, PeerStateHolder<S>>,
    on_read: &mut Option<PeerCallback<S>>,
    on_write: &mut Option<PeerCallback<S>>,
    handle: &ReactorHandle,
    fd: RawFd,
    flags: EpollFlags,
) -> Result<(), Error> {
    let mut holder = match peers.remove(&fd) {
        Some(holder) => holder,
        None => {
            trace!("event for peer {} dropped earlier in this wakeup", fd);
            return Ok(());
        }
    };

    let mut intent = FdIntent::WANT_NONE;
    let readable = flags.contains(EpollFlags::EPOLLIN);
    let writable = flags.contains(EpollFlags::EPOLLOUT);
    if readable {
        if let Some(ref mut callback) = *on_read {
            intent = callback(&mut holder, handle);
        }
        if !intent.is_close() && writable && intent.want_write {
            if let Some(ref mut callback) = *on_write {
                intent = callback(&mut holder, handle);
            }
        }
    } else if writable {
        if let Some(ref mut callback) = *on_write {
            intent = callback(&mut holder, handle);
        }
    }
    // neither readable nor writable means EPOLLHUP/EPOLLERR alone, which
    // leaves intent at WANT_NONE and tears the peer down

    if intent.is_close() {
        let _ = epoll.delete(&holder.fd);
        trace!("peer {} closed", fd);
        // dropping the holder closes the descriptor
        return Ok(());
    }
    epoll.modify(&holder.fd, &mut EpollEvent::new(intent.flags(), fd as u64))
        .map_err(sys)?;
    peers.insert(fd, holder);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::FdIntent;

    #[test]
    fn intent_close() {
        assert!(FdIntent::WANT_NONE.is_close());
        assert!(!FdIntent::WANT_READ.is_close());
        assert!(!FdIntent::WANT_WRITE.is_close());
        assert!(!FdIntent::WANT_READ_WRITE.is_close());
    }
}
