use std::cell::Cell;
use std::net::{TcpListener, UdpSocket};
use std::rc::Rc;
use std::thread;
use std::time::Instant;

use tunnel_http::net::{PlainStream, Protocol, Role, StreamConfig,
    StreamTransport, TlsStream, TransportKind};

#[test]
fn udp_round_trip() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = server.local_addr().unwrap().port();
    let echo = thread::spawn(move || {
        let mut chunk = [0u8; 128];
        let (count, sender) = server.recv_from(&mut chunk).unwrap();
        server.send_to(&chunk[..count], sender).unwrap();
    });

    let mut config = StreamConfig::new("127.0.0.1", port);
    config.protocol(Protocol::Udp);
    let mut stream = PlainStream::connect(&config).unwrap();
    stream.write(b"datagram payload").unwrap();
    let count = stream.read(128).unwrap();
    assert_eq!(count, 16);
    assert_eq!(stream.buffer().data(), b"datagram payload");
    echo.join().unwrap();
}

#[test]
fn read_hook_observes_the_buffer() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        use std::io::Write;
        let (mut socket, _) = listener.accept().unwrap();
        socket.write_all(b"observed").unwrap();
    });

    let config = StreamConfig::new("127.0.0.1", port);
    let mut stream = PlainStream::connect(&config).unwrap();
    let seen = Rc::new(Cell::new(0));
    {
        let seen = seen.clone();
        stream.set_read_hook(Box::new(move |buf| {
            seen.set(buf.data_len());
        }));
    }
    stream.read(64).unwrap();
    assert_eq!(seen.get(), 8);
    server.join().unwrap();
}

#[test]
fn write_hook_fires_after_write() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        use std::io::Read;
        let (mut socket, _) = listener.accept().unwrap();
        let mut sink = Vec::new();
        socket.read_to_end(&mut sink).unwrap();
        sink
    });

    let config = StreamConfig::new("127.0.0.1", port);
    let mut stream = PlainStream::connect(&config).unwrap();
    let fired = Rc::new(Cell::new(0u32));
    {
        let fired = fired.clone();
        stream.set_write_hook(Box::new(move |buf| {
            fired.set(fired.get() + 1);
            // write never touches the internal buffer
            assert_eq!(buf.data_len(), 0);
        }));
    }
    assert_eq!(stream.write(b"outgoing bytes").unwrap(), 14);
    assert_eq!(fired.get(), 1);
    stream.write(b"!").unwrap();
    assert_eq!(fired.get(), 2);
    stream.close().unwrap();
    assert_eq!(server.join().unwrap(), b"outgoing bytes!");
}

#[test]
fn connected_at_is_recorded() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let before = Instant::now();
    let config = StreamConfig::new("127.0.0.1", port);
    let tcp = PlainStream::connect(&config).unwrap();
    assert!(tcp.connected_at() >= before);
    assert!(tcp.connected_at() <= Instant::now());

    let before = Instant::now();
    let mut config = StreamConfig::new("127.0.0.1", port);
    config.protocol(Protocol::Udp);
    let udp = PlainStream::connect(&config).unwrap();
    assert!(udp.connected_at() >= before);
    assert!(udp.connected_at() <= Instant::now());
}

#[test]
fn close_is_idempotent_and_final() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = StreamConfig::new("127.0.0.1", port);
    let mut stream = PlainStream::connect(&config).unwrap();

    assert!(!stream.is_closed());
    stream.close().unwrap();
    stream.close().unwrap();
    assert!(stream.is_closed());
    assert!(stream.read(16).is_err());
    assert!(stream.write(b"nope").is_err());
}

#[test]
fn buffer_take_and_set() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = StreamConfig::new("127.0.0.1", port);
    let mut stream = PlainStream::connect(&config).unwrap();

    let mut buf = stream.take_buffer();
    buf.append(b"kept");
    stream.set_buffer(buf);
    assert_eq!(stream.buffer().data(), b"kept");
    stream.flush_buffer();
    assert_eq!(stream.buffer().data_len(), 0);
}

#[test]
fn plain_rejects_wrong_kind() {
    let mut config = StreamConfig::new("127.0.0.1", 1);
    config.kind(TransportKind::SyncTls);
    assert!(PlainStream::connect(&config).is_err());
}

#[test]
fn plain_rejects_server_role() {
    let mut config = StreamConfig::new("127.0.0.1", 1);
    config.role(Role::Server);
    assert!(PlainStream::connect(&config).is_err());
}

#[test]
fn tls_rejects_udp() {
    let mut config = StreamConfig::new("127.0.0.1", 1);
    config.kind(TransportKind::SyncTls).protocol(Protocol::Udp);
    assert!(TlsStream::connect(&config).is_err());
}

#[test]
fn tls_rejects_plain_kind() {
    let config = StreamConfig::new("127.0.0.1", 1);
    assert!(TlsStream::connect(&config).is_err());
}
