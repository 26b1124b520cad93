use tunnel_http::parser::response::{parse, ResponseState};
use tunnel_http::{IoBuf, Response, Version};

const SAMPLE_301: &str = "HTTP/1.1 301 Moved Permanently\r\n\
    Location: https://www.facebook.com/page.php\r\n\
    Content-Type: text/html; charset=UTF-8\r\n\
    Date: Sat, 24 Apr 2021 04:00:59 GMT\r\n\
    X-Powered-By: Proxygen/FB-CXX\r\n\
    Content-Length: 47\r\n\r\n\
    <html><h1>Moved somewhere, proxygen</h1></html>";

const SAMPLE_301_BODY: &[u8] = b"<html><h1>Moved somewhere, proxygen</h1></html>";

fn feed(pieces: &[&str]) -> (ResponseState, Response) {
    let mut buf = IoBuf::with_capacity(2048);
    let mut state = ResponseState::ResponseProtocolH;
    let mut message = Response::new();
    for piece in pieces {
        buf.append(piece.as_bytes());
        state = parse(&mut buf, state, &mut message);
    }
    (state, message)
}

fn assert_sample_301(state: ResponseState, message: &Response) {
    assert_eq!(state, ResponseState::ParsingDone);
    assert_eq!(message.status_code(), 301);
    assert_eq!(message.version(), Version::Http11);
    assert_eq!(message.headers().len(), 5);
    assert_eq!(message.header("Location"),
        Some("https://www.facebook.com/page.php"));
    assert_eq!(message.header("Content-Type"),
        Some("text/html; charset=UTF-8"));
    assert_eq!(message.header("Date"), Some("Sat, 24 Apr 2021 04:00:59 GMT"));
    assert_eq!(message.header("X-Powered-By"), Some("Proxygen/FB-CXX"));
    assert_eq!(message.header("Content-Length"), Some("47"));
    assert_eq!(message.body().data_len(), 47);
    assert_eq!(message.body().data(), SAMPLE_301_BODY);
}

#[test]
fn moved_permanently_round_trip() {
    let (state, message) = feed(&[SAMPLE_301]);
    assert_sample_301(state, &message);
}

#[test]
fn split_inside_status_line() {
    let (state, message) = feed(&[
        "HTTP/1.1 301 Moved",
        " Permanently\r\nLocation: https://www.facebook.com/page.php\r\n",
        "Content-Type: text/html; charset=UTF-8\r\n\
         Date: Sat, 24 Apr 2021 04:00:59 GMT\r\n\
         X-Powered-By: Proxygen/FB-CXX\r\n\
         Content-Length: 47\r\n\r\n",
        "<html><h1>Moved somewhere, proxygen</h1></html>",
    ]);
    assert_sample_301(state, &message);
}

#[test]
fn fed_byte_by_byte() {
    let mut buf = IoBuf::with_capacity(2048);
    let mut state = ResponseState::ResponseProtocolH;
    let mut message = Response::new();
    for byte in SAMPLE_301.bytes() {
        buf.append(&[byte]);
        state = parse(&mut buf, state, &mut message);
    }
    assert_sample_301(state, &message);
}

#[test]
fn no_content_length_means_no_body() {
    let (state, message) = feed(&["HTTP/1.1 200 Connection established\r\n\
        Proxy-Agent: some-proxy/1.1\r\n\r\n"]);
    assert_eq!(state, ResponseState::ParsingDone);
    assert_eq!(message.status_code(), 200);
    assert_eq!(message.headers().len(), 1);
    assert_eq!(message.body().data_len(), 0);
}

#[test]
fn trailing_bytes_stay_in_the_buffer() {
    let mut buf = IoBuf::with_capacity(2048);
    let mut state = ResponseState::ResponseProtocolH;
    let mut message = Response::new();
    buf.append(b"HTTP/1.1 200 Connection established\r\n\r\ntunnel bytes");
    state = parse(&mut buf, state, &mut message);
    assert_eq!(state, ResponseState::ParsingDone);
    assert_eq!(buf.data(), b"tunnel bytes");
}

#[test]
fn reason_phrase_is_discarded() {
    let (state, message) = feed(&["HTTP/1.1 404 Anything Goes Here\r\n\r\n"]);
    assert_eq!(state, ResponseState::ParsingDone);
    assert_eq!(message.status_code(), 404);
}

#[test]
fn leading_value_space_is_skipped_once() {
    let (_, message) = feed(&["HTTP/1.1 200 OK\r\n\
        Server:  two-spaces\r\n\r\n"]);
    assert_eq!(message.header("Server"), Some(" two-spaces"));
}

#[test]
fn http2_status_line_is_rejected() {
    let (state, _) = feed(&["HTTP/2 200 OK\r\n\r\n"]);
    assert_eq!(state, ResponseState::ProtocolError);
}

#[test]
fn missing_lf_is_rejected() {
    let (state, _) = feed(&["HTTP/1.1 200 OK\rX\r\n\r\n"]);
    assert_eq!(state, ResponseState::ProtocolError);
}

#[test]
fn body_split_from_headers() {
    let (state, message) = feed(&[
        "HTTP/1.1 200 OK\r\nContent-Length: 9\r\n\r\n",
        "some body",
    ]);
    assert_eq!(state, ResponseState::ParsingDone);
    assert_eq!(message.body().data(), b"some body");
}
