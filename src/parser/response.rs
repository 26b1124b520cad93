//! Response parser state machine
use crate::enums::Version;
use crate::iobuf::IoBuf;
use crate::message::Response;

use super::{is_text, is_token, CR, LF, SP};

/// Position of the response parser between calls.
///
/// The protocol prefix must be exactly `HTTP/1.`; anything else, including
/// an HTTP/2 status line, is a protocol error. The reason phrase is consumed
/// but not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    ResponseProtocolH,
    ResponseProtocolT1,
    ResponseProtocolT2,
    ResponseProtocolP,
    ResponseProtocolSlash,
    ResponseProtocolVersionMajor,
    ResponseProtocolDot,
    ResponseProtocolVersionMinor,
    StatusCode,
    ResponseReasonPhrase,
    StatusLineLF,
    HeaderName,
    HeaderValue,
    HeaderValueLF,
    HeaderEndLF,
    ResponseMessageBody,
    ParsingDone,
    ProtocolError,
}

impl ResponseState {
    pub fn is_done(&self) -> bool {
        matches!(*self, ResponseState::ParsingDone)
    }

    pub fn is_error(&self) -> bool {
        matches!(*self, ResponseState::ProtocolError)
    }
}

/// Drive the state machine over the buffer's data region.
///
/// Same feeding discipline as [`request::parse`](crate::parser::request::parse):
/// consumed bytes advance the buffer's start offset, the caller re-invokes
/// with the returned state as more bytes arrive. When a `Content-Length`
/// header is present the remainder of the slice becomes the body (the
/// declared length is not honored); without one the message ends right
/// after the blank line. Bytes past a terminal state stay in the buffer, which is
/// what lets a CONNECT client treat them as tunnel payload.
pub fn parse(buf: &mut IoBuf, mut state: ResponseState, message: &mut Response)
    -> ResponseState
{
    use self::ResponseState::*;

    let mut prev = buf.headroom().last().copied();
    let mut consumed = 0;
    {
        let data = buf.data();
        while consumed < data.len() {
            let byte = data[consumed];
            match state {
                ResponseProtocolH => {
                    if byte == b'H' {
                        state = ResponseProtocolT1;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseProtocolT1 => {
                    if byte == b'T' {
                        state = ResponseProtocolT2;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseProtocolT2 => {
                    if byte == b'T' {
                        state = ResponseProtocolP;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseProtocolP => {
                    if byte == b'P' {
                        state = ResponseProtocolSlash;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseProtocolSlash => {
                    if byte == b'/' {
                        state = ResponseProtocolVersionMajor;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseProtocolVersionMajor => {
                    if byte == b'1' {
                        state = ResponseProtocolDot;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseProtocolDot => {
                    if byte == b'.' {
                        state = ResponseProtocolVersionMinor;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseProtocolVersionMinor => {
                    if byte.is_ascii_digit() {
                        message.set_version(Version::Http11);
                    } else if byte == SP {
                        state = StatusCode;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                StatusCode => {
                    if byte.is_ascii_digit() {
                        message.push_status_byte(byte);
                    } else if byte == SP {
                        message.promote_status();
                        state = ResponseReasonPhrase;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseReasonPhrase => {
                    if byte == CR {
                        state = StatusLineLF;
                    } else if is_text(byte) {
                        // the reason phrase is not retained
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                StatusLineLF => {
                    if byte == LF {
                        state = HeaderName;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                HeaderName => {
                    if is_token(byte) {
                        message.push_header_name_byte(byte);
                    } else if byte == b':' {
                        state = HeaderValue;
                    } else if byte == CR {
                        state = HeaderEndLF;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                HeaderValue => {
                    if byte == CR {
                        state = HeaderValueLF;
                    } else if byte == SP && prev == Some(b':') {
                        // skip the single separator space after the colon
                    } else if is_text(byte) {
                        message.push_header_value_byte(byte);
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                HeaderValueLF => {
                    if byte == LF {
                        message.commit_header();
                        state = HeaderName;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                HeaderEndLF => {
                    if byte == LF {
                        if message.headers().contains("Content-Length") {
                            state = ResponseMessageBody;
                        } else {
                            state = ParsingDone;
                        }
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                ResponseMessageBody => {
                    message.append_body(&data[consumed..]);
                    consumed = data.len();
                    state = ParsingDone;
                    break;
                }
                ParsingDone | ProtocolError => break,
            }
            prev = Some(byte);
            consumed += 1;
        }
    }
    buf.advance_start(consumed);
    state
}
