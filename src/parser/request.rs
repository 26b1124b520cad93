//! Request parser state machine
use crate::enums::{Method, Version};
use crate::iobuf::IoBuf;
use crate::message::Request;

use super::{is_printable, is_text, is_token, CR, LF, SP};

/// Position of the request parser between calls.
///
/// `ParsingDone` and `ProtocolError` are terminal. `MessageBody` is
/// re-enterable: every further byte fed while in it is appended to the
/// message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    RequestLineBegin,
    RequestMethod,
    RequestResource,
    RequestProtocolH,
    RequestProtocolT1,
    RequestProtocolT2,
    RequestProtocolP,
    RequestProtocolSlash,
    RequestProtocolVersionMajor,
    RequestProtocolDot,
    RequestProtocolVersionMinor,
    RequestLineLF,
    HeaderName,
    HeaderValue,
    HeaderValueLF,
    HeaderEndLF,
    MessageBody,
    ParsingDone,
    ProtocolError,
}

impl RequestState {
    pub fn is_done(&self) -> bool {
        matches!(*self, RequestState::ParsingDone)
    }

    pub fn is_error(&self) -> bool {
        matches!(*self, RequestState::ProtocolError)
    }
}

/// Drive the state machine over the buffer's data region.
///
/// Consumed bytes are recorded by advancing the buffer's start offset, so
/// the caller appends newly received bytes and calls `parse` again with the
/// returned state; the pieces may be split anywhere. Bytes after a terminal
/// state are left in the buffer.
///
/// The single-space rule for header values (a space is only legal right
/// after the colon) looks one byte behind the data region, which the
/// buffer's headroom keeps across fragment boundaries.
pub fn parse(buf: &mut IoBuf, mut state: RequestState, message: &mut Request)
    -> RequestState
{
    use self::RequestState::*;

    let mut prev = buf.headroom().last().copied();
    let mut consumed = 0;
    {
        let data = buf.data();
        while consumed < data.len() {
            let byte = data[consumed];
            match state {
                RequestLineBegin => {
                    if is_token(byte) {
                        message.push_method_byte(byte);
                        state = RequestMethod;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestMethod => {
                    if byte == SP {
                        state = RequestResource;
                    } else if is_token(byte) {
                        message.push_method_byte(byte);
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestResource => {
                    if byte == SP {
                        state = RequestProtocolH;
                    } else if is_printable(byte) {
                        message.push_target_byte(byte);
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestProtocolH => {
                    if byte == b'H' {
                        state = RequestProtocolT1;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestProtocolT1 => {
                    if byte == b'T' {
                        state = RequestProtocolT2;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestProtocolT2 => {
                    if byte == b'T' {
                        state = RequestProtocolP;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestProtocolP => {
                    if byte == b'P' {
                        state = RequestProtocolSlash;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestProtocolSlash => {
                    if byte == b'/' {
                        state = RequestProtocolVersionMajor;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestProtocolVersionMajor => {
                    if byte.is_ascii_digit() {
                        state = RequestProtocolDot;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestProtocolDot => {
                    if byte == b'.' {
                        state = RequestProtocolVersionMinor;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestProtocolVersionMinor => {
                    if byte.is_ascii_digit() {
                        message.set_version(Version::Http11);
                    } else if byte == CR {
                        state = RequestLineLF;
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                RequestLineLF => {
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
                    } else if byte == SP {
                        // a single separator space, only directly after
                        // the colon
                        if prev != Some(b':') {
                            state = ProtocolError;
                            break;
                        }
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
                        let token = message.take_method_token();
                        match Method::from_token(&token) {
                            method @ Method::Get | method @ Method::Head => {
                                message.set_method(method);
                                state = ParsingDone;
                            }
                            method @ Method::Post | method @ Method::Put => {
                                message.set_method(method);
                                state = MessageBody;
                            }
                            _ => {
                                message.set_method(Method::Unsupported);
                                state = ParsingDone;
                            }
                        }
                    } else {
                        state = ProtocolError;
                        break;
                    }
                }
                MessageBody => {
                    message.append_body(&data[consumed..]);
                    consumed = data.len();
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
