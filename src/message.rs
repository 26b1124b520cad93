//! Typed request and response containers
//!
//! Both containers double as the output side of the parsers: they expose
//! byte-level mutators that push into scratch fields (current header name,
//! current header value, the method token, the status code accumulator)
//! which are promoted into the message proper when a delimiter is seen.
use std::io::{self, Write};

use crate::enums::{Method, Status, Version};
use crate::headers::Headers;
use crate::iobuf::IoBuf;

const INITIAL_BODY_CAPACITY: usize = 2048;

/// An HTTP/1.1 request message.
#[derive(Debug)]
pub struct Request {
    method: Method,
    target: String,
    version: Version,
    headers: Headers,
    body: IoBuf,
    // parser scratch
    header_name: String,
    header_value: String,
    method_token: String,
}

impl Request {
    pub fn new() -> Request {
        Request {
            method: Method::Unsupported,
            target: String::new(),
            version: Version::Http11,
            headers: Headers::new(),
            body: IoBuf::with_capacity(INITIAL_BODY_CAPACITY),
            header_name: String::new(),
            header_value: String::new(),
            method_token: String::new(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_target<T: Into<String>>(&mut self, target: T) {
        self.target = target.into();
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn add_header<N, V>(&mut self, name: N, value: V)
        where N: Into<String>, V: Into<String>
    {
        self.headers.insert(name, value);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &IoBuf {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut IoBuf {
        &mut self.body
    }

    pub fn append_body(&mut self, bytes: &[u8]) {
        self.body.append(bytes);
    }

    pub fn push_method_byte(&mut self, byte: u8) {
        self.method_token.push(byte as char);
    }

    /// The raw method token accumulated so far, before dispatch.
    pub fn method_token(&self) -> &str {
        &self.method_token
    }

    /// Take the method token out of the scratch, leaving it empty.
    pub fn take_method_token(&mut self) -> String {
        ::std::mem::replace(&mut self.method_token, String::new())
    }

    pub fn push_target_byte(&mut self, byte: u8) {
        self.target.push(byte as char);
    }

    pub fn push_header_name_byte(&mut self, byte: u8) {
        self.header_name.push(byte as char);
    }

    pub fn push_header_value_byte(&mut self, byte: u8) {
        self.header_value.push(byte as char);
    }

    /// Promote the scratch (name, value) pair into the header collection
    /// and clear the scratch.
    pub fn commit_header(&mut self) {
        let name = ::std::mem::replace(&mut self.header_name, String::new());
        let value = ::std::mem::replace(&mut self.header_value, String::new());
        self.headers.insert(name, value);
    }

    /// Serialize the exact wire form:
    /// request line, header block, blank line, body bytes.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{} {} {}\r\n", self.method, self.target, self.version)?;
        self.headers.write_to(out)?;
        out.write_all(self.body.data())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out)
            .expect("writing a message to a Vec cannot fail");
        out
    }
}

impl Default for Request {
    fn default() -> Request {
        Request::new()
    }
}

/// An HTTP/1.1 response message.
#[derive(Debug)]
pub struct Response {
    version: Version,
    status_code: u16,
    headers: Headers,
    body: IoBuf,
    // parser scratch
    status_scratch: [u8; 3],
    status_scratch_len: u8,
    header_name: String,
    header_value: String,
}

impl Response {
    pub fn new() -> Response {
        Response {
            version: Version::Http11,
            status_code: 0,
            headers: Headers::new(),
            body: IoBuf::with_capacity(INITIAL_BODY_CAPACITY),
            status_scratch: [0; 3],
            status_scratch_len: 0,
            header_name: String::new(),
            header_value: String::new(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn set_status_code(&mut self, code: u16) {
        self.status_code = code;
    }

    pub fn set_status(&mut self, status: Status) {
        self.status_code = status.code();
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn add_header<N, V>(&mut self, name: N, value: V)
        where N: Into<String>, V: Into<String>
    {
        self.headers.insert(name, value);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &IoBuf {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut IoBuf {
        &mut self.body
    }

    pub fn append_body(&mut self, bytes: &[u8]) {
        self.body.append(bytes);
    }

    /// Accumulate one status digit. The scratch holds three bytes; further
    /// digits are dropped.
    pub fn push_status_byte(&mut self, byte: u8) {
        if (self.status_scratch_len as usize) < self.status_scratch.len() {
            self.status_scratch[self.status_scratch_len as usize] = byte;
            self.status_scratch_len += 1;
        }
    }

    /// Promote the accumulated digits into the numeric status code and
    /// clear the scratch.
    pub fn promote_status(&mut self) {
        let mut code = 0u16;
        for &digit in &self.status_scratch[..self.status_scratch_len as usize] {
            code = code * 10 + u16::from(digit - b'0');
        }
        self.status_code = code;
        self.status_scratch_len = 0;
    }

    pub fn push_header_name_byte(&mut self, byte: u8) {
        self.header_name.push(byte as char);
    }

    pub fn push_header_value_byte(&mut self, byte: u8) {
        self.header_value.push(byte as char);
    }

    pub fn commit_header(&mut self) {
        let name = ::std::mem::replace(&mut self.header_name, String::new());
        let value = ::std::mem::replace(&mut self.header_value, String::new());
        self.headers.insert(name, value);
    }

    /// Serialize the exact wire form: status line with the reason phrase
    /// looked up from the fixed table, header block, blank line, body.
    ///
    /// A status code outside the table yields no output at all.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let status = match Status::from_code(self.status_code) {
            Some(status) => status,
            None => return Ok(()),
        };
        write!(out, "{} {} {}\r\n",
            self.version, self.status_code, status.reason())?;
        self.headers.write_to(out)?;
        out.write_all(self.body.data())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out)
            .expect("writing a message to a Vec cannot fail");
        out
    }
}

impl Default for Response {
    fn default() -> Response {
        Response::new()
    }
}
