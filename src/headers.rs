//! Header field collection shared by requests and responses
use std::collections::hash_map;
use std::collections::HashMap;
use std::io::{self, Write};

/// Mapping from header name to header value.
///
/// Names are matched case-sensitively. Inserting a name that is already
/// present keeps the first value. Insertion order is not preserved on the
/// wire: serialization emits `Name: Value\r\n` per entry in unspecified
/// order, terminated by a bare `\r\n`.
#[derive(Debug, Default)]
pub struct Headers {
    map: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Headers {
        Headers {
            map: HashMap::new(),
        }
    }

    pub fn insert<N, V>(&mut self, name: N, value: V)
        where N: Into<String>, V: Into<String>
    {
        self.map.entry(name.into()).or_insert_with(|| value.into());
    }

    /// Remove a header field. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.map.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(|value| &value[..])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<String, String> {
        self.map.iter()
    }

    /// Write the whole header block including the terminating blank line.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (name, value) in &self.map {
            write!(out, "{}: {}\r\n", name, value)?;
        }
        out.write_all(b"\r\n")
    }
}

#[cfg(test)]
mod test {
    use super::Headers;

    #[test]
    fn insert_and_get() {
        let mut headers = Headers::new();
        headers.insert("Host", "example.com");
        assert!(headers.contains("Host"));
        assert!(!headers.contains("host"));
        assert_eq!(headers.get("Host"), Some("example.com"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn duplicate_keeps_first() {
        let mut headers = Headers::new();
        headers.insert("Accept", "*/*");
        headers.insert("Accept", "text/html");
        assert_eq!(headers.get("Accept"), Some("*/*"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn remove() {
        let mut headers = Headers::new();
        headers.insert("Connection", "close");
        assert!(headers.remove("Connection"));
        assert!(!headers.remove("Connection"));
        assert!(headers.is_empty());
    }

    #[test]
    fn wire_block() {
        let mut headers = Headers::new();
        headers.insert("Host", "example.com");
        let mut out = Vec::new();
        headers.write_to(&mut out).unwrap();
        assert_eq!(out, b"Host: example.com\r\n\r\n");
    }

    #[test]
    fn empty_block_is_blank_line() {
        let mut out = Vec::new();
        Headers::new().write_to(&mut out).unwrap();
        assert_eq!(out, b"\r\n");
    }
}
