use std::fmt;

/// Request methods understood on the wire.
///
/// Any other token survives parsing as `Unsupported`; serializing it emits
/// the literal `UNSUPPORTED` method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Connect,
    Unsupported,
}

impl Method {
    pub fn from_token(token: &str) -> Method {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "HEAD" => Method::Head,
            "PUT" => Method::Put,
            "CONNECT" => Method::Connect,
            _ => Method::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Connect => "CONNECT",
            Method::Unsupported => "UNSUPPORTED",
        }
    }

    /// Whether a request line with this method is followed by a body.
    pub fn expects_body(&self) -> bool {
        matches!(*self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::Method;

    #[test]
    fn token_round_trip() {
        for token in &["GET", "POST", "HEAD", "PUT", "CONNECT"] {
            assert_eq!(Method::from_token(token).as_str(), *token);
        }
    }

    #[test]
    fn unknown_tokens() {
        assert_eq!(Method::from_token("PATCH"), Method::Unsupported);
        assert_eq!(Method::from_token("get"), Method::Unsupported);
        assert_eq!(Method::from_token(""), Method::Unsupported);
    }
}
