//! Request data model.

use bytes::Bytes;

/// The parsed request line: `<method> <path> <version>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
    pub version: String,
}

impl RequestLine {
    /// Split a request line on ASCII whitespace.
    ///
    /// Missing tokens are left as empty strings rather than rejected;
    /// nothing beyond presence is validated.
    pub fn parse(line: &[u8]) -> Self {
        let line = String::from_utf8_lossy(line);
        let mut tokens = line.split_whitespace();
        RequestLine {
            method: tokens.next().unwrap_or_default().to_string(),
            path: tokens.next().unwrap_or_default().to_string(),
            version: tokens.next().unwrap_or_default().to_string(),
        }
    }
}

/// A fully framed request.
///
/// Constructed only by the framer once the message boundary is known
/// (or by its end-of-stream salvage path, with the body clipped to the
/// bytes that actually arrived). Immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub line: RequestLine,
    /// Header lines after the request line, verbatim.
    pub headers: String,
    pub body: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_line() {
        let line = RequestLine::parse(b"GET /hello HTTP/1.1");
        assert_eq!(line.method, "GET");
        assert_eq!(line.path, "/hello");
        assert_eq!(line.version, "HTTP/1.1");
    }

    #[test]
    fn test_parse_missing_version() {
        let line = RequestLine::parse(b"GET /");
        assert_eq!(line.method, "GET");
        assert_eq!(line.path, "/");
        assert_eq!(line.version, "");
    }

    #[test]
    fn test_parse_empty_line() {
        let line = RequestLine::parse(b"");
        assert_eq!(line, RequestLine::default());
    }

    #[test]
    fn test_parse_extra_whitespace() {
        let line = RequestLine::parse(b"POST   /submit\tHTTP/1.1");
        assert_eq!(line.method, "POST");
        assert_eq!(line.path, "/submit");
        assert_eq!(line.version, "HTTP/1.1");
    }
}
