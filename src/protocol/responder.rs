//! Echo response synthesis.
//!
//! Pure: a framed request in, serialized response bytes out. The body is
//! always `Echo: ` followed by the request body verbatim, the status is
//! always 200, and Content-Length is computed from the final body length
//! in bytes. Every response carries `Connection: close`.

use bytes::BytesMut;

use super::request::Request;

/// Fixed prefix prepended to every echoed body.
const ECHO_PREFIX: &[u8] = b"Echo: ";

/// Serialize the response for a request.
///
/// Layout: status line, headers each terminated by `\r\n`, a blank line,
/// then the body with no trailing terminator.
pub fn render(request: &Request) -> BytesMut {
    let body_len = ECHO_PREFIX.len() + request.body.len();

    let mut response = BytesMut::with_capacity(96 + body_len);
    response.extend_from_slice(b"HTTP/1.1 200 OK\r\n");
    response.extend_from_slice(b"Content-Type: text/plain\r\n");
    response.extend_from_slice(format!("Content-Length: {}\r\n", body_len).as_bytes());
    response.extend_from_slice(b"Connection: close\r\n");
    response.extend_from_slice(b"\r\n");
    response.extend_from_slice(ECHO_PREFIX);
    response.extend_from_slice(&request.body);
    response
}
