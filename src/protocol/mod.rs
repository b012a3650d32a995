//! HTTP/1.1 protocol implementation.
//!
//! - `request`: parsed request data model
//! - `framer`: incremental message framing over an accumulation buffer
//! - `responder`: echo response synthesis

pub mod framer;
pub mod request;
pub mod responder;
